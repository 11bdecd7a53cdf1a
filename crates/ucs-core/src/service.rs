//! The transfer service and its builder.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use ucs_config::{ClientConfig, RpcConfig};
use ucs_registry::ChainRegistry;
use ucs_routing::{
	build_forward_memo, EvmView, HubbleClient, QuoteResolver, RouteIndex, RouteResolver,
	TokenIndex,
};
use ucs_rpc::{HttpTransport, HttpTransportConfig};
use ucs_transfer::{BatchedPredictView, TransferInterface};
use ucs_types::{
	ChainFamily, GasEstimate, QuoteToken, TransferError, TransferIntent, TransferRequest,
	TransferType, TxHandle,
};

/// Raised when the builder is finalized with a required collaborator
/// missing. Configuration-time only; never surfaces during transfers.
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("transfer service is missing its {0}")]
	Missing(&'static str),
}

/// Assembles a [`TransferService`] from its collaborators.
///
/// `with_config` wires the registry and the hubble index from a loaded
/// configuration; the family builders always come from the caller because
/// they carry signers, which never pass through configuration.
pub struct TransferServiceBuilder {
	registry: Option<Arc<ChainRegistry>>,
	route_index: Option<Arc<dyn RouteIndex>>,
	token_index: Option<Arc<dyn TokenIndex>>,
	view: Option<Arc<dyn EvmView>>,
	builders: HashMap<ChainFamily, Arc<dyn TransferInterface>>,
	rpc: RpcConfig,
}

impl TransferServiceBuilder {
	pub fn new() -> Self {
		Self {
			registry: None,
			route_index: None,
			token_index: None,
			view: None,
			builders: HashMap::new(),
			rpc: RpcConfig::default(),
		}
	}

	pub fn with_config(mut self, config: &ClientConfig) -> Self {
		let hubble = Arc::new(HubbleClient::new(config.hubble_endpoint.clone()));
		self.route_index = Some(hubble.clone());
		self.token_index = Some(hubble);
		self.registry = Some(Arc::new(config.registry()));
		self.rpc = config.rpc.clone();
		self
	}

	pub fn with_registry(mut self, registry: Arc<ChainRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn with_route_index(mut self, index: Arc<dyn RouteIndex>) -> Self {
		self.route_index = Some(index);
		self
	}

	pub fn with_token_index(mut self, index: Arc<dyn TokenIndex>) -> Self {
		self.token_index = Some(index);
		self
	}

	pub fn with_view(mut self, view: Arc<dyn EvmView>) -> Self {
		self.view = Some(view);
		self
	}

	/// Points quote-token view calls at an EVM JSON-RPC endpoint through
	/// the coalescing transport, using the builder's rpc settings.
	pub fn with_evm_rpc(mut self, url: impl Into<String>) -> Self {
		let mut transport = HttpTransportConfig::new(url);
		transport.batch = self.rpc.batch;
		transport.batch_size = self.rpc.batch_size;
		transport.wait = Duration::from_millis(self.rpc.wait_ms);

		let view = BatchedPredictView::new(Arc::new(HttpTransport::new(transport)));
		self.view = Some(Arc::new(view));
		self
	}

	pub fn with_builder(
		mut self,
		family: ChainFamily,
		builder: Arc<dyn TransferInterface>,
	) -> Self {
		self.builders.insert(family, builder);
		self
	}

	pub fn build(self) -> Result<TransferService, BuildError> {
		let registry = self.registry.ok_or(BuildError::Missing("chain registry"))?;
		let route_index = self.route_index.ok_or(BuildError::Missing("route index"))?;
		let token_index = self.token_index.ok_or(BuildError::Missing("token index"))?;

		let mut quotes = QuoteResolver::new(token_index);
		if let Some(view) = self.view {
			quotes = quotes.with_view(view);
		}

		Ok(TransferService {
			registry,
			routes: RouteResolver::new(route_index),
			quotes,
			builders: self.builders,
		})
	}
}

impl Default for TransferServiceBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Entry point for callers: resolves everything an intent needs and hands
/// the assembled request to the builder for the source chain's family.
///
/// No retry and no caching; every call resolves fresh and errors pass
/// through as structured `TransferError` variants.
pub struct TransferService {
	registry: Arc<ChainRegistry>,
	routes: RouteResolver,
	quotes: QuoteResolver,
	builders: HashMap<ChainFamily, Arc<dyn TransferInterface>>,
}

impl std::fmt::Debug for TransferService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransferService").finish_non_exhaustive()
	}
}

impl TransferService {
	pub fn builder() -> TransferServiceBuilder {
		TransferServiceBuilder::new()
	}

	/// Resolves, builds, and submits the transfer described by `intent`.
	pub async fn transfer_asset(&self, intent: TransferIntent) -> Result<TxHandle, TransferError> {
		let (builder, request) = self.prepare(intent).await?;
		let handle = builder.transfer_asset(&request).await?;
		info!(
			%handle,
			source = %request.intent.source_chain_id,
			destination = %request.intent.destination_chain_id,
			"transfer submitted"
		);
		Ok(handle)
	}

	/// Same pipeline as [`transfer_asset`](Self::transfer_asset) but ends
	/// in the builder's dry run. No side effects.
	pub async fn simulate_transaction(
		&self,
		intent: TransferIntent,
	) -> Result<GasEstimate, TransferError> {
		let (builder, request) = self.prepare(intent).await?;
		let estimate = builder.simulate_transaction(&request).await?;
		debug!(
			gas = estimate.0,
			source = %request.intent.source_chain_id,
			"simulation complete"
		);
		Ok(estimate)
	}

	async fn prepare(
		&self,
		intent: TransferIntent,
	) -> Result<(Arc<dyn TransferInterface>, TransferRequest), TransferError> {
		let family = self.registry.family_of(&intent.source_chain_id)?;
		self.registry.get_required(&intent.destination_chain_id)?;

		let builder = self
			.builders
			.get(&family)
			.cloned()
			.ok_or_else(|| TransferError::UnsupportedNetwork(intent.source_chain_id.clone()))?;

		if intent.is_same_chain() {
			debug!(chain = %intent.source_chain_id, "same-chain transfer, no route needed");
			return Ok((builder, TransferRequest::same_chain(intent)));
		}

		let route = self
			.routes
			.resolve_route(&intent.source_chain_id, &intent.destination_chain_id)
			.await?;

		let (quote, memo) = match route.transfer_type {
			TransferType::Direct => (None, None),
			TransferType::Pfm => {
				let quote = self
					.quotes
					.resolve_quote_token(&intent.source_chain_id, &intent.base_token, &route)
					.await?;

				// A forwarded packet materializes the asset on the final
				// chain; without a known representation there the funds
				// would strand on the intermediate hop.
				if matches!(quote, QuoteToken::NoQuoteAvailable) {
					return Err(TransferError::NoQuoteAvailable {
						base_token: intent.base_token.clone(),
						channel: route.source_channel.clone(),
					});
				}

				let hop = route.forward.as_ref().ok_or_else(|| {
					TransferError::Encoding("forwarded route without a forward hop".to_string())
				})?;
				let memo = build_forward_memo(&hop.port, &hop.channel, &intent.receiver);
				(Some(quote), Some(memo))
			}
		};

		Ok((
			builder,
			TransferRequest {
				intent,
				route: Some(route),
				quote,
				memo,
			},
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::U256;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use ucs_registry::ChainInfo;
	use ucs_routing::{ChannelRecommendation, IndexError, WrappingRow};
	use ucs_types::ChainId;

	struct CountingRouteIndex {
		row: Option<ChannelRecommendation>,
		calls: AtomicUsize,
	}

	#[async_trait]
	impl RouteIndex for CountingRouteIndex {
		async fn channel_recommendation(
			&self,
			_source: &ChainId,
			_destination: &ChainId,
		) -> Result<Option<ChannelRecommendation>, IndexError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.row.clone())
		}
	}

	struct FixtureTokenIndex {
		rows: Vec<WrappingRow>,
	}

	#[async_trait]
	impl TokenIndex for FixtureTokenIndex {
		async fn wrappings(
			&self,
			_source: &ChainId,
			_base_token: &str,
			_destination_channel: &str,
		) -> Result<Vec<WrappingRow>, IndexError> {
			Ok(self.rows.clone())
		}
	}

	struct CapturingBuilder {
		last: Mutex<Option<TransferRequest>>,
	}

	impl CapturingBuilder {
		fn new() -> Arc<Self> {
			Arc::new(Self {
				last: Mutex::new(None),
			})
		}

		fn captured(&self) -> TransferRequest {
			self.last.lock().unwrap().clone().expect("builder not invoked")
		}
	}

	#[async_trait]
	impl TransferInterface for CapturingBuilder {
		async fn transfer_asset(
			&self,
			request: &TransferRequest,
		) -> Result<TxHandle, TransferError> {
			*self.last.lock().unwrap() = Some(request.clone());
			Ok(TxHandle("0xsubmitted".to_string()))
		}

		async fn simulate_transaction(
			&self,
			request: &TransferRequest,
		) -> Result<GasEstimate, TransferError> {
			*self.last.lock().unwrap() = Some(request.clone());
			Ok(GasEstimate(21_000))
		}
	}

	fn test_registry() -> Arc<ChainRegistry> {
		let mut registry = ChainRegistry::new();
		registry.insert(ChainInfo {
			chain_id: ChainId::from("union-testnet-8"),
			family: ChainFamily::Cosmos,
			rpc_url: "http://localhost:26657".to_string(),
			relay_contract: Some("union1relay".to_string()),
			bech32_prefix: Some("union".to_string()),
			display_name: None,
		});
		registry.insert(ChainInfo {
			chain_id: ChainId::from("11155111"),
			family: ChainFamily::Evm,
			rpc_url: "http://localhost:8545".to_string(),
			relay_contract: Some("0x84f074c15513f15baea0fbed3ec42f0bd1fb3efa".to_string()),
			bech32_prefix: None,
			display_name: None,
		});
		registry.into_shared()
	}

	fn intent(source: &str, destination: &str) -> TransferIntent {
		TransferIntent {
			source_chain_id: ChainId::from(source),
			destination_chain_id: ChainId::from(destination),
			base_token: "muno".to_string(),
			base_amount: U256::from(1_000_000u64),
			receiver: "0xdeadbeef".to_string(),
			memo: None,
			relay_contract_address: None,
			auto_approve: true,
			simulate: false,
			timeout_height: 0,
			timeout_timestamp: 0,
		}
	}

	fn pfm_row() -> ChannelRecommendation {
		ChannelRecommendation {
			source_port_id: Some("0xwasm.union1relay".to_string()),
			source_channel_id: Some("channel-7".to_string()),
			source_connection_id: Some("connection-3".to_string()),
			destination_port_id: Some("0xtransfer".to_string()),
			destination_channel_id: Some("channel-41".to_string()),
			destination_connection_id: Some("connection-9".to_string()),
			relay_contract_address: Some("union1relay".to_string()),
			forward_port_id: Some("wasm.contractXYZ".to_string()),
			forward_channel_id: Some("channel-12".to_string()),
		}
	}

	fn service(
		route_index: Arc<CountingRouteIndex>,
		token_rows: Vec<WrappingRow>,
		builder: Arc<CapturingBuilder>,
		family: ChainFamily,
	) -> TransferService {
		TransferService::builder()
			.with_registry(test_registry())
			.with_route_index(route_index)
			.with_token_index(Arc::new(FixtureTokenIndex { rows: token_rows }))
			.with_builder(family, builder)
			.build()
			.unwrap()
	}

	#[tokio::test]
	async fn same_chain_transfer_never_touches_the_route_index() {
		let index = Arc::new(CountingRouteIndex {
			row: None,
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		let service = service(index.clone(), vec![], builder.clone(), ChainFamily::Cosmos);

		let handle = service
			.transfer_asset(intent("union-testnet-8", "union-testnet-8"))
			.await
			.unwrap();

		assert_eq!(handle.0, "0xsubmitted");
		assert_eq!(index.calls.load(Ordering::SeqCst), 0);

		let request = builder.captured();
		assert!(request.route.is_none());
		assert!(request.quote.is_none());
		assert!(request.memo.is_none());
	}

	#[tokio::test]
	async fn unknown_source_chain_is_unsupported() {
		let index = Arc::new(CountingRouteIndex {
			row: None,
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		let service = service(index, vec![], builder, ChainFamily::Cosmos);

		let err = service
			.transfer_asset(intent("unknown-1", "union-testnet-8"))
			.await
			.unwrap_err();
		assert!(matches!(err, TransferError::UnsupportedNetwork(_)));
	}

	#[tokio::test]
	async fn missing_family_builder_is_unsupported() {
		let index = Arc::new(CountingRouteIndex {
			row: Some(pfm_row()),
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		// Only an EVM builder registered; the source chain is Cosmos.
		let service = service(index, vec![], builder, ChainFamily::Evm);

		let err = service
			.transfer_asset(intent("union-testnet-8", "11155111"))
			.await
			.unwrap_err();
		assert!(matches!(err, TransferError::UnsupportedNetwork(_)));
	}

	#[tokio::test]
	async fn pfm_route_without_quote_is_fatal() {
		let index = Arc::new(CountingRouteIndex {
			row: Some(pfm_row()),
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		// Empty wrapping index and no view: quote resolution yields the
		// sentinel, which a forwarded route cannot tolerate.
		let service = service(index, vec![], builder.clone(), ChainFamily::Cosmos);

		let err = service
			.transfer_asset(intent("union-testnet-8", "11155111"))
			.await
			.unwrap_err();

		assert!(matches!(err, TransferError::NoQuoteAvailable { .. }));
		assert!(builder.last.lock().unwrap().is_none());
	}

	#[tokio::test]
	async fn pfm_route_assembles_quote_and_forward_memo() {
		let index = Arc::new(CountingRouteIndex {
			row: Some(pfm_row()),
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		let wrapping = WrappingRow {
			unwrapped_address_hex: "0x6d756e6f".to_string(),
			unwrapped_chain_id: "11155111".to_string(),
		};
		let service = service(index, vec![wrapping], builder.clone(), ChainFamily::Cosmos);

		service
			.transfer_asset(intent("union-testnet-8", "11155111"))
			.await
			.unwrap();

		let request = builder.captured();
		let route = request.route.expect("cross-chain request carries a route");
		assert_eq!(route.transfer_type, TransferType::Pfm);
		assert_eq!(route.source_channel, "channel-7");
		assert_eq!(route.source_port, "wasm.union1relay");
		assert_eq!(
			request.quote,
			Some(QuoteToken::Available("0x6d756e6f".to_string()))
		);
		assert_eq!(
			request.memo.as_deref(),
			Some(
				r#"{"forward":{"port":"wasm.contractXYZ","channel":"channel-12","receiver":"deadbeef"}}"#
			)
		);
	}

	#[tokio::test]
	async fn direct_route_carries_no_quote_or_memo() {
		let mut row = pfm_row();
		row.forward_port_id = None;
		row.forward_channel_id = None;
		let index = Arc::new(CountingRouteIndex {
			row: Some(row),
			calls: AtomicUsize::new(0),
		});
		let builder = CapturingBuilder::new();
		let service = service(index, vec![], builder.clone(), ChainFamily::Cosmos);

		let estimate = service
			.simulate_transaction(intent("union-testnet-8", "11155111"))
			.await
			.unwrap();
		assert_eq!(estimate.0, 21_000);

		let request = builder.captured();
		assert_eq!(
			request.route.unwrap().transfer_type,
			TransferType::Direct
		);
		assert!(request.quote.is_none());
		assert!(request.memo.is_none());
	}

	#[test]
	fn builder_rejects_missing_collaborators() {
		let err = TransferService::builder().build().unwrap_err();
		assert!(matches!(err, BuildError::Missing("chain registry")));
	}
}
