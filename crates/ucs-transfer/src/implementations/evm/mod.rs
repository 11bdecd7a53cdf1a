//! EVM transfer builder.
//!
//! Same-chain transfers are plain ERC-20 `transfer` calls. Cross-chain
//! transfers go through the UCS relay contract: an optional ERC-20
//! approval first, then the relay `transfer` entry point carrying the
//! channel, receiver bytes, base/quote token amounts, timeouts, and a
//! per-call random salt that keeps structurally identical transfers from
//! colliding on hash.

pub mod alloy_provider;
pub mod rpc_view;

use crate::encode;
use crate::TransferInterface;
use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use ucs_registry::ChainInfo;
use ucs_routing::{channel_ordinal, EvmView, ViewError};
use ucs_types::{GasEstimate, TransferError, TransferRequest, TxHandle};

sol! {
	interface IERC20 {
		function transfer(address to, uint256 amount) external returns (bool);
		function approve(address spender, uint256 amount) external returns (bool);
	}

	interface IRelay {
		function transfer(
			uint32 channelId,
			bytes receiver,
			address baseToken,
			uint256 baseAmount,
			bytes quoteToken,
			uint256 quoteAmount,
			uint64 timeoutHeight,
			uint64 timeoutTimestamp,
			bytes32 salt
		) external;

		function predictWrappedToken(
			uint256 path,
			uint32 channel,
			bytes token
		) external view returns (address, bytes32);
	}
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Narrow capability the builder needs from an EVM JSON-RPC client. The
/// implementation owns signing and submission; the builder only decides
/// what calldata goes where.
#[async_trait]
pub trait EvmProvider: Send + Sync {
	/// Read-only contract call.
	async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError>;

	/// The chain's contract-simulation primitive.
	async fn estimate_gas(&self, to: Address, data: Vec<u8>) -> Result<u64, ProviderError>;

	/// Signs and submits; the point of no return.
	async fn send(&self, to: Address, data: Vec<u8>) -> Result<TxHandle, ProviderError>;
}

/// EVM implementation of the two-operation transfer surface.
pub struct EvmTransfer {
	chain: ChainInfo,
	provider: Arc<dyn EvmProvider>,
}

impl EvmTransfer {
	pub fn new(chain: ChainInfo, provider: Arc<dyn EvmProvider>) -> Self {
		Self { chain, provider }
	}

	fn parse_address(value: &str, what: &str) -> Result<Address, TransferError> {
		value
			.parse()
			.map_err(|_| TransferError::Encoding(format!("invalid {what} address {value:?}")))
	}

	fn relay_contract(&self, request: &TransferRequest) -> Result<Address, TransferError> {
		let relay = request
			.intent
			.relay_contract_address
			.as_deref()
			.or_else(|| {
				request
					.route
					.as_ref()
					.and_then(|r| r.relay_contract_address.as_deref())
			})
			.or(self.chain.relay_contract.as_deref())
			.ok_or_else(|| {
				TransferError::UnsupportedNetwork(request.intent.source_chain_id.clone())
			})?;
		Self::parse_address(relay, "relay contract")
	}

	/// ERC-20 transfer for the same-chain fast path. A bech32 receiver is
	/// converted to hex first; a `0x` receiver passes through unchanged.
	fn build_direct(&self, request: &TransferRequest) -> Result<(Address, Vec<u8>), TransferError> {
		let intent = &request.intent;
		let token = Self::parse_address(&intent.base_token, "token")?;
		let receiver_hex = encode::receiver_to_hex(&intent.receiver)?;
		let to = Self::parse_address(&receiver_hex, "receiver")?;

		let data = IERC20::transferCall {
			to,
			amount: intent.base_amount,
		}
		.abi_encode();
		Ok((token, data))
	}

	fn build_cross_chain(
		&self,
		request: &TransferRequest,
	) -> Result<(Address, Vec<u8>), TransferError> {
		let intent = &request.intent;
		let route = request.route.as_ref().ok_or_else(|| {
			TransferError::Encoding("cross-chain transfer without a resolved route".to_string())
		})?;

		let relay = self.relay_contract(request)?;
		let channel_id = channel_ordinal(&route.source_channel).ok_or_else(|| {
			TransferError::Encoding(format!(
				"source channel {:?} has no numeric ordinal",
				route.source_channel
			))
		})?;

		let receiver = encode::receiver_to_bytes(&intent.receiver)?;
		let base_token = Self::parse_address(&intent.base_token, "token")?;

		// Direct routes skip quote resolution; the wrapped side then
		// mirrors the base asset.
		let quote_token = match request.quote.as_ref().and_then(|q| q.as_available()) {
			Some(repr) => encode::receiver_to_bytes(repr)?,
			None => base_token.to_vec(),
		};

		let salt: [u8; 32] = rand::random();

		let data = IRelay::transferCall {
			channelId: channel_id,
			receiver: receiver.into(),
			baseToken: base_token,
			baseAmount: intent.base_amount,
			quoteToken: quote_token.into(),
			quoteAmount: intent.base_amount,
			timeoutHeight: intent.timeout_height,
			timeoutTimestamp: intent.timeout_timestamp,
			salt: salt.into(),
		}
		.abi_encode();

		Ok((relay, data))
	}

	fn build(&self, request: &TransferRequest) -> Result<(Address, Vec<u8>), TransferError> {
		if request.intent.is_same_chain() {
			self.build_direct(request)
		} else {
			self.build_cross_chain(request)
		}
	}

	/// ERC-20 approval for the relay contract, submitted before the
	/// transfer. A failure here aborts the whole call.
	async fn approve(&self, request: &TransferRequest) -> Result<(), TransferError> {
		let intent = &request.intent;
		let token = Self::parse_address(&intent.base_token, "token")?;
		let relay = self.relay_contract(request)?;

		let data = IERC20::approveCall {
			spender: relay,
			amount: intent.base_amount,
		}
		.abi_encode();

		debug!(token = %token, relay = %relay, "submitting relay approval");
		self.provider
			.send(token, data)
			.await
			.map_err(|e| TransferError::ApprovalFailed { cause: e.0 })?;
		Ok(())
	}
}

#[async_trait]
impl TransferInterface for EvmTransfer {
	async fn transfer_asset(&self, request: &TransferRequest) -> Result<TxHandle, TransferError> {
		let intent = &request.intent;

		if !intent.is_same_chain() && intent.auto_approve {
			self.approve(request).await?;
		}

		let (to, data) = self.build(request)?;

		if intent.simulate {
			self.provider
				.estimate_gas(to, data.clone())
				.await
				.map_err(|e| TransferError::SimulationFailed { cause: e.0 })?;
		}

		let handle = self
			.provider
			.send(to, data)
			.await
			.map_err(|e| TransferError::SubmissionFailed { cause: e.0 })?;

		info!(
			source = %intent.source_chain_id,
			destination = %intent.destination_chain_id,
			tx = %handle,
			"evm transfer submitted"
		);
		Ok(handle)
	}

	async fn simulate_transaction(
		&self,
		request: &TransferRequest,
	) -> Result<GasEstimate, TransferError> {
		let (to, data) = self.build(request)?;
		self.provider
			.estimate_gas(to, data)
			.await
			.map(GasEstimate)
			.map_err(|e| TransferError::SimulationFailed { cause: e.0 })
	}
}

/// Adapts an `EvmProvider` to the quote resolver's view capability.
pub struct PredictView {
	provider: Arc<dyn EvmProvider>,
}

impl PredictView {
	pub fn new(provider: Arc<dyn EvmProvider>) -> Self {
		Self { provider }
	}
}

#[async_trait]
impl EvmView for PredictView {
	async fn predict_wrapped_token(
		&self,
		relay_contract: &str,
		path: u64,
		channel: u32,
		token: &[u8],
	) -> Result<Option<String>, ViewError> {
		let relay: Address = relay_contract
			.parse()
			.map_err(|_| ViewError(format!("invalid relay address {relay_contract:?}")))?;

		let data = predict_call_data(path, channel, token);

		let raw = self
			.provider
			.call(relay, data)
			.await
			.map_err(|e| ViewError(e.0))?;

		decode_predicted_token(&raw)
	}
}

pub(crate) fn predict_call_data(path: u64, channel: u32, token: &[u8]) -> Vec<u8> {
	IRelay::predictWrappedTokenCall {
		path: U256::from(path),
		channel,
		token: token.to_vec().into(),
	}
	.abi_encode()
}

/// The relay answers the zero address for channels it has never seen.
pub(crate) fn decode_predicted_token(raw: &[u8]) -> Result<Option<String>, ViewError> {
	let decoded = IRelay::predictWrappedTokenCall::abi_decode_returns(raw)
		.map_err(|e| ViewError(format!("undecodable predictWrappedToken answer: {e}")))?;

	let predicted = decoded._0;
	if predicted == Address::ZERO {
		Ok(None)
	} else {
		Ok(Some(format!("0x{}", hex::encode(predicted))))
	}
}
