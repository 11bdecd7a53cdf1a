//! Cosmos transfer builder.
//!
//! Same-chain transfers are a native bank `MsgSend`. Cross-chain
//! transfers are either a CosmWasm `execute` on the relay contract or,
//! when the destination is directly adjacent and no relay contract is
//! involved, a native ICS-20 `MsgTransfer`. Multi-hop routes carry the
//! PFM envelope in the memo field.
//!
//! Messages are built as typed structs and handed to the injected
//! `CosmosSigner`; signing and broadcast happen behind that capability.

use crate::encode;
use crate::{SignerError, TransferInterface};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use ucs_registry::ChainInfo;
use ucs_types::{
	Coin, GasEstimate, TransferError, TransferRequest, TransferType, TxHandle,
};

/// Account resolved from the offline signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsgSend {
	pub from_address: String,
	pub to_address: String,
	pub amount: Vec<Coin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutHeight {
	pub revision_number: u64,
	pub revision_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsgTransfer {
	pub source_port: String,
	pub source_channel: String,
	pub token: Coin,
	pub sender: String,
	pub receiver: String,
	pub timeout_height: TimeoutHeight,
	/// 0 means no timestamp timeout; the height governs.
	pub timeout_timestamp: u64,
	pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsgExecuteContract {
	pub sender: String,
	pub contract: String,
	pub msg: serde_json::Value,
	pub funds: Vec<Coin>,
}

/// The message shapes the builder emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CosmosMsg {
	Send(MsgSend),
	Transfer(MsgTransfer),
	ExecuteContract(MsgExecuteContract),
}

/// Capability surface of a Cosmos signing client.
#[async_trait]
pub trait CosmosSigner: Send + Sync {
	/// The signer's account, or `None` when the offline signer exposes
	/// no account at all.
	async fn account(&self) -> Result<Option<AccountInfo>, SignerError>;

	async fn sign_and_broadcast(&self, msgs: Vec<CosmosMsg>) -> Result<TxHandle, SignerError>;

	async fn simulate(&self, msgs: Vec<CosmosMsg>) -> Result<u64, SignerError>;
}

/// Cosmos implementation of the two-operation transfer surface.
pub struct CosmosTransfer {
	chain: ChainInfo,
	signer: Arc<dyn CosmosSigner>,
}

impl CosmosTransfer {
	pub fn new(chain: ChainInfo, signer: Arc<dyn CosmosSigner>) -> Self {
		Self { chain, signer }
	}

	fn relay_contract(&self, request: &TransferRequest) -> Option<String> {
		request
			.intent
			.relay_contract_address
			.clone()
			.or_else(|| {
				request
					.route
					.as_ref()
					.and_then(|r| r.relay_contract_address.clone())
			})
			.or_else(|| self.chain.relay_contract.clone())
	}

	fn build(&self, sender: &str, request: &TransferRequest) -> Result<CosmosMsg, TransferError> {
		let intent = &request.intent;
		let funds = Coin {
			denom: intent.base_token.clone(),
			amount: intent.base_amount.to_string(),
		};

		if intent.is_same_chain() {
			return Ok(CosmosMsg::Send(MsgSend {
				from_address: sender.to_string(),
				to_address: intent.receiver.clone(),
				amount: vec![funds],
			}));
		}

		let route = request.route.as_ref().ok_or_else(|| {
			TransferError::Encoding("cross-chain transfer without a resolved route".to_string())
		})?;

		// Forwarding memos store hex receivers without the 0x marker,
		// the inverse of the EVM convention.
		let receiver = encode::strip_hex_prefix(&intent.receiver).to_string();
		let memo = request
			.memo
			.clone()
			.or_else(|| intent.memo.clone())
			.unwrap_or_default();

		let relay = self.relay_contract(request);
		if route.transfer_type == TransferType::Direct && relay.is_none() {
			// Directly adjacent chains speak native ICS-20.
			return Ok(CosmosMsg::Transfer(MsgTransfer {
				source_port: route.source_port.clone(),
				source_channel: route.source_channel.clone(),
				token: funds,
				sender: sender.to_string(),
				receiver,
				timeout_height: TimeoutHeight {
					revision_number: 0,
					revision_height: intent.timeout_height,
				},
				timeout_timestamp: intent.timeout_timestamp,
				memo,
			}));
		}

		let contract = relay.ok_or_else(|| {
			TransferError::UnsupportedNetwork(intent.source_chain_id.clone())
		})?;

		debug!(contract = %contract, channel = %route.source_channel, "building cosmwasm transfer");
		Ok(CosmosMsg::ExecuteContract(MsgExecuteContract {
			sender: sender.to_string(),
			contract,
			msg: serde_json::json!({
				"transfer": {
					"channel": route.source_channel,
					"receiver": receiver,
					"memo": memo,
				}
			}),
			funds: vec![Coin {
				denom: intent.base_token.clone(),
				amount: intent.base_amount.to_string(),
			}],
		}))
	}
}

#[async_trait]
impl TransferInterface for CosmosTransfer {
	async fn transfer_asset(&self, request: &TransferRequest) -> Result<TxHandle, TransferError> {
		let sender = self
			.signer
			.account()
			.await
			.map_err(|e| TransferError::SubmissionFailed { cause: e.0 })?
			.ok_or(TransferError::NoAccountFound)?
			.address;

		let msg = self.build(&sender, request)?;

		if request.intent.simulate {
			self.signer
				.simulate(vec![msg.clone()])
				.await
				.map_err(|e| TransferError::SimulationFailed { cause: e.0 })?;
		}

		let handle = self
			.signer
			.sign_and_broadcast(vec![msg])
			.await
			.map_err(|e| TransferError::SubmissionFailed { cause: e.0 })?;

		info!(
			source = %request.intent.source_chain_id,
			destination = %request.intent.destination_chain_id,
			tx = %handle,
			"cosmos transfer submitted"
		);
		Ok(handle)
	}

	async fn simulate_transaction(
		&self,
		request: &TransferRequest,
	) -> Result<GasEstimate, TransferError> {
		let sender = self
			.signer
			.account()
			.await
			.map_err(|e| TransferError::SimulationFailed { cause: e.0 })?
			.ok_or(TransferError::NoAccountFound)?
			.address;

		let msg = self.build(&sender, request)?;
		self.signer
			.simulate(vec![msg])
			.await
			.map(GasEstimate)
			.map_err(|e| TransferError::SimulationFailed { cause: e.0 })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::U256;
	use std::sync::Mutex;
	use ucs_routing::build_forward_memo;
	use ucs_types::{ChainFamily, ChainId, ForwardHop, RouteDetail, TransferIntent};

	struct MockSigner {
		account: Option<AccountInfo>,
		broadcast: Mutex<Vec<Vec<CosmosMsg>>>,
		simulated: Mutex<Vec<Vec<CosmosMsg>>>,
	}

	impl MockSigner {
		fn with_account(address: &str) -> Arc<Self> {
			Arc::new(Self {
				account: Some(AccountInfo {
					address: address.to_string(),
				}),
				broadcast: Mutex::new(Vec::new()),
				simulated: Mutex::new(Vec::new()),
			})
		}

		fn without_account() -> Arc<Self> {
			Arc::new(Self {
				account: None,
				broadcast: Mutex::new(Vec::new()),
				simulated: Mutex::new(Vec::new()),
			})
		}

		fn broadcasted(&self) -> Vec<Vec<CosmosMsg>> {
			self.broadcast.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl CosmosSigner for MockSigner {
		async fn account(&self) -> Result<Option<AccountInfo>, SignerError> {
			Ok(self.account.clone())
		}

		async fn sign_and_broadcast(
			&self,
			msgs: Vec<CosmosMsg>,
		) -> Result<TxHandle, SignerError> {
			self.broadcast.lock().unwrap().push(msgs);
			Ok(TxHandle("A1B2C3".to_string()))
		}

		async fn simulate(&self, msgs: Vec<CosmosMsg>) -> Result<u64, SignerError> {
			self.simulated.lock().unwrap().push(msgs);
			Ok(180_000)
		}
	}

	fn chain(relay: Option<&str>) -> ChainInfo {
		ChainInfo {
			chain_id: ChainId::from("union-testnet-8"),
			family: ChainFamily::Cosmos,
			rpc_url: "http://localhost:26657".to_string(),
			relay_contract: relay.map(str::to_string),
			bech32_prefix: Some("union".to_string()),
			display_name: None,
		}
	}

	fn intent(destination: &str, receiver: &str) -> TransferIntent {
		TransferIntent {
			source_chain_id: ChainId::from("union-testnet-8"),
			destination_chain_id: ChainId::from(destination),
			base_token: "muno".to_string(),
			base_amount: U256::from(2_500u64),
			receiver: receiver.to_string(),
			memo: None,
			relay_contract_address: None,
			auto_approve: false,
			simulate: false,
			timeout_height: 0,
			timeout_timestamp: 0,
		}
	}

	fn direct_route() -> RouteDetail {
		RouteDetail {
			source_channel: "channel-7".to_string(),
			destination_channel: "channel-41".to_string(),
			source_port: "transfer".to_string(),
			destination_port: "transfer".to_string(),
			relay_contract_address: None,
			transfer_type: TransferType::Direct,
			forward: None,
		}
	}

	fn pfm_route() -> RouteDetail {
		RouteDetail {
			source_channel: "channel-7".to_string(),
			destination_channel: "channel-41".to_string(),
			source_port: "wasm.union1relay".to_string(),
			destination_port: "transfer".to_string(),
			relay_contract_address: Some("union1relay".to_string()),
			transfer_type: TransferType::Pfm,
			forward: Some(ForwardHop {
				port: "wasm.contractXYZ".to_string(),
				channel: "channel-12".to_string(),
			}),
		}
	}

	#[tokio::test]
	async fn missing_account_is_structural() {
		let signer = MockSigner::without_account();
		let builder = CosmosTransfer::new(chain(None), signer);

		let request = TransferRequest::same_chain(intent("union-testnet-8", "union1friend"));
		let err = builder.transfer_asset(&request).await.unwrap_err();
		assert!(matches!(err, TransferError::NoAccountFound));
	}

	#[tokio::test]
	async fn same_chain_is_bank_send() {
		let signer = MockSigner::with_account("union1sender");
		let builder = CosmosTransfer::new(chain(None), signer.clone());

		let request = TransferRequest::same_chain(intent("union-testnet-8", "union1friend"));
		builder.transfer_asset(&request).await.unwrap();

		let sent = signer.broadcasted();
		assert_eq!(
			sent[0][0],
			CosmosMsg::Send(MsgSend {
				from_address: "union1sender".to_string(),
				to_address: "union1friend".to_string(),
				amount: vec![Coin {
					denom: "muno".to_string(),
					amount: "2500".to_string(),
				}],
			})
		);
	}

	#[tokio::test]
	async fn adjacent_chain_uses_native_ics20() {
		let signer = MockSigner::with_account("union1sender");
		let builder = CosmosTransfer::new(chain(None), signer.clone());

		let mut transfer_intent = intent("osmo-test-5", "osmo1friend");
		transfer_intent.timeout_height = 12345;

		let request = TransferRequest {
			intent: transfer_intent,
			route: Some(direct_route()),
			quote: None,
			memo: None,
		};
		builder.transfer_asset(&request).await.unwrap();

		let sent = signer.broadcasted();
		match &sent[0][0] {
			CosmosMsg::Transfer(msg) => {
				assert_eq!(msg.source_port, "transfer");
				assert_eq!(msg.source_channel, "channel-7");
				assert_eq!(msg.timeout_height.revision_height, 12345);
				assert_eq!(msg.timeout_timestamp, 0);
				assert_eq!(msg.receiver, "osmo1friend");
			}
			other => panic!("expected MsgTransfer, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn pfm_route_builds_cosmwasm_execute_with_memo() {
		let signer = MockSigner::with_account("union1sender");
		let builder = CosmosTransfer::new(chain(Some("union1relay")), signer.clone());

		let route = pfm_route();
		let hop = route.forward.clone().unwrap();
		let memo = build_forward_memo(&hop.port, &hop.channel, "0xdeadbeef");

		let request = TransferRequest {
			intent: intent("11155111", "0xdeadbeef"),
			route: Some(route),
			quote: None,
			memo: Some(memo.clone()),
		};
		builder.transfer_asset(&request).await.unwrap();

		let sent = signer.broadcasted();
		match &sent[0][0] {
			CosmosMsg::ExecuteContract(msg) => {
				assert_eq!(msg.contract, "union1relay");
				assert_eq!(
					msg.msg,
					serde_json::json!({
						"transfer": {
							"channel": "channel-7",
							"receiver": "deadbeef",
							"memo": memo,
						}
					})
				);
				assert_eq!(
					msg.funds,
					vec![Coin {
						denom: "muno".to_string(),
						amount: "2500".to_string(),
					}]
				);
			}
			other => panic!("expected MsgExecuteContract, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn simulate_transaction_never_broadcasts() {
		let signer = MockSigner::with_account("union1sender");
		let builder = CosmosTransfer::new(chain(Some("union1relay")), signer.clone());

		let request = TransferRequest {
			intent: intent("11155111", "0xdeadbeef"),
			route: Some(pfm_route()),
			quote: None,
			memo: None,
		};

		let gas = builder.simulate_transaction(&request).await.unwrap();
		assert_eq!(gas, GasEstimate(180_000));
		assert!(signer.broadcasted().is_empty());
	}
}
