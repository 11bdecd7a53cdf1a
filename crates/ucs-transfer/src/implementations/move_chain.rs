//! Move/Aptos transfer builder.
//!
//! Same-chain transfers call the standard fungible-asset transfer entry
//! function; cross-chain transfers call the relay module's `ibc::send`.
//! Key-based and browser-wallet signers sit behind the same `MoveSigner`
//! capability: payload construction is identical, only authorization and
//! submission differ inside the signer implementation.

use crate::encode;
use crate::{SignerError, TransferInterface};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use ucs_registry::ChainInfo;
use ucs_types::{GasEstimate, TransferError, TransferRequest, TxHandle};

/// Effectively no timeout; delivery relies on application-level retry.
pub const TIMEOUT_HEIGHT: u64 = 999_999_999;
pub const TIMEOUT_TIMESTAMP: u64 = u64::MAX - 1;

/// How the signer authorizes transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAccess {
	/// In-process private key: build, sign, submit.
	Key,
	/// Browser wallet: a single sign-and-submit round trip.
	Wallet,
}

/// A Move entry-function invocation, ready for either signer kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunctionPayload {
	pub function: String,
	pub type_arguments: Vec<String>,
	pub arguments: Vec<String>,
}

/// Capability surface of a Move signing client.
#[async_trait]
pub trait MoveSigner: Send + Sync {
	fn auth_access(&self) -> AuthAccess;

	async fn account_address(&self) -> Result<Option<String>, SignerError>;

	async fn submit_entry_function(
		&self,
		payload: &EntryFunctionPayload,
	) -> Result<TxHandle, SignerError>;

	async fn simulate_entry_function(
		&self,
		payload: &EntryFunctionPayload,
	) -> Result<u64, SignerError>;
}

/// Move implementation of the two-operation transfer surface.
pub struct MoveTransfer {
	chain: ChainInfo,
	signer: Arc<dyn MoveSigner>,
}

impl MoveTransfer {
	pub fn new(chain: ChainInfo, signer: Arc<dyn MoveSigner>) -> Self {
		Self { chain, signer }
	}

	fn relay_module(&self, request: &TransferRequest) -> Result<String, TransferError> {
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
			.ok_or_else(|| {
				TransferError::UnsupportedNetwork(request.intent.source_chain_id.clone())
			})
	}

	fn build(&self, request: &TransferRequest) -> Result<EntryFunctionPayload, TransferError> {
		let intent = &request.intent;

		if intent.is_same_chain() {
			return Ok(EntryFunctionPayload {
				function: "0x1::primary_fungible_store::transfer".to_string(),
				type_arguments: vec!["0x1::fungible_asset::Metadata".to_string()],
				arguments: vec![
					intent.base_token.clone(),
					intent.receiver.clone(),
					intent.base_amount.to_string(),
				],
			});
		}

		let route = request.route.as_ref().ok_or_else(|| {
			TransferError::Encoding("cross-chain transfer without a resolved route".to_string())
		})?;
		let relay = self.relay_module(request)?;

		// The receiver may arrive bech32 or 0x-hex encoded; either way the
		// entry function takes raw bytes, passed hex encoded.
		let receiver = hex::encode(encode::receiver_to_bytes(&intent.receiver)?);
		let memo = request
			.memo
			.clone()
			.or_else(|| intent.memo.clone())
			.unwrap_or_default();

		debug!(relay = %relay, channel = %route.source_channel, "building move ibc send");
		Ok(EntryFunctionPayload {
			function: format!("{relay}::ibc::send"),
			type_arguments: vec![],
			arguments: vec![
				route.source_channel.clone(),
				receiver,
				intent.base_token.clone(),
				intent.base_amount.to_string(),
				memo,
				TIMEOUT_HEIGHT.to_string(),
				TIMEOUT_TIMESTAMP.to_string(),
			],
		})
	}
}

#[async_trait]
impl TransferInterface for MoveTransfer {
	async fn transfer_asset(&self, request: &TransferRequest) -> Result<TxHandle, TransferError> {
		self.signer
			.account_address()
			.await
			.map_err(|e| TransferError::SubmissionFailed { cause: e.0 })?
			.ok_or(TransferError::NoAccountFound)?;

		let payload = self.build(request)?;

		if request.intent.simulate {
			self.signer
				.simulate_entry_function(&payload)
				.await
				.map_err(|e| TransferError::SimulationFailed { cause: e.0 })?;
		}

		let handle = self
			.signer
			.submit_entry_function(&payload)
			.await
			.map_err(|e| TransferError::SubmissionFailed { cause: e.0 })?;

		info!(
			source = %request.intent.source_chain_id,
			destination = %request.intent.destination_chain_id,
			auth = ?self.signer.auth_access(),
			tx = %handle,
			"move transfer submitted"
		);
		Ok(handle)
	}

	async fn simulate_transaction(
		&self,
		request: &TransferRequest,
	) -> Result<GasEstimate, TransferError> {
		self.signer
			.account_address()
			.await
			.map_err(|e| TransferError::SimulationFailed { cause: e.0 })?
			.ok_or(TransferError::NoAccountFound)?;

		let payload = self.build(request)?;
		self.signer
			.simulate_entry_function(&payload)
			.await
			.map(GasEstimate)
			.map_err(|e| TransferError::SimulationFailed { cause: e.0 })
	}
}
