//! Transfer intents.
//!
//! An intent is created per call and never mutated; a retry constructs a
//! fresh intent. Idempotency is the caller's concern (the EVM builder adds
//! a per-call random salt, Cosmos/Move rely on the transaction id).

use crate::chains::ChainId;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// A caller's request to move `base_amount` of `base_token` from
/// `source_chain_id` to `receiver` on `destination_chain_id`.
///
/// The signer itself is not carried here; signers are injected into the
/// family clients at construction time and shared read-only across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferIntent {
	pub source_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	/// Source-chain denom or contract address of the asset being sent.
	pub base_token: String,
	/// Wire-precision unsigned amount.
	pub base_amount: U256,
	/// Destination-chain-native address string.
	pub receiver: String,
	/// Caller memo; replaced by the PFM envelope on multi-hop routes.
	#[serde(default)]
	pub memo: Option<String>,
	/// Overrides the registry's relay contract for the source chain.
	#[serde(default)]
	pub relay_contract_address: Option<String>,
	/// Run an ERC-20 approve for the relay contract before the transfer.
	#[serde(default)]
	pub auto_approve: bool,
	/// Validate via the chain's simulation primitive before submitting.
	#[serde(default)]
	pub simulate: bool,
	/// Packet timeout height; 0 means no height timeout.
	#[serde(default)]
	pub timeout_height: u64,
	/// Packet timeout timestamp; 0 means no timestamp timeout.
	#[serde(default)]
	pub timeout_timestamp: u64,
}

impl TransferIntent {
	pub fn is_same_chain(&self) -> bool {
		self.source_chain_id == self.destination_chain_id
	}
}
