//! Transfer execution types shared between the orchestrator and the
//! chain-family builders.

use crate::intent::TransferIntent;
use crate::route::{QuoteToken, RouteDetail};
use serde::{Deserialize, Serialize};

/// Opaque handle to a submitted transaction, as returned by the
/// underlying chain client (hex hash on EVM/Move, tx hash on Cosmos).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle(pub String);

impl std::fmt::Display for TxHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Result of a dry run: the gas the chain reports for the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate(pub u64);

/// A coin amount as it appears in Cosmos messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
	pub denom: String,
	pub amount: String,
}

/// An intent plus the orchestrator's resolved context, handed to a
/// chain-family builder. Immutable; builders hold no state between calls.
#[derive(Debug, Clone)]
pub struct TransferRequest {
	pub intent: TransferIntent,
	/// `None` on the same-chain fast path.
	pub route: Option<RouteDetail>,
	/// Resolved only for PFM routes.
	pub quote: Option<QuoteToken>,
	/// The PFM forwarding envelope, already encoded.
	pub memo: Option<String>,
}

impl TransferRequest {
	/// A request with no routing context, for same-chain transfers.
	pub fn same_chain(intent: TransferIntent) -> Self {
		Self {
			intent,
			route: None,
			quote: None,
			memo: None,
		}
	}
}
