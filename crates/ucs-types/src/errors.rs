//! Error taxonomy for the transfer core.
//!
//! Every public operation returns a `Result`; chain-SDK failures are
//! converted into one of these variants at the single call site that
//! invokes the SDK. No exception-style propagation crosses a public
//! boundary.

use crate::chains::ChainId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
	#[error("no route found from {source} to {destination}: {reason}")]
	RouteNotFound {
		source: ChainId,
		destination: ChainId,
		reason: String,
	},

	/// A PFM route was resolved but the destination has no wrapped
	/// representation of the base asset. Fatal for that route; never
	/// silently downgraded to "use the base token".
	#[error("no quote token available for {base_token} via channel {channel}")]
	NoQuoteAvailable { base_token: String, channel: String },

	#[error("no account found for the configured signer")]
	NoAccountFound,

	#[error("no signer configured for chain {0}")]
	NoSignerFound(ChainId),

	#[error("approval failed: {cause}")]
	ApprovalFailed { cause: String },

	#[error("simulation failed: {cause}")]
	SimulationFailed { cause: String },

	#[error("submission failed: {cause}")]
	SubmissionFailed { cause: String },

	#[error("unsupported network: {0}")]
	UnsupportedNetwork(ChainId),

	#[error("encoding error: {0}")]
	Encoding(String),

	#[error("offchain index error: {0}")]
	Index(String),
}
