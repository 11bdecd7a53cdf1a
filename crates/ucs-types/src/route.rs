//! Resolved route and quote-token types.

use serde::{Deserialize, Serialize};

/// Whether a route reaches the destination in one hop or must be
/// forwarded through an intermediate chain's packet-forward middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
	Direct,
	Pfm,
}

/// The forwarding leg of a PFM route: the port and channel the
/// intermediate chain uses to reach the final destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardHop {
	pub port: String,
	pub channel: String,
}

/// A fully validated route between two chains.
///
/// Produced fresh per resolution call and never mutated afterwards. Every
/// field is populated; a row with missing fields never becomes a
/// `RouteDetail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDetail {
	pub source_channel: String,
	pub destination_channel: String,
	pub source_port: String,
	pub destination_port: String,
	pub relay_contract_address: Option<String>,
	pub transfer_type: TransferType,
	/// Present exactly when `transfer_type` is `Pfm`.
	pub forward: Option<ForwardHop>,
}

/// Destination-chain representation of a base asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteToken {
	/// Address or denom of the wrapped asset on the destination.
	Available(String),
	/// No existing wrapped representation. The caller decides whether
	/// this is fatal for the route.
	NoQuoteAvailable,
}

impl QuoteToken {
	pub fn as_available(&self) -> Option<&str> {
		match self {
			QuoteToken::Available(repr) => Some(repr),
			QuoteToken::NoQuoteAvailable => None,
		}
	}
}
