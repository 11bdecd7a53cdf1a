//! Chain identification types.
//!
//! Chain ids are opaque strings namespaced per family: EVM chains use the
//! decimal chain id ("1", "11155111"), Cosmos chains use the bech32-style
//! chain-id string ("union-testnet-8"), Move chains use a small integer
//! string. A chain id is only ever a lookup key; nothing parses it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque chain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::error::Error for ChainId {}

impl From<&str> for ChainId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for ChainId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// The closed set of supported chain families.
///
/// Family dispatch happens once at the orchestrator boundary; the rest of
/// the pipeline never inspects the family again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
	Evm,
	Cosmos,
	Move,
}

impl fmt::Display for ChainFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChainFamily::Evm => write!(f, "evm"),
			ChainFamily::Cosmos => write!(f, "cosmos"),
			ChainFamily::Move => write!(f, "move"),
		}
	}
}
