//! Registry of supported chains.
//!
//! The registry is the single place that knows which chain ids exist,
//! which family each belongs to, and the per-chain metadata (RPC endpoint,
//! relay contract, bech32 prefix) the builders need. It is immutable after
//! construction and shared via `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use ucs_types::{ChainFamily, ChainId, TransferError};

/// Static metadata for one supported chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainInfo {
	pub chain_id: ChainId,
	pub family: ChainFamily,
	pub rpc_url: String,
	/// UCS relay contract / module address on this chain, if deployed.
	#[serde(default)]
	pub relay_contract: Option<String>,
	/// Account prefix for bech32 address rendering (Cosmos chains only).
	#[serde(default)]
	pub bech32_prefix: Option<String>,
	#[serde(default)]
	pub display_name: Option<String>,
}

/// Lookup table from chain id to chain metadata.
pub struct ChainRegistry {
	chains: HashMap<ChainId, ChainInfo>,
}

impl ChainRegistry {
	pub fn new() -> Self {
		Self {
			chains: HashMap::new(),
		}
	}

	/// Registers a chain. Later registrations for the same id win; the
	/// registry is meant to be populated once at startup.
	pub fn insert(&mut self, info: ChainInfo) {
		info!(chain = %info.chain_id, family = %info.family, "registering chain");
		self.chains.insert(info.chain_id.clone(), info);
	}

	pub fn get(&self, chain_id: &ChainId) -> Option<&ChainInfo> {
		self.chains.get(chain_id)
	}

	pub fn get_required(&self, chain_id: &ChainId) -> Result<&ChainInfo, TransferError> {
		self.chains
			.get(chain_id)
			.ok_or_else(|| TransferError::UnsupportedNetwork(chain_id.clone()))
	}

	/// Family of a chain, or `UnsupportedNetwork` if it is not registered.
	pub fn family_of(&self, chain_id: &ChainId) -> Result<ChainFamily, TransferError> {
		self.get_required(chain_id).map(|info| info.family)
	}

	pub fn chains(&self) -> impl Iterator<Item = &ChainInfo> {
		self.chains.values()
	}

	pub fn into_shared(self) -> Arc<Self> {
		Arc::new(self)
	}

	/// A registry seeded with the production chains the SDK ships support
	/// for. Callers extend or replace this from config.
	pub fn well_known() -> Self {
		let mut registry = Self::new();
		registry.insert(ChainInfo {
			chain_id: ChainId::from("11155111"),
			family: ChainFamily::Evm,
			rpc_url: "https://rpc.sepolia.org".to_string(),
			relay_contract: Some("0x84f074c15513f15baea0fbed3ec42f0bd1fb3efa".to_string()),
			bech32_prefix: None,
			display_name: Some("Sepolia".to_string()),
		});
		registry.insert(ChainInfo {
			chain_id: ChainId::from("union-testnet-8"),
			family: ChainFamily::Cosmos,
			rpc_url: "https://rpc.testnet-8.union.build".to_string(),
			relay_contract: Some(
				"union1m37cxl0ld4uaw3r4lv9nt2uw69xxf8xfjrf7a4w9hamv6xvp6ddqqfaaaa".to_string(),
			),
			bech32_prefix: Some("union".to_string()),
			display_name: Some("Union Testnet".to_string()),
		});
		registry.insert(ChainInfo {
			chain_id: ChainId::from("osmo-test-5"),
			family: ChainFamily::Cosmos,
			rpc_url: "https://rpc.osmotest5.osmosis.zone".to_string(),
			relay_contract: None,
			bech32_prefix: Some("osmo".to_string()),
			display_name: Some("Osmosis Testnet".to_string()),
		});
		registry.insert(ChainInfo {
			chain_id: ChainId::from("2"),
			family: ChainFamily::Move,
			rpc_url: "https://fullnode.testnet.aptoslabs.com/v1".to_string(),
			relay_contract: Some(
				"0x80a825c8878d4e22f459f76e581cb477d82f0222e136b06f01ad146e2ae9ed84".to_string(),
			),
			bech32_prefix: None,
			display_name: Some("Aptos Testnet".to_string()),
		});
		registry
	}
}

impl Default for ChainRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ChainRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChainRegistry")
			.field("chains", &self.chains.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn evm_chain(id: &str) -> ChainInfo {
		ChainInfo {
			chain_id: ChainId::from(id),
			family: ChainFamily::Evm,
			rpc_url: "http://localhost:8545".to_string(),
			relay_contract: None,
			bech32_prefix: None,
			display_name: None,
		}
	}

	#[test]
	fn family_lookup() {
		let mut registry = ChainRegistry::new();
		registry.insert(evm_chain("1"));

		assert_eq!(
			registry.family_of(&ChainId::from("1")).unwrap(),
			ChainFamily::Evm
		);
	}

	#[test]
	fn unknown_chain_is_unsupported_network() {
		let registry = ChainRegistry::new();
		let err = registry.family_of(&ChainId::from("999")).unwrap_err();
		assert!(matches!(err, TransferError::UnsupportedNetwork(_)));
	}

	#[test]
	fn well_known_covers_all_families() {
		let registry = ChainRegistry::well_known();
		let families: Vec<_> = registry.chains().map(|c| c.family).collect();
		assert!(families.contains(&ChainFamily::Evm));
		assert!(families.contains(&ChainFamily::Cosmos));
		assert!(families.contains(&ChainFamily::Move));
	}
}
