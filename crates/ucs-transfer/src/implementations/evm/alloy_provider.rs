//! Alloy-backed `EvmProvider`.
//!
//! The provider's wallet filler handles signing; this adapter only maps
//! between the builder's narrow capability surface and Alloy's provider
//! API.

use super::{EvmProvider, ProviderError};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::info;
use ucs_types::TxHandle;

pub struct AlloyEvmProvider {
	provider: DynProvider,
}

impl AlloyEvmProvider {
	pub fn connect(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self, ProviderError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ProviderError(format!("invalid RPC URL: {e}")))?;

		let wallet = EthereumWallet::from(signer);
		let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

		Ok(Self { provider })
	}

	fn request(to: Address, data: Vec<u8>) -> TransactionRequest {
		TransactionRequest::default()
			.with_to(to)
			.with_input(Bytes::from(data))
	}
}

#[async_trait]
impl EvmProvider for AlloyEvmProvider {
	async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
		self.provider
			.call(Self::request(to, data))
			.await
			.map(|bytes| bytes.to_vec())
			.map_err(|e| ProviderError(e.to_string()))
	}

	async fn estimate_gas(&self, to: Address, data: Vec<u8>) -> Result<u64, ProviderError> {
		self.provider
			.estimate_gas(Self::request(to, data))
			.await
			.map_err(|e| ProviderError(e.to_string()))
	}

	async fn send(&self, to: Address, data: Vec<u8>) -> Result<TxHandle, ProviderError> {
		let pending = self
			.provider
			.send_transaction(Self::request(to, data))
			.await
			.map_err(|e| ProviderError(e.to_string()))?;

		let hash = *pending.tx_hash();
		info!(tx_hash = %hash, "submitted evm transaction");
		Ok(TxHandle(hash.to_string()))
	}
}
