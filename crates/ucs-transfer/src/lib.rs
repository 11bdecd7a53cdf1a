//! Chain-family transfer builders.
//!
//! Each family (EVM, Cosmos, Move) implements the same two-operation
//! surface: build-and-submit, and dry-run. Builders are stateless; every
//! call is a pure function of the request plus read-only network calls
//! issued through narrow capability traits. The underlying chain SDKs
//! (signing, mempool submission) live behind those traits and are never
//! reimplemented here.

pub mod encode;
pub mod implementations;

use async_trait::async_trait;
use thiserror::Error;
use ucs_types::{GasEstimate, TransferError, TransferRequest, TxHandle};

pub use implementations::cosmos::{AccountInfo, CosmosMsg, CosmosSigner, CosmosTransfer};
pub use implementations::evm::alloy_provider::AlloyEvmProvider;
pub use implementations::evm::rpc_view::BatchedPredictView;
pub use implementations::evm::{EvmProvider, EvmTransfer, PredictView, ProviderError};
pub use implementations::move_chain::{
	AuthAccess, EntryFunctionPayload, MoveSigner, MoveTransfer,
};

/// Error surface of the injected signer capabilities. Carried as an
/// opaque message; builders classify it into the `TransferError`
/// taxonomy at the call site.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SignerError(pub String);

/// The uniform two-operation contract every chain family exposes.
#[async_trait]
pub trait TransferInterface: Send + Sync {
	/// Builds, optionally approves, optionally simulates, then submits.
	async fn transfer_asset(&self, request: &TransferRequest) -> Result<TxHandle, TransferError>;

	/// Dry run only; never submits and is safe to abandon.
	async fn simulate_transaction(
		&self,
		request: &TransferRequest,
	) -> Result<GasEstimate, TransferError>;
}
