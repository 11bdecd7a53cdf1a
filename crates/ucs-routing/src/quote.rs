//! Quote-token resolution.
//!
//! Finds what a base asset is called on the other end of a route. The
//! unwrap lookup runs first: if the index knows `base_token` as a wrapped
//! asset whose wrapping came through the route's source channel, its
//! unwrapped origin address is the quote. Failing that, the destination
//! relay contract's `predictWrappedToken` view computes the deterministic
//! wrapped address. When neither yields anything the result is the
//! `NoQuoteAvailable` sentinel, never an error.

use crate::hubble::{IndexError, TokenIndex};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use ucs_types::{ChainId, QuoteToken, RouteDetail, TransferError};

#[derive(Debug, Error)]
#[error("view call failed: {0}")]
pub struct ViewError(pub String);

#[derive(Debug, Error)]
pub enum QuoteError {
	#[error(transparent)]
	Index(#[from] IndexError),
}

impl From<QuoteError> for TransferError {
	fn from(err: QuoteError) -> Self {
		match err {
			QuoteError::Index(e) => TransferError::Index(e.to_string()),
		}
	}
}

/// On-chain view capability against a destination relay contract.
///
/// `None` means the contract answered with an empty/zero address, i.e. no
/// wrapped representation exists yet.
#[async_trait]
pub trait EvmView: Send + Sync {
	async fn predict_wrapped_token(
		&self,
		relay_contract: &str,
		path: u64,
		channel: u32,
		token: &[u8],
	) -> Result<Option<String>, ViewError>;
}

/// Resolves the destination-chain representation of a base asset.
pub struct QuoteResolver {
	tokens: Arc<dyn TokenIndex>,
	view: Option<Arc<dyn EvmView>>,
}

impl QuoteResolver {
	pub fn new(tokens: Arc<dyn TokenIndex>) -> Self {
		Self { tokens, view: None }
	}

	pub fn with_view(mut self, view: Arc<dyn EvmView>) -> Self {
		self.view = Some(view);
		self
	}

	pub async fn resolve_quote_token(
		&self,
		source: &ChainId,
		base_token: &str,
		route: &RouteDetail,
	) -> Result<QuoteToken, QuoteError> {
		// Unwrap direction on purpose: a hit means base_token is itself a
		// wrapped asset and the quote is its origin on the counterparty.
		let rows = self
			.tokens
			.wrappings(source, base_token, &route.source_channel)
			.await?;

		if let Some(row) = rows.first() {
			debug!(
				base_token,
				quote = %row.unwrapped_address_hex,
				origin_chain = %row.unwrapped_chain_id,
				"quote token resolved from wrapping index"
			);
			return Ok(QuoteToken::Available(row.unwrapped_address_hex.clone()));
		}

		if let Some(predicted) = self.predict(base_token, route).await {
			return Ok(QuoteToken::Available(predicted));
		}

		Ok(QuoteToken::NoQuoteAvailable)
	}

	/// On-chain prediction fallback. Any failure here degrades to "no
	/// quote" instead of surfacing an error.
	async fn predict(&self, base_token: &str, route: &RouteDetail) -> Option<String> {
		let view = self.view.as_ref()?;
		let relay = route.relay_contract_address.as_deref()?;
		let channel = channel_ordinal(&route.destination_channel)?;
		let token = token_bytes(base_token);

		match view.predict_wrapped_token(relay, 0, channel, &token).await {
			Ok(predicted) => {
				if let Some(addr) = &predicted {
					debug!(base_token, quote = %addr, "quote token predicted on-chain");
				}
				predicted
			}
			Err(e) => {
				warn!(base_token, error = %e, "predictWrappedToken failed");
				None
			}
		}
	}
}

/// Numeric ordinal of a `channel-N` identifier.
pub fn channel_ordinal(channel: &str) -> Option<u32> {
	channel.strip_prefix("channel-")?.parse().ok()
}

/// Token argument for the view call: hex-decoded when `0x`-prefixed,
/// otherwise the raw denom bytes.
fn token_bytes(token: &str) -> Vec<u8> {
	match token.strip_prefix("0x") {
		Some(hex_body) => hex::decode(hex_body).unwrap_or_else(|_| token.as_bytes().to_vec()),
		None => token.as_bytes().to_vec(),
	}
}
