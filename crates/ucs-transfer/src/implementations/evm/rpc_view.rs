//! `predictWrappedToken` view calls over the coalescing JSON-RPC transport.
//!
//! Quote resolution can fire one view call per candidate channel; routing
//! them through [`HttpTransport`] lets concurrent lookups share a single
//! `eth_call` batch instead of hitting the node one request at a time.

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use ucs_routing::{EvmView, ViewError};
use ucs_rpc::HttpTransport;

use super::{decode_predicted_token, predict_call_data};

pub struct BatchedPredictView {
	transport: Arc<HttpTransport>,
}

impl BatchedPredictView {
	pub fn new(transport: Arc<HttpTransport>) -> Self {
		Self { transport }
	}
}

#[async_trait]
impl EvmView for BatchedPredictView {
	async fn predict_wrapped_token(
		&self,
		relay_contract: &str,
		path: u64,
		channel: u32,
		token: &[u8],
	) -> Result<Option<String>, ViewError> {
		let relay: Address = relay_contract
			.parse()
			.map_err(|_| ViewError(format!("invalid relay address {relay_contract:?}")))?;

		let data = predict_call_data(path, channel, token);

		let answer = self
			.transport
			.request(
				"eth_call",
				json!([
					{
						"to": format!("{relay}"),
						"data": format!("0x{}", hex::encode(data)),
					},
					"latest",
				]),
			)
			.await
			.map_err(|e| ViewError(e.to_string()))?;

		let raw = answer
			.as_str()
			.ok_or_else(|| ViewError(format!("non-string eth_call answer: {answer}")))?;

		let bytes = hex::decode(raw.trim_start_matches("0x"))
			.map_err(|e| ViewError(format!("undecodable eth_call answer: {e}")))?;

		decode_predicted_token(&bytes)
	}
}
