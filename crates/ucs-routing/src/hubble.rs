//! Client for the hubble offchain index.
//!
//! Hubble indexes IBC channel state and token wrappings across the
//! supported chains. The core consumes two read surfaces: channel
//! recommendations for a chain pair, and token-wrapping rows for the
//! quote-token lookup. Both are exposed as capability traits so the
//! resolvers can be exercised against in-memory fixtures.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use ucs_types::ChainId;

#[derive(Debug, Error)]
pub enum IndexError {
	#[error("index request failed: {0}")]
	Request(String),

	#[error("malformed index response: {0}")]
	Malformed(String),
}

/// One channel-recommendation row as stored by the index.
///
/// Every field is optional on the wire; the route resolver decides which
/// ones are required. The forward leg is present only for pairs that are
/// reachable through an intermediate chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelRecommendation {
	pub source_port_id: Option<String>,
	pub source_channel_id: Option<String>,
	pub source_connection_id: Option<String>,
	pub destination_port_id: Option<String>,
	pub destination_channel_id: Option<String>,
	pub destination_connection_id: Option<String>,
	pub relay_contract_address: Option<String>,
	pub forward_port_id: Option<String>,
	pub forward_channel_id: Option<String>,
}

/// One token-wrapping row: `base_token` on the queried chain is a wrapped
/// form of `unwrapped_address_hex` on `unwrapped_chain_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct WrappingRow {
	pub unwrapped_address_hex: String,
	pub unwrapped_chain_id: String,
}

/// Read capability for channel recommendations.
#[async_trait]
pub trait RouteIndex: Send + Sync {
	async fn channel_recommendation(
		&self,
		source: &ChainId,
		destination: &ChainId,
	) -> Result<Option<ChannelRecommendation>, IndexError>;
}

/// Read capability for token wrappings, keyed by the unwrap direction:
/// `base_token` must be a denom on `source`, and the wrapping's
/// destination channel must equal `destination_channel`.
#[async_trait]
pub trait TokenIndex: Send + Sync {
	async fn wrappings(
		&self,
		source: &ChainId,
		base_token: &str,
		destination_channel: &str,
	) -> Result<Vec<WrappingRow>, IndexError>;
}

const CHANNEL_RECOMMENDATION_QUERY: &str = r#"
query ChannelRecommendation($source_chain_id: String!, $destination_chain_id: String!) {
  v1_ibc_union_channel_recommendations(
    where: {
      _and: [
        { source_chain_id: { _eq: $source_chain_id } }
        { destination_chain_id: { _eq: $destination_chain_id } }
      ]
    }
    limit: 1
  ) {
    source_port_id
    source_channel_id
    source_connection_id
    destination_port_id
    destination_channel_id
    destination_connection_id
    relay_contract_address
    forward_port_id
    forward_channel_id
  }
}
"#;

const TOKEN_WRAPPING_QUERY: &str = r#"
query TokenWrapping($source_chain_id: String!, $denom: String!, $destination_channel_id: String!) {
  v1_ibc_union_tokens(
    where: {
      _and: [
        { chain: { chain_id: { _eq: $source_chain_id } } }
        { denom: { _eq: $denom } }
        { wrapping: { destination_channel_id: { _eq: $destination_channel_id } } }
      ]
    }
  ) {
    wrapping {
      unwrapped_address_hex
      unwrapped_chain_id
    }
  }
}
"#;

/// HTTP client for a hubble GraphQL endpoint.
pub struct HubbleClient {
	endpoint: String,
	http: reqwest::Client,
}

impl HubbleClient {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			http: reqwest::Client::new(),
		}
	}

	async fn query(
		&self,
		query: &str,
		variables: serde_json::Value,
	) -> Result<serde_json::Value, IndexError> {
		let body = json!({ "query": query, "variables": variables });

		let response = self
			.http
			.post(&self.endpoint)
			.json(&body)
			.send()
			.await
			.map_err(|e| IndexError::Request(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(IndexError::Request(format!(
				"index returned status {status}"
			)));
		}

		let payload: serde_json::Value = response
			.json()
			.await
			.map_err(|e| IndexError::Malformed(e.to_string()))?;

		if let Some(errors) = payload.get("errors") {
			return Err(IndexError::Request(errors.to_string()));
		}

		payload
			.get("data")
			.cloned()
			.ok_or_else(|| IndexError::Malformed("response has no data field".to_string()))
	}
}

#[async_trait]
impl RouteIndex for HubbleClient {
	async fn channel_recommendation(
		&self,
		source: &ChainId,
		destination: &ChainId,
	) -> Result<Option<ChannelRecommendation>, IndexError> {
		debug!(%source, %destination, "querying channel recommendation");

		let data = self
			.query(
				CHANNEL_RECOMMENDATION_QUERY,
				json!({
					"source_chain_id": source.as_str(),
					"destination_chain_id": destination.as_str(),
				}),
			)
			.await?;

		let rows = data
			.get("v1_ibc_union_channel_recommendations")
			.and_then(|v| v.as_array())
			.ok_or_else(|| {
				IndexError::Malformed("missing channel recommendation rows".to_string())
			})?;

		match rows.first() {
			Some(row) => serde_json::from_value(row.clone())
				.map(Some)
				.map_err(|e| IndexError::Malformed(e.to_string())),
			None => Ok(None),
		}
	}
}

#[async_trait]
impl TokenIndex for HubbleClient {
	async fn wrappings(
		&self,
		source: &ChainId,
		base_token: &str,
		destination_channel: &str,
	) -> Result<Vec<WrappingRow>, IndexError> {
		debug!(%source, base_token, destination_channel, "querying token wrappings");

		let data = self
			.query(
				TOKEN_WRAPPING_QUERY,
				json!({
					"source_chain_id": source.as_str(),
					"denom": base_token,
					"destination_channel_id": destination_channel,
				}),
			)
			.await?;

		let rows = data
			.get("v1_ibc_union_tokens")
			.and_then(|v| v.as_array())
			.ok_or_else(|| IndexError::Malformed("missing token rows".to_string()))?;

		rows.iter()
			.filter_map(|row| row.get("wrapping").cloned())
			.map(|wrapping| {
				serde_json::from_value(wrapping).map_err(|e| IndexError::Malformed(e.to_string()))
			})
			.collect()
	}
}
