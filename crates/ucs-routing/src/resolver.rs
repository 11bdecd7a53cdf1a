//! Route resolution against the channel-recommendation index.

use crate::hubble::{ChannelRecommendation, IndexError, RouteIndex};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use ucs_types::{ChainId, ForwardHop, RouteDetail, TransferError, TransferType};

/// Port identifiers come back from the index as raw storage values with a
/// fixed-width prefix in front of the actual port string.
const PORT_STORAGE_PREFIX_LEN: usize = 2;

#[derive(Debug, Error)]
pub enum RouteError {
	#[error("no route from {source} to {destination}: {reason}")]
	RouteNotFound {
		source: ChainId,
		destination: ChainId,
		reason: String,
	},

	#[error("malformed port identifier {0:?}")]
	MalformedPort(String),

	#[error(transparent)]
	Index(#[from] IndexError),
}

impl From<RouteError> for TransferError {
	fn from(err: RouteError) -> Self {
		match err {
			RouteError::RouteNotFound {
				source,
				destination,
				reason,
			} => TransferError::RouteNotFound {
				source,
				destination,
				reason,
			},
			RouteError::MalformedPort(port) => {
				TransferError::Encoding(format!("malformed port identifier {port:?}"))
			}
			RouteError::Index(e) => TransferError::Index(e.to_string()),
		}
	}
}

/// Resolves the channel/port/relay-contract tuple for a chain pair.
///
/// Stateless: every call queries the index and produces a fresh
/// `RouteDetail`. Callers on the same-chain fast path must not invoke it
/// at all.
pub struct RouteResolver {
	index: Arc<dyn RouteIndex>,
}

impl RouteResolver {
	pub fn new(index: Arc<dyn RouteIndex>) -> Self {
		Self { index }
	}

	pub async fn resolve_route(
		&self,
		source: &ChainId,
		destination: &ChainId,
	) -> Result<RouteDetail, RouteError> {
		debug_assert_ne!(source, destination, "same-chain transfers have no route");

		let row = self
			.index
			.channel_recommendation(source, destination)
			.await?
			.ok_or_else(|| RouteError::RouteNotFound {
				source: source.clone(),
				destination: destination.clone(),
				reason: "no channel recommendation".to_string(),
			})?;

		let detail = Self::validate(source, destination, row)?;
		debug!(
			%source,
			%destination,
			transfer_type = ?detail.transfer_type,
			channel = %detail.source_channel,
			"route resolved"
		);
		Ok(detail)
	}

	fn validate(
		source: &ChainId,
		destination: &ChainId,
		row: ChannelRecommendation,
	) -> Result<RouteDetail, RouteError> {
		let missing = |field: &str| RouteError::RouteNotFound {
			source: source.clone(),
			destination: destination.clone(),
			reason: format!("index row is missing {field}"),
		};

		let source_port_raw = row.source_port_id.ok_or_else(|| missing("source_port_id"))?;
		let source_channel = row
			.source_channel_id
			.ok_or_else(|| missing("source_channel_id"))?;
		row.source_connection_id
			.ok_or_else(|| missing("source_connection_id"))?;
		let destination_port_raw = row
			.destination_port_id
			.ok_or_else(|| missing("destination_port_id"))?;
		let destination_channel = row
			.destination_channel_id
			.ok_or_else(|| missing("destination_channel_id"))?;
		row.destination_connection_id
			.ok_or_else(|| missing("destination_connection_id"))?;

		let source_port = strip_port_prefix(&source_port_raw)?;
		let destination_port = strip_port_prefix(&destination_port_raw)?;

		let (transfer_type, forward) = match (row.forward_port_id, row.forward_channel_id) {
			(Some(port), Some(channel)) => {
				(TransferType::Pfm, Some(ForwardHop { port, channel }))
			}
			(None, None) => (TransferType::Direct, None),
			_ => {
				return Err(RouteError::RouteNotFound {
					source: source.clone(),
					destination: destination.clone(),
					reason: "incomplete forward leg".to_string(),
				})
			}
		};

		Ok(RouteDetail {
			source_channel,
			destination_channel,
			source_port,
			destination_port,
			relay_contract_address: row.relay_contract_address,
			transfer_type,
			forward,
		})
	}
}

/// Strips the fixed-width storage prefix off a raw port identifier.
/// Identifiers shorter than the prefix are rejected rather than passed
/// through.
fn strip_port_prefix(raw: &str) -> Result<String, RouteError> {
	raw.get(PORT_STORAGE_PREFIX_LEN..)
		.map(str::to_string)
		.ok_or_else(|| RouteError::MalformedPort(raw.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hubble::RouteIndex;
	use async_trait::async_trait;

	struct FixtureIndex {
		row: Option<ChannelRecommendation>,
	}

	#[async_trait]
	impl RouteIndex for FixtureIndex {
		async fn channel_recommendation(
			&self,
			_source: &ChainId,
			_destination: &ChainId,
		) -> Result<Option<ChannelRecommendation>, IndexError> {
			Ok(self.row.clone())
		}
	}

	fn complete_row() -> ChannelRecommendation {
		ChannelRecommendation {
			source_port_id: Some("0xwasm.union1relay".to_string()),
			source_channel_id: Some("channel-7".to_string()),
			source_connection_id: Some("connection-3".to_string()),
			destination_port_id: Some("0xtransfer".to_string()),
			destination_channel_id: Some("channel-41".to_string()),
			destination_connection_id: Some("connection-9".to_string()),
			relay_contract_address: Some("union1relay".to_string()),
			forward_port_id: None,
			forward_channel_id: None,
		}
	}

	fn resolver_with(row: Option<ChannelRecommendation>) -> RouteResolver {
		RouteResolver::new(Arc::new(FixtureIndex { row }))
	}

	#[tokio::test]
	async fn resolves_direct_route_and_strips_port_prefix() {
		let resolver = resolver_with(Some(complete_row()));
		let route = resolver
			.resolve_route(&ChainId::from("union-testnet-8"), &ChainId::from("11155111"))
			.await
			.unwrap();

		assert_eq!(route.source_port, "wasm.union1relay");
		assert_eq!(route.destination_port, "transfer");
		assert_eq!(route.source_channel, "channel-7");
		assert_eq!(route.transfer_type, TransferType::Direct);
		assert!(route.forward.is_none());
	}

	#[tokio::test]
	async fn forward_leg_makes_route_pfm() {
		let mut row = complete_row();
		row.forward_port_id = Some("wasm.contractXYZ".to_string());
		row.forward_channel_id = Some("channel-12".to_string());

		let resolver = resolver_with(Some(row));
		let route = resolver
			.resolve_route(&ChainId::from("a"), &ChainId::from("b"))
			.await
			.unwrap();

		assert_eq!(route.transfer_type, TransferType::Pfm);
		let hop = route.forward.unwrap();
		assert_eq!(hop.port, "wasm.contractXYZ");
		assert_eq!(hop.channel, "channel-12");
	}

	#[tokio::test]
	async fn any_missing_required_field_is_route_not_found() {
		let strip = [
			|r: &mut ChannelRecommendation| r.source_port_id = None,
			|r: &mut ChannelRecommendation| r.source_channel_id = None,
			|r: &mut ChannelRecommendation| r.source_connection_id = None,
			|r: &mut ChannelRecommendation| r.destination_port_id = None,
			|r: &mut ChannelRecommendation| r.destination_channel_id = None,
			|r: &mut ChannelRecommendation| r.destination_connection_id = None,
		];

		for clear in strip {
			let mut row = complete_row();
			clear(&mut row);

			let resolver = resolver_with(Some(row));
			let err = resolver
				.resolve_route(&ChainId::from("a"), &ChainId::from("b"))
				.await
				.unwrap_err();
			assert!(matches!(err, RouteError::RouteNotFound { .. }), "{err}");
		}
	}

	#[tokio::test]
	async fn missing_row_is_route_not_found() {
		let resolver = resolver_with(None);
		let err = resolver
			.resolve_route(&ChainId::from("a"), &ChainId::from("b"))
			.await
			.unwrap_err();
		assert!(matches!(err, RouteError::RouteNotFound { .. }));
	}

	#[tokio::test]
	async fn overlong_prefix_port_is_rejected() {
		let mut row = complete_row();
		row.source_port_id = Some("0".to_string());

		let resolver = resolver_with(Some(row));
		let err = resolver
			.resolve_route(&ChainId::from("a"), &ChainId::from("b"))
			.await
			.unwrap_err();
		assert!(matches!(err, RouteError::MalformedPort(_)));
	}

	#[tokio::test]
	async fn half_specified_forward_leg_is_rejected() {
		let mut row = complete_row();
		row.forward_port_id = Some("wasm.contractXYZ".to_string());

		let resolver = resolver_with(Some(row));
		let err = resolver
			.resolve_route(&ChainId::from("a"), &ChainId::from("b"))
			.await
			.unwrap_err();
		assert!(matches!(err, RouteError::RouteNotFound { .. }));
	}
}
