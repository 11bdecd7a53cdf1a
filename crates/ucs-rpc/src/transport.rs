//! Batching JSON-RPC HTTP transport.
//!
//! Requests issued through `request` are coalesced by the scheduler into
//! array bodies per debounce window, split at `batch_size`. Responses are
//! matched back to callers by request id before the scheduler's
//! positional fan-out: ids are taken before callers race for the bucket,
//! so the bucket order is not necessarily id order, and servers may
//! answer out of order on top of that.

use crate::scheduler::{BatchFn, BatchScheduler, SchedulerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("http error: {0}")]
	Http(String),

	#[error("rpc error {code}: {message}")]
	Rpc { code: i64, message: String },

	#[error(transparent)]
	Scheduler(#[from] SchedulerError),
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: &'static str,
	pub id: u64,
	pub method: String,
	pub params: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
	pub code: i64,
	pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
	pub id: u64,
	#[serde(default)]
	pub result: Option<serde_json::Value>,
	#[serde(default)]
	pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
	pub url: String,
	/// Coalesce concurrent requests into array bodies.
	pub batch: bool,
	/// Maximum requests per array body before a forced split.
	pub batch_size: usize,
	/// Debounce window for the scheduler.
	pub wait: Duration,
}

impl HttpTransportConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			batch: true,
			batch_size: 1000,
			wait: Duration::ZERO,
		}
	}
}

/// Posts one JSON-RPC array per flushed bucket.
struct HttpBatchFn {
	http: reqwest::Client,
	url: String,
}

#[async_trait]
impl BatchFn<JsonRpcRequest, JsonRpcResponse> for HttpBatchFn {
	async fn call(&self, batch: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>, String> {
		debug!(url = %self.url, size = batch.len(), "posting rpc batch");

		let response = self
			.http
			.post(&self.url)
			.json(&batch)
			.send()
			.await
			.map_err(|e| e.to_string())?;

		let status = response.status();
		if !status.is_success() {
			return Err(format!("rpc endpoint returned status {status}"));
		}

		let responses: Vec<JsonRpcResponse> =
			response.json().await.map_err(|e| e.to_string())?;
		align_by_id(&batch, responses)
	}
}

/// Reorders raw responses into the request order of the batch, matching
/// on ids. Positional fan-out hands each waiter the result at its own
/// bucket index, so every response must sit at its request's index; a
/// response the server dropped is an error for the whole batch.
fn align_by_id(
	batch: &[JsonRpcRequest],
	responses: Vec<JsonRpcResponse>,
) -> Result<Vec<JsonRpcResponse>, String> {
	let mut by_id: HashMap<u64, JsonRpcResponse> =
		responses.into_iter().map(|r| (r.id, r)).collect();

	batch
		.iter()
		.map(|request| {
			by_id
				.remove(&request.id)
				.ok_or_else(|| format!("no response for request id {}", request.id))
		})
		.collect()
}

/// JSON-RPC over HTTP with transparent request coalescing.
pub struct HttpTransport {
	url: String,
	http: reqwest::Client,
	scheduler: Option<BatchScheduler<JsonRpcRequest, JsonRpcResponse>>,
	next_id: AtomicU64,
}

impl HttpTransport {
	pub fn new(config: HttpTransportConfig) -> Self {
		let http = reqwest::Client::new();

		let scheduler = config.batch.then(|| {
			let batch_size = config.batch_size;
			BatchScheduler::new(Arc::new(HttpBatchFn {
				http: http.clone(),
				url: config.url.clone(),
			}) as Arc<dyn BatchFn<JsonRpcRequest, JsonRpcResponse>>)
				.with_wait(config.wait)
				.with_split(move |pending, _new| pending.len() >= batch_size)
		});

		Self {
			url: config.url,
			http,
			scheduler,
			next_id: AtomicU64::new(1),
		}
	}

	pub async fn request(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<serde_json::Value, TransportError> {
		let request = JsonRpcRequest {
			jsonrpc: "2.0",
			id: self.next_id.fetch_add(1, Ordering::Relaxed),
			method: method.to_string(),
			params,
		};

		let response = match &self.scheduler {
			Some(scheduler) => scheduler.schedule(&self.url, request).await?.0,
			None => self.single(request).await?,
		};

		if let Some(error) = response.error {
			return Err(TransportError::Rpc {
				code: error.code,
				message: error.message,
			});
		}
		Ok(response.result.unwrap_or(serde_json::Value::Null))
	}

	async fn single(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
		let response = self
			.http
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.map_err(|e| TransportError::Http(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(TransportError::Http(format!(
				"rpc endpoint returned status {status}"
			)));
		}

		response
			.json()
			.await
			.map_err(|e| TransportError::Http(e.to_string()))
	}
}
