//! Configuration loading with environment variable substitution.

use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use ucs_registry::{ChainInfo, ChainRegistry};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Transport settings for the batching JSON-RPC layer.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
	#[serde(default = "default_batch")]
	pub batch: bool,
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	#[serde(default)]
	pub wait_ms: u64,
}

fn default_batch() -> bool {
	true
}

fn default_batch_size() -> usize {
	1000
}

impl Default for RpcConfig {
	fn default() -> Self {
		Self {
			batch: default_batch(),
			batch_size: default_batch_size(),
			wait_ms: 0,
		}
	}
}

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
	/// GraphQL endpoint of the hubble index.
	pub hubble_endpoint: String,
	#[serde(default)]
	pub rpc: RpcConfig,
	#[serde(default)]
	pub chains: Vec<ChainInfo>,
}

impl ClientConfig {
	/// Builds the chain registry from the configured chains, or the
	/// well-known seed when the config lists none.
	pub fn registry(&self) -> ChainRegistry {
		if self.chains.is_empty() {
			return ChainRegistry::well_known();
		}
		let mut registry = ChainRegistry::new();
		for chain in &self.chains {
			registry.insert(chain.clone());
		}
		registry
	}
}

/// Configuration loader with `${VAR}` environment substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self { file_path: None }
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub async fn load(&self) -> Result<ClientConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		info!(path = %file_path, "loading client configuration");
		let content = tokio::fs::read_to_string(file_path).await?;
		Self::from_toml(&content)
	}

	/// Parses a TOML document after substituting `${VAR}` references.
	pub fn from_toml(content: &str) -> Result<ClientConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		let config: ClientConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		validate(&config)?;
		Ok(config)
	}
}

fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();

	let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
	if config.hubble_endpoint.is_empty() {
		return Err(ConfigError::ValidationError(
			"hubble_endpoint must not be empty".to_string(),
		));
	}

	if config.rpc.batch_size == 0 {
		return Err(ConfigError::ValidationError(
			"rpc.batch_size must be at least 1".to_string(),
		));
	}

	for chain in &config.chains {
		if chain.rpc_url.is_empty() {
			return Err(ConfigError::ValidationError(format!(
				"chain {} has an empty rpc_url",
				chain.chain_id
			)));
		}
	}

	Ok(())
}
