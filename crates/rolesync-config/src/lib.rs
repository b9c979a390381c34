// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the rolesync provisioning engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe resolved configuration with validation
//! - Consistent environment variable naming (`ROLESYNC_*`)
//! - `VAR` / `VAR_FILE` secret loading for the broker client secret
//!
//! # Usage
//!
//! ```ignore
//! use rolesync_config::load_config;
//!
//! let config = load_config()?;
//! println!("reconciling against {}", config.broker.domain);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, load_secret_with, SecretEnvError};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use rolesync_common_secret::{Secret, SecretString};
pub use sections::*;
pub use sources::{
	env_key, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, ENV_PREFIX,
	SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct RoleSyncConfig {
	pub broker: BrokerConfig,
	pub authz: AuthzConfig,
	pub connections: ConnectionsConfig,
	pub http: HttpConfig,
	pub credentials: CredentialsConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`ROLESYNC_*`)
/// 2. Config file (`/etc/rolesync/rolesync.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<RoleSyncConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<RoleSyncConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource::new())])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<RoleSyncConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<RoleSyncConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: ConfigLayer) -> Result<RoleSyncConfig, ConfigError> {
	let broker = layer.broker.unwrap_or_default().finalize()?;
	let authz = layer.authz.unwrap_or_default().finalize()?;
	let connections = layer.connections.unwrap_or_default().finalize()?;
	let http = layer.http.unwrap_or_default().finalize();
	let credentials = layer.credentials.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		domain = %broker.domain,
		client_id = %broker.client_id,
		authz_base_url = %authz.base_url,
		federated = connections.federated.len(),
		in_place = connections.in_place.len(),
		provisioned = %connections.provisioned,
		token_ttl_secs = credentials.token_ttl.map(|d| d.as_secs()),
		"rolesync configuration loaded"
	);

	Ok(RoleSyncConfig {
		broker,
		authz,
		connections,
		http,
		credentials,
		logging,
	})
}
