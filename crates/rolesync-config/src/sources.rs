// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::env::load_secret_with;
use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::sections::{
	AuthzConfigLayer, BrokerConfigLayer, ConnectionsConfigLayer, CredentialsConfigLayer,
	HttpConfigLayer, LogFormat, LoggingConfigLayer,
};

/// Prefix shared by every environment variable.
pub const ENV_PREFIX: &str = "ROLESYNC";

/// Default config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rolesync/rolesync.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// `ROLESYNC_<SECTION>_<FIELD>`
pub fn env_key(section: &str, field: &str) -> String {
	format!(
		"{ENV_PREFIX}_{}_{}",
		section.to_ascii_uppercase(),
		field.to_ascii_uppercase()
	)
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: `ROLESYNC_<SECTION>_<FIELD>`. Lists are comma separated. The
/// broker client secret is read from `ROLESYNC_BROKER_CLIENT_SECRET` or the
/// file named by `ROLESYNC_BROKER_CLIENT_SECRET_FILE`.
pub struct EnvSource {
	lookup: Lookup,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self::with_lookup(|name| std::env::var(name).ok())
	}

	/// Read through a custom lookup (tests, embedding hosts with their own
	/// settings store).
	pub fn with_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			lookup: Arc::new(lookup),
		}
	}

	fn var(&self, section: &str, field: &str) -> Option<String> {
		(self.lookup)(&env_key(section, field)).filter(|s| !s.is_empty())
	}

	fn list(&self, section: &str, field: &str) -> Option<Vec<String>> {
		self.var(section, field).map(|raw| {
			raw.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}

	fn parsed<T: FromStr>(&self, section: &str, field: &str) -> Result<Option<T>, ConfigError>
	where
		T::Err: std::fmt::Display,
	{
		match self.var(section, field) {
			Some(raw) => raw
				.parse()
				.map(Some)
				.map_err(|e: T::Err| ConfigError::InvalidValue {
					key: env_key(section, field),
					message: e.to_string(),
				}),
			None => Ok(None),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let client_secret =
			load_secret_with(&env_key("broker", "client_secret"), |name| (self.lookup)(name))?;

		Ok(ConfigLayer {
			broker: Some(BrokerConfigLayer {
				domain: self.var("broker", "domain"),
				client_id: self.var("broker", "client_id"),
				base_url: self.var("broker", "base_url"),
				client_secret,
			}),
			authz: Some(AuthzConfigLayer {
				base_url: self.var("authz", "base_url"),
				audience: self.var("authz", "audience"),
			}),
			connections: Some(ConnectionsConfigLayer {
				federated: self.list("connections", "federated"),
				in_place: self.list("connections", "in_place"),
				provisioned: self.var("connections", "provisioned"),
			}),
			http: Some(HttpConfigLayer {
				timeout_secs: self.parsed("http", "timeout_secs")?,
				connect_timeout_secs: self.parsed("http", "connect_timeout_secs")?,
			}),
			credentials: Some(CredentialsConfigLayer {
				token_ttl_secs: self.parsed("credentials", "token_ttl_secs")?,
				expiry_skew_secs: self.parsed("credentials", "expiry_skew_secs")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: self.var("logging", "level"),
				format: self.parsed::<LogFormat>("logging", "format")?,
			}),
		})
	}
}
