// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity broker (tenant) configuration: where tokens are minted and where
//! the management API lives.

use rolesync_common_secret::SecretString;
use serde::Deserialize;

use super::{non_empty, parse_base_url};
use crate::error::ConfigError;

const SECTION: &str = "broker";

/// Identity broker configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct BrokerConfig {
	/// Tenant domain, e.g. `example.eu.auth0.com`.
	pub domain: String,
	pub client_id: String,
	pub client_secret: SecretString,
	/// Origin used for HTTP calls. Defaults to `https://{domain}`; overridden in
	/// tests and behind egress proxies. Never ends with `/`.
	pub base_url: String,
}

impl BrokerConfig {
	/// Client-credentials token endpoint.
	pub fn token_url(&self) -> String {
		format!("{}/oauth/token", self.base_url)
	}

	/// Root of the management API (users live under `{root}/users`).
	pub fn management_api_url(&self) -> String {
		format!("{}/api/v2", self.base_url)
	}

	/// Audience requested for management API tokens.
	///
	/// Derived from the tenant domain, never from `base_url`: it must equal the
	/// tenant's registered API identifier.
	pub fn management_audience(&self) -> String {
		format!("https://{}/api/v2/", self.domain)
	}
}

/// Identity broker configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerConfigLayer {
	#[serde(default)]
	pub domain: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub base_url: Option<String>,
	/// Only ever populated from the environment.
	#[serde(skip)]
	pub client_secret: Option<SecretString>,
}

impl BrokerConfigLayer {
	pub fn merge(&mut self, other: BrokerConfigLayer) {
		if other.domain.is_some() {
			self.domain = other.domain;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
	}

	pub fn finalize(self) -> Result<BrokerConfig, ConfigError> {
		let domain = non_empty(self.domain, SECTION, "domain")?;
		let domain = domain.trim_end_matches('/').to_string();
		if domain.contains("://") || domain.contains('/') {
			return Err(ConfigError::InvalidValue {
				key: "broker.domain".to_string(),
				message: format!("expected a bare host name, got '{domain}'"),
			});
		}

		let client_id = non_empty(self.client_id, SECTION, "client_id")?;

		let client_secret = match self.client_secret {
			Some(secret) if !secret.is_empty() => secret,
			_ => return Err(ConfigError::missing(SECTION, "client_secret")),
		};

		let base_url = match self.base_url {
			Some(raw) => parse_base_url("broker.base_url", &raw)?,
			None => format!("https://{domain}"),
		};

		Ok(BrokerConfig {
			domain,
			client_id,
			client_secret,
			base_url,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn complete_layer() -> BrokerConfigLayer {
		BrokerConfigLayer {
			domain: Some("tenant.example.com".to_string()),
			client_id: Some("client-123".to_string()),
			base_url: None,
			client_secret: Some(SecretString::new("shh".to_string())),
		}
	}

	#[test]
	fn derives_urls_from_domain() {
		let config = complete_layer().finalize().unwrap();
		assert_eq!(config.base_url, "https://tenant.example.com");
		assert_eq!(config.token_url(), "https://tenant.example.com/oauth/token");
		assert_eq!(
			config.management_api_url(),
			"https://tenant.example.com/api/v2"
		);
		assert_eq!(
			config.management_audience(),
			"https://tenant.example.com/api/v2/"
		);
	}

	#[test]
	fn base_url_override_keeps_domain_audience() {
		let layer = BrokerConfigLayer {
			base_url: Some("http://127.0.0.1:4010/".to_string()),
			..complete_layer()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.token_url(), "http://127.0.0.1:4010/oauth/token");
		assert_eq!(
			config.management_audience(),
			"https://tenant.example.com/api/v2/"
		);
	}

	#[test]
	fn missing_secret_is_reported() {
		let layer = BrokerConfigLayer {
			client_secret: None,
			..complete_layer()
		};
		let err = layer.finalize().unwrap_err();
		assert!(err.to_string().contains("ROLESYNC_BROKER_CLIENT_SECRET"));
	}

	#[test]
	fn domain_with_scheme_is_rejected() {
		let layer = BrokerConfigLayer {
			domain: Some("https://tenant.example.com".to_string()),
			..complete_layer()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn merge_keeps_secret_from_env_layer() {
		let mut base = BrokerConfigLayer {
			client_secret: None,
			..complete_layer()
		};
		base.merge(BrokerConfigLayer {
			client_secret: Some(SecretString::new("from-env".to_string())),
			..Default::default()
		});
		assert_eq!(base.client_secret.unwrap().expose(), "from-env");
		assert_eq!(base.client_id.as_deref(), Some("client-123"));
	}
}
