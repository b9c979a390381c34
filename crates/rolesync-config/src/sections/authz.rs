// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization service configuration.

use serde::Deserialize;

use super::{non_empty, parse_base_url};
use crate::error::ConfigError;

const SECTION: &str = "authz";

fn default_audience() -> String {
	"urn:auth0-authz-api".to_string()
}

/// Authorization service configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
	/// API root, without a trailing slash. Roles live at `{base_url}/roles`.
	pub base_url: String,
	/// Audience requested in the client-credentials grant.
	pub audience: String,
}

/// Authorization service configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub audience: Option<String>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.audience.is_some() {
			self.audience = other.audience;
		}
	}

	pub fn finalize(self) -> Result<AuthzConfig, ConfigError> {
		let raw = non_empty(self.base_url, SECTION, "base_url")?;
		Ok(AuthzConfig {
			base_url: parse_base_url("authz.base_url", &raw)?,
			audience: self
				.audience
				.filter(|a| !a.is_empty())
				.unwrap_or_else(default_audience),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn audience_defaults_to_extension_urn() {
		let config = AuthzConfigLayer {
			base_url: Some("https://tenant.webtask.io/abc/api/".to_string()),
			audience: None,
		}
		.finalize()
		.unwrap();
		assert_eq!(config.base_url, "https://tenant.webtask.io/abc/api");
		assert_eq!(config.audience, "urn:auth0-authz-api");
	}

	#[test]
	fn base_url_is_required() {
		let err = AuthzConfigLayer::default().finalize().unwrap_err();
		assert!(err.to_string().contains("authz.base_url"));
	}

	#[test]
	fn rejects_unparseable_base_url() {
		let result = AuthzConfigLayer {
			base_url: Some("not a url".to_string()),
			audience: None,
		}
		.finalize();
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}
}
