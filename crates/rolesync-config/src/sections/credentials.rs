// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access token caching policy.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Access token caching policy (runtime, fully resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialsConfig {
	/// Upper bound on how long a token pair is reused. `None` trusts the
	/// `expires_in` reported by the broker, or keeps the pair for the session
	/// lifetime when the broker reports none.
	pub token_ttl: Option<Duration>,
	/// Subtracted from the lifetime so a token is never used right at expiry.
	pub expiry_skew: Duration,
}

impl Default for CredentialsConfig {
	fn default() -> Self {
		Self {
			token_ttl: None,
			expiry_skew: Duration::from_secs(60),
		}
	}
}

/// Token caching layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfigLayer {
	#[serde(default)]
	pub token_ttl_secs: Option<u64>,
	#[serde(default)]
	pub expiry_skew_secs: Option<u64>,
}

impl CredentialsConfigLayer {
	pub fn merge(&mut self, other: CredentialsConfigLayer) {
		if other.token_ttl_secs.is_some() {
			self.token_ttl_secs = other.token_ttl_secs;
		}
		if other.expiry_skew_secs.is_some() {
			self.expiry_skew_secs = other.expiry_skew_secs;
		}
	}

	pub fn finalize(self) -> Result<CredentialsConfig, ConfigError> {
		let config = CredentialsConfig {
			token_ttl: self.token_ttl_secs.map(Duration::from_secs),
			expiry_skew: self
				.expiry_skew_secs
				.map(Duration::from_secs)
				.unwrap_or(CredentialsConfig::default().expiry_skew),
		};
		if let Some(ttl) = config.token_ttl {
			if ttl <= config.expiry_skew {
				return Err(ConfigError::InvalidValue {
					key: "credentials.token_ttl_secs".to_string(),
					message: format!(
						"must be greater than expiry_skew_secs ({})",
						config.expiry_skew.as_secs()
					),
				});
			}
		}
		Ok(config)
	}
}
