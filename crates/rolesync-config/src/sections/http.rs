// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound HTTP configuration.

use std::time::Duration;

use serde::Deserialize;

/// Outbound HTTP configuration (runtime, fully resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
	pub timeout: Duration,
	pub connect_timeout: Duration,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(30),
			connect_timeout: Duration::from_secs(10),
		}
	}
}

/// Outbound HTTP configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfigLayer {
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub connect_timeout_secs: Option<u64>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		let defaults = HttpConfig::default();
		HttpConfig {
			timeout: self
				.timeout_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.timeout),
			connect_timeout: self
				.connect_timeout_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.connect_timeout),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let config = HttpConfigLayer::default().finalize();
		assert_eq!(config, HttpConfig::default());
	}

	#[test]
	fn overrides_timeout_only() {
		let config = HttpConfigLayer {
			timeout_secs: Some(5),
			connect_timeout_secs: None,
		}
		.finalize();
		assert_eq!(config.timeout, Duration::from_secs(5));
		assert_eq!(config.connect_timeout, Duration::from_secs(10));
	}
}
