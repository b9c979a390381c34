// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Missing required setting {key} (set {env_var} or [{section}] in the config file)")]
	Missing {
		key: String,
		section: &'static str,
		env_var: String,
	},

	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("Failed to parse TOML config at {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Validation error: {0}")]
	Validation(String),

	#[error("Secret loading error: {0}")]
	Secret(#[from] crate::env::SecretEnvError),
}

impl ConfigError {
	pub(crate) fn missing(section: &'static str, field: &str) -> Self {
		Self::Missing {
			key: format!("{section}.{field}"),
			section,
			env_var: crate::sources::env_key(section, field),
		}
	}
}
