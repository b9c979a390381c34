// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup for hosts embedding the engine.

use rolesync_config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
	#[error("invalid log filter '{directive}': {source}")]
	InvalidFilter {
		directive: String,
		source: tracing_subscriber::filter::ParseError,
	},

	#[error("global tracing subscriber already set: {0}")]
	AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(logging: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}
	EnvFilter::try_new(&logging.level).map_err(|source| LoggingError::InvalidFilter {
		directive: logging.level.clone(),
		source,
	})
}

/// Install the global subscriber.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), LoggingError> {
	let filter = env_filter(logging)?;

	match logging.format {
		LogFormat::Json => tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json())
			.try_init()?,
		LogFormat::Text => tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer())
			.try_init()?,
	}
	Ok(())
}
