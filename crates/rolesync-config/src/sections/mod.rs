// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each section has a `*ConfigLayer` (all fields
//! optional, merged across sources) and a resolved `*Config`.

mod authz;
mod broker;
mod connections;
mod credentials;
mod http;
mod logging;

pub use authz::{AuthzConfig, AuthzConfigLayer};
pub use broker::{BrokerConfig, BrokerConfigLayer};
pub use connections::{ConnectionsConfig, ConnectionsConfigLayer};
pub use credentials::{CredentialsConfig, CredentialsConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};

use url::Url;

use crate::error::ConfigError;

pub(crate) fn non_empty(
	value: Option<String>,
	section: &'static str,
	field: &str,
) -> Result<String, ConfigError> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
		.ok_or_else(|| ConfigError::missing(section, field))
}

/// Parse an http(s) base URL and return it without a trailing slash.
pub(crate) fn parse_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
	let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
		key: key.to_string(),
		message: format!("'{raw}' is not a valid URL: {e}"),
	})?;

	if url.scheme() != "https" && url.scheme() != "http" {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("unsupported scheme '{}'", url.scheme()),
		});
	}

	if url.host_str().is_none() {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: "URL must include a host".to_string(),
		});
	}

	Ok(url.as_str().trim_end_matches('/').to_string())
}
