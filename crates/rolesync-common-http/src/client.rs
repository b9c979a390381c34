// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

/// Request and connect bounds applied to every outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
	pub request: Duration,
	pub connect: Duration,
}

impl Default for Timeouts {
	fn default() -> Self {
		Self {
			request: Duration::from_secs(30),
			connect: Duration::from_secs(10),
		}
	}
}

/// Client builder carrying the standard rolesync User-Agent.
///
/// Use this when a caller needs options beyond [`Timeouts`].
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Build a client with the standard User-Agent and the given timeouts.
pub fn client_with_timeouts(timeouts: Timeouts) -> Result<Client, reqwest::Error> {
	debug!(
		request_timeout_ms = timeouts.request.as_millis() as u64,
		connect_timeout_ms = timeouts.connect.as_millis() as u64,
		"building HTTP client"
	);
	builder()
		.timeout(timeouts.request)
		.connect_timeout(timeouts.connect)
		.build()
}

/// `rolesync/{version}`
pub fn user_agent() -> String {
	format!("rolesync/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_name_and_version() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "rolesync");
		assert!(!parts[1].is_empty());
	}

	#[test]
	fn default_timeouts_are_bounded() {
		let timeouts = Timeouts::default();
		assert_eq!(timeouts.request, Duration::from_secs(30));
		assert!(timeouts.connect < timeouts.request);
	}

	#[test]
	fn builds_client_with_custom_timeouts() {
		let client = client_with_timeouts(Timeouts {
			request: Duration::from_millis(500),
			connect: Duration::from_millis(100),
		});
		assert!(client.is_ok());
	}
}
