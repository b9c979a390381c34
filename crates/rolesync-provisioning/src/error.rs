// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for reconciliation and membership listing.

use std::fmt;

use thiserror::Error;

/// Remote party a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
	/// The broker's OAuth token endpoint.
	TokenEndpoint,
	/// The authorization service (roles and role assignments).
	Authorization,
	/// The canonical user store (management API).
	UserDirectory,
}

impl fmt::Display for Service {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Service::TokenEndpoint => f.write_str("token endpoint"),
			Service::Authorization => f.write_str("authorization service"),
			Service::UserDirectory => f.write_str("user directory"),
		}
	}
}

/// Failure of the HTTP collaborator itself: no status code was received.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("request to {url} timed out")]
	Timeout { url: String },

	#[error("request to {url} failed: {message}")]
	Request { url: String, message: String },

	#[error("failed to build HTTP client: {0}")]
	Client(String),
}

impl TransportError {
	pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
		if err.is_timeout() {
			TransportError::Timeout {
				url: url.to_string(),
			}
		} else {
			TransportError::Request {
				url: url.to_string(),
				message: err.to_string(),
			}
		}
	}
}

/// Coarse classification of a [`ProvisioningError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// The client-credentials grant was rejected.
	Authentication,
	/// A remote service answered with a non-2xx status.
	UpstreamRequest,
	/// Provisioned data cannot be mapped onto the role directory.
	DataIntegrity,
	/// The request never produced a response.
	Transport,
	/// A 2xx response carried a body of the wrong shape.
	InvalidResponse,
}

/// Errors that abort a reconciliation or a membership listing.
///
/// Nothing is rolled back when one of these is returned. Retrying the same
/// event is safe: role removal always precedes assignment and the provisioned
/// data is only discarded after assignment succeeded.
#[derive(Debug, Error)]
pub enum ProvisioningError {
	#[error("client credentials grant for audience {audience} failed with status {status}: {message}")]
	Authentication {
		audience: String,
		status: u16,
		message: String,
	},

	#[error("{service} {operation} failed with status {status}: {body}")]
	Upstream {
		service: Service,
		operation: &'static str,
		status: u16,
		body: String,
	},

	#[error("membership '{membership}' does not match any role in the directory")]
	UnknownMembership { membership: String },

	#[error("memberships on user {user_id} are malformed: {message}")]
	MalformedMemberships { user_id: String, message: String },

	#[error("invalid response from {service} {operation}: {message}")]
	InvalidResponse {
		service: Service,
		operation: &'static str,
		message: String,
	},

	#[error(transparent)]
	Transport(#[from] TransportError),
}

impl ProvisioningError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ProvisioningError::Authentication { .. } => ErrorKind::Authentication,
			ProvisioningError::Upstream { .. } => ErrorKind::UpstreamRequest,
			ProvisioningError::UnknownMembership { .. }
			| ProvisioningError::MalformedMemberships { .. } => ErrorKind::DataIntegrity,
			ProvisioningError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
			ProvisioningError::Transport(_) => ErrorKind::Transport,
		}
	}

	pub(crate) fn upstream(
		service: Service,
		operation: &'static str,
		status: u16,
		body: &serde_json::Value,
	) -> Self {
		Self::Upstream {
			service,
			operation,
			status,
			body: body_excerpt(body),
		}
	}

	pub(crate) fn invalid_response(
		service: Service,
		operation: &'static str,
		message: impl Into<String>,
	) -> Self {
		Self::InvalidResponse {
			service,
			operation,
			message: message.into(),
		}
	}
}

const BODY_EXCERPT_LIMIT: usize = 512;

/// Render an error body for messages, truncated on a char boundary.
pub(crate) fn body_excerpt(body: &serde_json::Value) -> String {
	let rendered = match body {
		serde_json::Value::String(s) => s.clone(),
		serde_json::Value::Null => String::new(),
		other => other.to_string(),
	};
	if rendered.len() <= BODY_EXCERPT_LIMIT {
		return rendered;
	}
	let mut end = BODY_EXCERPT_LIMIT;
	while !rendered.is_char_boundary(end) {
		end -= 1;
	}
	format!("{}...", &rendered[..end])
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn kinds_follow_taxonomy() {
		let auth = ProvisioningError::Authentication {
			audience: "urn:auth0-authz-api".to_string(),
			status: 401,
			message: "access_denied".to_string(),
		};
		assert_eq!(auth.kind(), ErrorKind::Authentication);

		let upstream = ProvisioningError::upstream(
			Service::Authorization,
			"remove user roles",
			500,
			&json!({"error": "boom"}),
		);
		assert_eq!(upstream.kind(), ErrorKind::UpstreamRequest);

		let unknown = ProvisioningError::UnknownMembership {
			membership: "ghost".to_string(),
		};
		assert_eq!(unknown.kind(), ErrorKind::DataIntegrity);

		let transport = ProvisioningError::from(TransportError::Timeout {
			url: "https://authz.example.com/roles".to_string(),
		});
		assert_eq!(transport.kind(), ErrorKind::Transport);
	}

	#[test]
	fn upstream_display_names_service_and_operation() {
		let err = ProvisioningError::upstream(
			Service::UserDirectory,
			"delete user",
			404,
			&json!("Not Found"),
		);
		assert_eq!(
			err.to_string(),
			"user directory delete user failed with status 404: Not Found"
		);
	}

	#[test]
	fn body_excerpt_truncates_on_char_boundary() {
		let long = "é".repeat(400);
		let excerpt = body_excerpt(&json!(long));
		assert!(excerpt.ends_with("..."));
		assert!(excerpt.len() <= BODY_EXCERPT_LIMIT + 3);
	}
}
