// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the canonical user store (management API).

use std::sync::Arc;

use rolesync_common_secret::SecretString;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::{ProvisioningError, Service};
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::types::User;

/// User store client. Every call carries a management-audience token.
#[derive(Clone)]
pub struct UserDirectoryClient {
	transport: Arc<dyn HttpTransport>,
	api_url: String,
}

impl UserDirectoryClient {
	/// `api_url` is the management API root, e.g. `https://tenant/api/v2`.
	pub fn new(transport: Arc<dyn HttpTransport>, api_url: impl Into<String>) -> Self {
		Self {
			transport,
			api_url: api_url.into().trim_end_matches('/').to_string(),
		}
	}

	fn user_url(&self, user_id: &str) -> String {
		format!("{}/users/{}", self.api_url, urlencoding::encode(user_id))
	}

	/// Exact-match search on connection and email.
	#[instrument(skip(self, token))]
	pub async fn find_users_by_connection_and_email(
		&self,
		connection: &str,
		email: &str,
		token: &SecretString,
	) -> Result<Vec<User>, ProvisioningError> {
		let request = TransportRequest::get(format!("{}/users", self.api_url))
			.bearer(token)
			.query("search_engine", "v3")
			.query("q", search_query(connection, email));
		let response = self.send(request, "find users").await?;

		let users: Vec<User> = serde_json::from_value(response.body).map_err(|e| {
			ProvisioningError::invalid_response(Service::UserDirectory, "find users", e.to_string())
		})?;
		debug!(count = users.len(), "user search completed");
		Ok(users)
	}

	#[instrument(skip(self, token))]
	pub async fn delete_user(
		&self,
		user_id: &str,
		token: &SecretString,
	) -> Result<(), ProvisioningError> {
		let request = TransportRequest::delete(self.user_url(user_id)).bearer(token);
		self.send(request, "delete user").await?;
		info!("user deleted");
		Ok(())
	}

	/// Merge `app_metadata` into the stored user's metadata. A `null` value
	/// deletes that key.
	#[instrument(skip(self, app_metadata, token))]
	pub async fn patch_user_app_metadata(
		&self,
		user_id: &str,
		app_metadata: Map<String, Value>,
		token: &SecretString,
	) -> Result<(), ProvisioningError> {
		let request = TransportRequest::patch(self.user_url(user_id))
			.bearer(token)
			.json(json!({ "app_metadata": app_metadata }));
		self.send(request, "patch user app_metadata").await?;
		info!("user app_metadata patched");
		Ok(())
	}

	async fn send(
		&self,
		request: TransportRequest,
		operation: &'static str,
	) -> Result<TransportResponse, ProvisioningError> {
		let response = self.transport.send(request).await?;
		if !response.is_success() {
			warn!(status = response.status, operation, "user directory request failed");
			return Err(ProvisioningError::upstream(
				Service::UserDirectory,
				operation,
				response.status,
				&response.body,
			));
		}
		Ok(response)
	}
}

impl std::fmt::Debug for UserDirectoryClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UserDirectoryClient")
			.field("api_url", &self.api_url)
			.finish_non_exhaustive()
	}
}

fn search_query(connection: &str, email: &str) -> String {
	format!(
		r#"connection:"{}" AND email:"{}""#,
		escape_term(connection),
		escape_term(email)
	)
}

fn escape_term(term: &str) -> String {
	term.replace('\\', "\\\\").replace('"', "\\\"")
}
