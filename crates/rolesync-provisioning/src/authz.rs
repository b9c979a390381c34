// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the authorization service's role endpoints.

use std::sync::Arc;

use rolesync_common_secret::SecretString;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProvisioningError, Service};
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::types::Role;

#[derive(Debug, Deserialize)]
struct RolesResponse {
	roles: Vec<Role>,
}

/// Authorization service client. Every call carries an authz-audience token.
#[derive(Clone)]
pub struct AuthzClient {
	transport: Arc<dyn HttpTransport>,
	base_url: String,
}

impl AuthzClient {
	pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
		Self {
			transport,
			base_url: base_url.into().trim_end_matches('/').to_string(),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn user_roles_url(&self, user_id: &str) -> String {
		format!(
			"{}/users/{}/roles",
			self.base_url,
			urlencoding::encode(user_id)
		)
	}

	/// Full role catalog, in service order.
	#[instrument(skip(self, token))]
	pub async fn list_roles(&self, token: &SecretString) -> Result<Vec<Role>, ProvisioningError> {
		let request = TransportRequest::get(format!("{}/roles", self.base_url)).bearer(token);
		let response = self.send(request, "list roles").await?;

		let parsed: RolesResponse = serde_json::from_value(response.body).map_err(|e| {
			ProvisioningError::invalid_response(Service::Authorization, "list roles", e.to_string())
		})?;
		debug!(count = parsed.roles.len(), "role catalog fetched");
		Ok(parsed.roles)
	}

	#[instrument(skip(self, token))]
	pub async fn get_user_roles(
		&self,
		user_id: &str,
		token: &SecretString,
	) -> Result<Vec<Role>, ProvisioningError> {
		let request = TransportRequest::get(self.user_roles_url(user_id)).bearer(token);
		let response = self.send(request, "get user roles").await?;

		let roles: Vec<Role> = serde_json::from_value(response.body).map_err(|e| {
			ProvisioningError::invalid_response(
				Service::Authorization,
				"get user roles",
				e.to_string(),
			)
		})?;
		debug!(count = roles.len(), "current roles fetched");
		Ok(roles)
	}

	/// Remove the given roles. Sends nothing when `role_ids` is empty.
	#[instrument(skip(self, token))]
	pub async fn remove_user_roles(
		&self,
		user_id: &str,
		role_ids: &[String],
		token: &SecretString,
	) -> Result<(), ProvisioningError> {
		if role_ids.is_empty() {
			debug!("no roles to remove");
			return Ok(());
		}
		let request = TransportRequest::delete(self.user_roles_url(user_id))
			.bearer(token)
			.json(json!(role_ids));
		self.send(request, "remove user roles").await?;
		info!(count = role_ids.len(), "roles removed");
		Ok(())
	}

	/// Assign the given roles. Sends nothing when `role_ids` is empty.
	#[instrument(skip(self, token))]
	pub async fn set_user_roles(
		&self,
		user_id: &str,
		role_ids: &[String],
		token: &SecretString,
	) -> Result<(), ProvisioningError> {
		if role_ids.is_empty() {
			debug!("no roles to assign");
			return Ok(());
		}
		let request = TransportRequest::patch(self.user_roles_url(user_id))
			.bearer(token)
			.json(json!(role_ids));
		self.send(request, "set user roles").await?;
		info!(count = role_ids.len(), "roles assigned");
		Ok(())
	}

	async fn send(
		&self,
		request: TransportRequest,
		operation: &'static str,
	) -> Result<TransportResponse, ProvisioningError> {
		let response = self.transport.send(request).await?;
		if !response.is_success() {
			warn!(status = response.status, operation, "authorization service request failed");
			return Err(ProvisioningError::upstream(
				Service::Authorization,
				operation,
				response.status,
				&response.body,
			));
		}
		Ok(response)
	}
}

impl std::fmt::Debug for AuthzClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthzClient")
			.field("base_url", &self.base_url)
			.finish_non_exhaustive()
	}
}
