// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory tenant used by unit tests.
//!
//! [`RecordingTransport`] records every request and answers from a small
//! simulation of the token endpoint, the authorization service and the user
//! store. Individual routes can be overridden to inject failures.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rolesync_config::{
	AuthzConfig, BrokerConfig, ConnectionsConfig, CredentialsConfig, HttpConfig, LoggingConfig,
	RoleSyncConfig,
};
use rolesync_common_secret::SecretString;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::types::{Role, User};

pub const TENANT_HOST: &str = "tenant.example.com";
pub const AUTHZ_HOST: &str = "authz.example.com";
pub const FEDERATED: &str = "corp-saml";
pub const IN_PLACE: &str = "Username-Password-Authentication";
pub const PROVISIONED: &str = "provisioned-users";

pub fn broker_config() -> BrokerConfig {
	BrokerConfig {
		domain: TENANT_HOST.to_string(),
		client_id: "client-123".to_string(),
		client_secret: SecretString::new("client-secret".to_string()),
		base_url: format!("https://{TENANT_HOST}"),
	}
}

pub fn config() -> RoleSyncConfig {
	RoleSyncConfig {
		broker: broker_config(),
		authz: AuthzConfig {
			base_url: format!("https://{AUTHZ_HOST}"),
			audience: "urn:auth0-authz-api".to_string(),
		},
		connections: ConnectionsConfig {
			federated: BTreeSet::from([FEDERATED.to_string()]),
			in_place: BTreeSet::from([IN_PLACE.to_string()]),
			provisioned: PROVISIONED.to_string(),
		},
		http: HttpConfig::default(),
		credentials: CredentialsConfig::default(),
		logging: LoggingConfig::default(),
	}
}

pub fn role(id: &str, name: &str) -> Role {
	Role {
		id: id.to_string(),
		name: name.to_string(),
		description: None,
		application_id: None,
		application_type: None,
	}
}

#[derive(Default)]
struct TenantState {
	catalog: Vec<Role>,
	assignments: HashMap<String, Vec<String>>,
	users: Vec<(String, User)>,
	overrides: HashMap<(String, String), (u16, Value)>,
	requests: Vec<TransportRequest>,
}

#[derive(Default)]
pub struct RecordingTransport {
	state: Mutex<TenantState>,
}

impl RecordingTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serve the simulated token endpoint again after an override.
	pub fn grant_tokens(&self) {
		self.clear_override("POST", "/oauth/token");
	}

	pub fn clear_override(&self, method: &str, path: &str) {
		self.state()
			.overrides
			.remove(&(method.to_string(), path.to_string()));
	}

	/// Answer `method path` with a fixed response instead of the simulation.
	pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
		self.state()
			.overrides
			.insert((method.to_string(), path.to_string()), (status, body));
	}

	pub fn with_catalog(self, roles: Vec<Role>) -> Self {
		self.state().catalog = roles;
		self
	}

	pub fn with_assignment(self, user_id: &str, role_ids: &[&str]) -> Self {
		self.state().assignments.insert(
			user_id.to_string(),
			role_ids.iter().map(|s| s.to_string()).collect(),
		);
		self
	}

	pub fn with_user(self, connection: &str, user: User) -> Self {
		self.state().users.push((connection.to_string(), user));
		self
	}

	pub fn assigned(&self, user_id: &str) -> Vec<String> {
		self.state()
			.assignments
			.get(user_id)
			.cloned()
			.unwrap_or_default()
	}

	pub fn user_exists(&self, user_id: &str) -> bool {
		self.state().users.iter().any(|(_, u)| u.user_id == user_id)
	}

	pub fn stored_user(&self, user_id: &str) -> Option<User> {
		self.state()
			.users
			.iter()
			.find(|(_, u)| u.user_id == user_id)
			.map(|(_, u)| u.clone())
	}

	pub fn requests(&self) -> Vec<TransportRequest> {
		self.state().requests.clone()
	}

	pub fn requests_to(&self, path: &str) -> Vec<TransportRequest> {
		self.requests()
			.into_iter()
			.filter(|r| split_url(&r.url).1 == path)
			.collect()
	}

	/// `METHOD path` for every recorded request, grants excluded.
	pub fn calls(&self) -> Vec<String> {
		self.requests()
			.iter()
			.map(|r| format!("{} {}", r.method, split_url(&r.url).1))
			.filter(|call| call != "POST /oauth/token")
			.collect()
	}

	fn state(&self) -> std::sync::MutexGuard<'_, TenantState> {
		self.state.lock().unwrap()
	}
}

#[async_trait]
impl HttpTransport for RecordingTransport {
	async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		let mut guard = self.state();
		let state = &mut *guard;
		state.requests.push(request.clone());

		let (host, path) = split_url(&request.url);
		let method = request.method.to_string();
		if let Some((status, body)) = state.overrides.get(&(method.clone(), path.clone())) {
			return Ok(TransportResponse::new(*status, body.clone()));
		}

		let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
		let body = request.json.clone().unwrap_or(Value::Null);
		let response = match (host.as_str(), method.as_str(), segments.as_slice()) {
			(TENANT_HOST, "POST", ["oauth", "token"]) => {
				let token = if body["audience"] == json!("urn:auth0-authz-api") {
					"authz-token"
				} else {
					"management-token"
				};
				TransportResponse::new(
					200,
					json!({"access_token": token, "token_type": "Bearer", "expires_in": 86400}),
				)
			}
			(AUTHZ_HOST, "GET", ["roles"]) => {
				TransportResponse::new(200, json!({"roles": state.catalog}))
			}
			(AUTHZ_HOST, method, ["users", id, "roles"]) => {
				let id = decode(id);
				let ids: Vec<String> = serde_json::from_value(body).unwrap_or_default();
				let held = state.assignments.entry(id).or_default();
				match method {
					"GET" => {
						let roles: Vec<&Role> =
							state.catalog.iter().filter(|r| held.contains(&r.id)).collect();
						TransportResponse::new(200, json!(roles))
					}
					"DELETE" => {
						held.retain(|r| !ids.contains(r));
						TransportResponse::new(204, Value::Null)
					}
					"PATCH" => {
						for id in ids {
							if !held.contains(&id) {
								held.push(id);
							}
						}
						TransportResponse::new(204, Value::Null)
					}
					_ => TransportResponse::new(405, Value::Null),
				}
			}
			(TENANT_HOST, "GET", ["api", "v2", "users"]) => {
				let q = request
					.query
					.iter()
					.find(|(k, _)| k == "q")
					.map(|(_, v)| v.clone())
					.unwrap_or_default();
				let found: Vec<&User> = state
					.users
					.iter()
					.filter(|(connection, user)| {
						let email = user.email.as_deref().unwrap_or_default();
						q == format!(r#"connection:"{connection}" AND email:"{email}""#)
					})
					.map(|(_, user)| user)
					.collect();
				TransportResponse::new(200, json!(found))
			}
			(TENANT_HOST, "DELETE", ["api", "v2", "users", id]) => {
				let id = decode(id);
				let before = state.users.len();
				state.users.retain(|(_, u)| u.user_id != id);
				if state.users.len() == before {
					TransportResponse::new(404, json!({"message": "The user does not exist."}))
				} else {
					TransportResponse::new(204, Value::Null)
				}
			}
			(TENANT_HOST, "PATCH", ["api", "v2", "users", id]) => {
				let id = decode(id);
				let patch = body["app_metadata"].as_object().cloned().unwrap_or_default();
				match state.users.iter_mut().find(|(_, u)| u.user_id == id) {
					Some((_, user)) => {
						for (key, value) in patch {
							if value.is_null() {
								user.app_metadata.remove(&key);
							} else {
								user.app_metadata.insert(key, value);
							}
						}
						TransportResponse::new(200, json!(user))
					}
					None => TransportResponse::new(404, json!({"message": "The user does not exist."})),
				}
			}
			_ => TransportResponse::new(404, json!("no route")),
		};
		Ok(response)
	}
}

fn split_url(url: &str) -> (String, String) {
	let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
	match rest.find('/') {
		Some(idx) => (rest[..idx].to_string(), rest[idx..].to_string()),
		None => (rest.to_string(), "/".to_string()),
	}
}

fn decode(segment: &str) -> String {
	urlencoding::decode(segment)
		.map(|s| s.into_owned())
		.unwrap_or_else(|_| segment.to_string())
}
