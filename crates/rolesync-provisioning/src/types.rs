// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types shared by the engine and its clients.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ProvisioningError;

/// `app_metadata` key holding the provisioned role names.
pub const MEMBERSHIPS_KEY: &str = "memberships";

/// A user record as the identity broker and user store describe it.
///
/// Fields the engine does not interpret are kept in `extra` and serialized
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub user_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connection: Option<String>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub app_metadata: Map<String, Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl User {
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			email: None,
			connection: None,
			app_metadata: Map::new(),
			extra: Map::new(),
		}
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	pub fn with_memberships<I, S>(mut self, memberships: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let names = memberships
			.into_iter()
			.map(|s| Value::String(s.into()))
			.collect();
		self.app_metadata
			.insert(MEMBERSHIPS_KEY.to_string(), Value::Array(names));
		self
	}

	/// `memberships` is defined when present and not `null`.
	pub fn has_memberships(&self) -> bool {
		matches!(self.app_metadata.get(MEMBERSHIPS_KEY), Some(v) if !v.is_null())
	}

	/// Parse the provisioned memberships, `None` when undefined.
	pub fn memberships(&self) -> Result<Option<Vec<String>>, ProvisioningError> {
		let value = match self.app_metadata.get(MEMBERSHIPS_KEY) {
			None | Some(Value::Null) => return Ok(None),
			Some(value) => value,
		};

		let items = value
			.as_array()
			.ok_or_else(|| self.malformed(format!("expected an array, found {}", kind_of(value))))?;

		items
			.iter()
			.enumerate()
			.map(|(index, item)| {
				item.as_str().map(str::to_string).ok_or_else(|| {
					self.malformed(format!(
						"element {index} is {}, expected a string",
						kind_of(item)
					))
				})
			})
			.collect::<Result<Vec<_>, _>>()
			.map(Some)
	}

	fn malformed(&self, message: String) -> ProvisioningError {
		ProvisioningError::MalformedMemberships {
			user_id: self.user_id.clone(),
			message,
		}
	}
}

/// The event that triggered a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
	#[serde(default)]
	pub connection: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Context {
	pub fn for_connection(connection: impl Into<String>) -> Self {
		Self {
			connection: connection.into(),
			extra: Map::new(),
		}
	}
}

/// A role in the authorization service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	#[serde(rename = "_id")]
	pub id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(
		default,
		rename = "applicationId",
		skip_serializing_if = "Option::is_none"
	)]
	pub application_id: Option<String>,
	#[serde(
		default,
		rename = "applicationType",
		skip_serializing_if = "Option::is_none"
	)]
	pub application_type: Option<String>,
}

/// Role catalog indexed by name.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
	by_name: HashMap<String, Role>,
}

impl RoleDirectory {
	/// Later entries replace earlier ones that share a name.
	pub fn from_catalog(roles: impl IntoIterator<Item = Role>) -> Self {
		let by_name = roles
			.into_iter()
			.map(|role| (role.name.clone(), role))
			.collect();
		Self { by_name }
	}

	pub fn get(&self, name: &str) -> Option<&Role> {
		self.by_name.get(name)
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	/// Translate membership names into role ids.
	///
	/// Repeated names resolve once, in first-occurrence order. An unknown name
	/// fails the whole translation.
	pub fn resolve(&self, memberships: &[String]) -> Result<Vec<String>, ProvisioningError> {
		let mut ids: Vec<String> = Vec::with_capacity(memberships.len());
		for name in memberships {
			let role = self
				.get(name)
				.ok_or_else(|| ProvisioningError::UnknownMembership {
					membership: name.clone(),
				})?;
			if !ids.contains(&role.id) {
				ids.push(role.id.clone());
			}
		}
		Ok(ids)
	}
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
