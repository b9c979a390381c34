// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity connection classification.
//!
//! A login through a *federated* connection is reconciled against a shadow
//! record in the *provisioned* connection. A login through an *in-place*
//! connection is reconciled against memberships stored on the user itself.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::warn;

use super::non_empty;
use crate::error::ConfigError;

const SECTION: &str = "connections";

/// Connection sets (runtime, fully resolved). The two sets are disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionsConfig {
	pub federated: BTreeSet<String>,
	pub in_place: BTreeSet<String>,
	/// Connection holding shadow records for federated users.
	pub provisioned: String,
}

impl ConnectionsConfig {
	pub fn is_federated(&self, connection: &str) -> bool {
		self.federated.contains(connection)
	}

	pub fn is_in_place(&self, connection: &str) -> bool {
		self.in_place.contains(connection)
	}
}

/// Connection configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionsConfigLayer {
	#[serde(default)]
	pub federated: Option<Vec<String>>,
	#[serde(default)]
	pub in_place: Option<Vec<String>>,
	#[serde(default)]
	pub provisioned: Option<String>,
}

impl ConnectionsConfigLayer {
	pub fn merge(&mut self, other: ConnectionsConfigLayer) {
		if other.federated.is_some() {
			self.federated = other.federated;
		}
		if other.in_place.is_some() {
			self.in_place = other.in_place;
		}
		if other.provisioned.is_some() {
			self.provisioned = other.provisioned;
		}
	}

	pub fn finalize(self) -> Result<ConnectionsConfig, ConfigError> {
		let federated = to_set(self.federated);
		let in_place = to_set(self.in_place);
		let provisioned = non_empty(self.provisioned, SECTION, "provisioned")?;

		if let Some(both) = federated.intersection(&in_place).next() {
			return Err(ConfigError::Validation(format!(
				"connection '{both}' is listed as both federated and in-place"
			)));
		}

		if federated.contains(&provisioned) || in_place.contains(&provisioned) {
			return Err(ConfigError::Validation(format!(
				"provisioned connection '{provisioned}' must not be a login connection"
			)));
		}

		if federated.is_empty() && in_place.is_empty() {
			warn!("no federated or in-place connections configured; every login will be skipped");
		}

		Ok(ConnectionsConfig {
			federated,
			in_place,
			provisioned,
		})
	}
}

fn to_set(names: Option<Vec<String>>) -> BTreeSet<String> {
	names
		.unwrap_or_default()
		.into_iter()
		.map(|n| n.trim().to_string())
		.filter(|n| !n.is_empty())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn layer(federated: &[&str], in_place: &[&str], provisioned: &str) -> ConnectionsConfigLayer {
		ConnectionsConfigLayer {
			federated: Some(federated.iter().map(|s| s.to_string()).collect()),
			in_place: Some(in_place.iter().map(|s| s.to_string()).collect()),
			provisioned: Some(provisioned.to_string()),
		}
	}

	#[test]
	fn classifies_connections() {
		let config = layer(&["corp-saml"], &["Username-Password"], "provisioned-users")
			.finalize()
			.unwrap();
		assert!(config.is_federated("corp-saml"));
		assert!(!config.is_federated("Username-Password"));
		assert!(config.is_in_place("Username-Password"));
		assert!(!config.is_in_place("google-oauth2"));
	}

	#[test]
	fn overlapping_sets_are_rejected() {
		let err = layer(&["shared"], &["shared"], "provisioned-users")
			.finalize()
			.unwrap_err();
		assert!(err.to_string().contains("both federated and in-place"));
	}

	#[test]
	fn provisioned_connection_cannot_be_a_login_connection() {
		let result = layer(&["provisioned-users"], &[], "provisioned-users").finalize();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn blank_names_are_dropped() {
		let config = layer(&[" corp-saml ", ""], &[], "provisioned-users")
			.finalize()
			.unwrap();
		assert_eq!(config.federated.len(), 1);
		assert!(config.is_federated("corp-saml"));
	}

	proptest! {
		#[test]
		fn finalized_sets_are_disjoint(
			federated in proptest::collection::vec("[a-d]{1,2}", 0..6),
			in_place in proptest::collection::vec("[a-d]{1,2}", 0..6),
		) {
			let layer = ConnectionsConfigLayer {
				federated: Some(federated),
				in_place: Some(in_place),
				provisioned: Some("provisioned-users".to_string()),
			};
			if let Ok(config) = layer.finalize() {
				prop_assert!(config.federated.is_disjoint(&config.in_place));
			}
		}
	}
}
