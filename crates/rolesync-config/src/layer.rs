// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	AuthzConfigLayer, BrokerConfigLayer, ConnectionsConfigLayer, CredentialsConfigLayer,
	HttpConfigLayer, LoggingConfigLayer,
};

/// Top-level configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub broker: Option<BrokerConfigLayer>,
	#[serde(default)]
	pub authz: Option<AuthzConfigLayer>,
	#[serde(default)]
	pub connections: Option<ConnectionsConfigLayer>,
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub credentials: Option<CredentialsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.broker, other.broker, BrokerConfigLayer::merge);
		merge_option(&mut self.authz, other.authz, AuthzConfigLayer::merge);
		merge_option(
			&mut self.connections,
			other.connections,
			ConnectionsConfigLayer::merge,
		);
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.credentials,
			other.credentials,
			CredentialsConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
