// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing::{info, instrument};

use crate::authz::AuthzClient;
use crate::credentials::TokenGrant;
use crate::error::ProvisioningError;

/// Lists the membership names an administrator can provision.
///
/// Every call performs its own authz-audience grant and reads the catalog
/// fresh; nothing is cached here.
#[derive(Debug, Clone)]
pub struct MembershipLister {
	grant: TokenGrant,
	authz_audience: String,
	authz: AuthzClient,
}

impl MembershipLister {
	pub fn new(grant: TokenGrant, authz_audience: impl Into<String>, authz: AuthzClient) -> Self {
		Self {
			grant,
			authz_audience: authz_audience.into(),
			authz,
		}
	}

	/// Role names in catalog order, duplicates kept.
	#[instrument(skip(self))]
	pub async fn list_membership_names(&self) -> Result<Vec<String>, ProvisioningError> {
		let token = self.grant.client_credentials(&self.authz_audience).await?;
		let roles = self.authz.list_roles(&token.access_token).await?;
		info!(count = roles.len(), "membership names listed");
		Ok(roles.into_iter().map(|role| role.name).collect())
	}
}
