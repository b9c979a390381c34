// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use rolesync_common_http::Timeouts;
use rolesync_config::RoleSyncConfig;
use tracing::{debug, info};

use crate::authz::AuthzClient;
use crate::credentials::{CredentialCache, TokenGrant};
use crate::engine::{ReconcileOutcome, Reconciler};
use crate::error::ProvisioningError;
use crate::memberships::MembershipLister;
use crate::roles::RoleDirectoryCache;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{Context, RoleDirectory, User};
use crate::users::UserDirectoryClient;

/// Owns the caches shared by every reconciliation in a process.
///
/// Create one at startup and share it (it is cheap to clone). Dropping the
/// last clone drops the cached tokens and role directory.
#[derive(Debug, Clone)]
pub struct Session {
	config: Arc<RoleSyncConfig>,
	credentials: Arc<CredentialCache>,
	roles: Arc<RoleDirectoryCache>,
	reconciler: Reconciler,
	lister: MembershipLister,
}

impl Session {
	pub fn new(config: RoleSyncConfig, transport: Arc<dyn HttpTransport>) -> Self {
		let grant = TokenGrant::new(Arc::clone(&transport), &config.broker);
		let authz = AuthzClient::new(Arc::clone(&transport), &config.authz.base_url);
		let users = UserDirectoryClient::new(transport, config.broker.management_api_url());

		let credentials = Arc::new(CredentialCache::new(
			grant.clone(),
			config.broker.management_audience(),
			config.authz.audience.clone(),
			config.credentials,
		));
		let roles = Arc::new(RoleDirectoryCache::new());

		let reconciler = Reconciler::new(
			config.connections.clone(),
			Arc::clone(&credentials),
			Arc::clone(&roles),
			authz.clone(),
			users,
		);
		let lister = MembershipLister::new(grant, config.authz.audience.clone(), authz);

		debug!(domain = %config.broker.domain, "provisioning session created");
		Self {
			config: Arc::new(config),
			credentials,
			roles,
			reconciler,
			lister,
		}
	}

	/// Build a session over a `reqwest` transport using the configured timeouts.
	pub fn from_config(config: RoleSyncConfig) -> Result<Self, ProvisioningError> {
		let transport = ReqwestTransport::new(Timeouts {
			request: config.http.timeout,
			connect: config.http.connect_timeout,
		})?;
		Ok(Self::new(config, Arc::new(transport)))
	}

	pub fn config(&self) -> &RoleSyncConfig {
		&self.config
	}

	pub fn reconciler(&self) -> &Reconciler {
		&self.reconciler
	}

	/// Reconcile one user event.
	pub async fn reconcile(
		&self,
		user: User,
		context: Context,
	) -> Result<ReconcileOutcome, ProvisioningError> {
		self.reconciler.reconcile(user, context).await
	}

	/// Cached role directory, loaded on first use.
	pub async fn role_directory(&self) -> Result<Arc<RoleDirectory>, ProvisioningError> {
		self.reconciler.get_role_directory().await
	}

	/// Role names available for provisioning, in catalog order.
	pub async fn list_memberships(&self) -> Result<Vec<String>, ProvisioningError> {
		self.lister.list_membership_names().await
	}

	/// Forget cached tokens and the role directory.
	pub async fn clear_caches(&self) {
		self.credentials.clear().await;
		self.roles.clear().await;
		info!("provisioning caches cleared");
	}
}
