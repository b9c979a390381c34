// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciliation of provisioned memberships into authorization-service roles.
//!
//! A reconciliation runs as one ordered pipeline:
//!
//! 1. acquire the access token pair
//! 2. resolve the provisioned record (the user itself, or a shadow user)
//! 3. discard a shadow record that carries no memberships
//! 4. fetch and remove every role the subject currently holds
//! 5. translate membership names through the role directory
//! 6. assign the translated roles
//! 7. dispose of the provisioned data
//!
//! Any failure stops the pipeline. Nothing is rolled back, and re-running the
//! same event converges on the same end state.

use std::sync::Arc;

use rolesync_config::ConnectionsConfig;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::authz::AuthzClient;
use crate::credentials::{AccessTokenPair, Audience, CredentialCache};
use crate::error::ProvisioningError;
use crate::roles::RoleDirectoryCache;
use crate::types::{Context, RoleDirectory, User, MEMBERSHIPS_KEY};
use crate::users::UserDirectoryClient;

/// How a triggering event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
	/// Memberships live on a shadow user in the provisioned-users connection.
	Federated,
	/// Memberships live on the triggering user's own `app_metadata`.
	InPlace,
	/// Nothing to do.
	Unmanaged,
}

/// Classify an event. Federated connections take precedence.
pub fn classify(connections: &ConnectionsConfig, user: &User, context: &Context) -> Classification {
	if connections.is_federated(&context.connection) {
		Classification::Federated
	} else if connections.is_in_place(&context.connection) && user.has_memberships() {
		Classification::InPlace
	} else {
		Classification::Unmanaged
	}
}

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
	/// The event was not managed; no remote calls were made.
	Skipped,
	/// Federated user without a matching shadow record.
	NoProvisionedRecord,
	/// Shadow record had no memberships and was deleted; roles untouched.
	ShadowDiscarded { shadow_user_id: String },
	/// Previous roles were removed and the provisioned ones assigned.
	RolesReplaced {
		removed: Vec<String>,
		assigned: Vec<String>,
	},
}

/// Result of [`Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
	/// The triggering user; in-place users come back without `memberships`.
	pub user: User,
	pub context: Context,
	pub action: ReconcileAction,
}

enum ProvisionedRecord {
	InPlace,
	Shadow(User),
}

/// Runs reconciliations against shared session caches.
#[derive(Debug, Clone)]
pub struct Reconciler {
	connections: ConnectionsConfig,
	credentials: Arc<CredentialCache>,
	roles: Arc<RoleDirectoryCache>,
	authz: AuthzClient,
	users: UserDirectoryClient,
}

impl Reconciler {
	pub fn new(
		connections: ConnectionsConfig,
		credentials: Arc<CredentialCache>,
		roles: Arc<RoleDirectoryCache>,
		authz: AuthzClient,
		users: UserDirectoryClient,
	) -> Self {
		Self {
			connections,
			credentials,
			roles,
			authz,
			users,
		}
	}

	#[instrument(
		skip(self, user, context),
		fields(user_id = %user.user_id, connection = %context.connection)
	)]
	pub async fn reconcile(
		&self,
		mut user: User,
		context: Context,
	) -> Result<ReconcileOutcome, ProvisioningError> {
		let classification = classify(&self.connections, &user, &context);
		let record = match classification {
			Classification::Unmanaged => {
				debug!("connection not managed, skipping");
				return Ok(ReconcileOutcome {
					user,
					context,
					action: ReconcileAction::Skipped,
				});
			}
			Classification::Federated => None,
			Classification::InPlace => Some(ProvisionedRecord::InPlace),
		};

		match self.run(&mut user, record).await {
			Ok(action) => {
				info!(?action, ?classification, "reconciliation complete");
				Ok(ReconcileOutcome {
					user,
					context,
					action,
				})
			}
			Err(e) => {
				warn!(error = %e, kind = ?e.kind(), "reconciliation failed");
				Err(e)
			}
		}
	}

	/// Role directory for this session, loading the catalog on first use.
	pub async fn get_role_directory(&self) -> Result<Arc<RoleDirectory>, ProvisioningError> {
		let token = self.credentials.get_token(Audience::Authz).await?;
		self.roles
			.get_or_load(|| self.authz.list_roles(&token))
			.await
	}

	async fn run(
		&self,
		user: &mut User,
		record: Option<ProvisionedRecord>,
	) -> Result<ReconcileAction, ProvisioningError> {
		let tokens = self.credentials.token_pair().await?;

		let record = match record {
			Some(record) => record,
			None => match self.find_shadow(user, &tokens).await? {
				Some(shadow) => ProvisionedRecord::Shadow(shadow),
				None => return Ok(ReconcileAction::NoProvisionedRecord),
			},
		};

		let memberships = match &record {
			ProvisionedRecord::InPlace => user.memberships()?,
			ProvisionedRecord::Shadow(shadow) => shadow.memberships()?,
		};
		let memberships = match (memberships, &record) {
			(Some(memberships), _) => memberships,
			(None, ProvisionedRecord::Shadow(shadow)) => {
				debug!(shadow_user_id = %shadow.user_id, "shadow record has no memberships");
				self.users
					.delete_user(&shadow.user_id, &tokens.management_api)
					.await?;
				return Ok(ReconcileAction::ShadowDiscarded {
					shadow_user_id: shadow.user_id.clone(),
				});
			}
			// Classification only yields in-place for users with memberships.
			(None, ProvisionedRecord::InPlace) => return Ok(ReconcileAction::Skipped),
		};

		let current = self
			.authz
			.get_user_roles(&user.user_id, &tokens.authz)
			.await?;
		let removed: Vec<String> = current.into_iter().map(|role| role.id).collect();
		self.authz
			.remove_user_roles(&user.user_id, &removed, &tokens.authz)
			.await?;

		let directory = self
			.roles
			.get_or_load(|| self.authz.list_roles(&tokens.authz))
			.await?;
		let assigned = directory.resolve(&memberships)?;
		self.authz
			.set_user_roles(&user.user_id, &assigned, &tokens.authz)
			.await?;

		match record {
			ProvisionedRecord::InPlace => {
				// Top-level keys are merged server side; null deletes the key.
				let mut patch = Map::new();
				patch.insert(MEMBERSHIPS_KEY.to_string(), Value::Null);
				self.users
					.patch_user_app_metadata(&user.user_id, patch, &tokens.management_api)
					.await?;
				user.app_metadata.remove(MEMBERSHIPS_KEY);
			}
			ProvisionedRecord::Shadow(shadow) => {
				self.users
					.delete_user(&shadow.user_id, &tokens.management_api)
					.await?;
			}
		}

		Ok(ReconcileAction::RolesReplaced { removed, assigned })
	}

	async fn find_shadow(
		&self,
		user: &User,
		tokens: &AccessTokenPair,
	) -> Result<Option<User>, ProvisioningError> {
		let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) else {
			warn!("federated user has no email, cannot match a provisioned record");
			return Ok(None);
		};

		let mut found = self
			.users
			.find_users_by_connection_and_email(
				&self.connections.provisioned,
				email,
				&tokens.management_api,
			)
			.await?;
		if found.len() > 1 {
			warn!(
				matches = found.len(),
				"several provisioned records share this email, using the first"
			);
		}
		if found.is_empty() {
			debug!("no provisioned record found");
			return Ok(None);
		}
		Ok(Some(found.swap_remove(0)))
	}
}
