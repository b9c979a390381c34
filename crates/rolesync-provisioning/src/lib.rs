// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning reconciliation engine.
//!
//! When a user signs in, [`Session::reconcile`] moves the role memberships
//! provisioned for that user into the authorization service and then disposes
//! of the provisioned data. Memberships come either from the user's own
//! `app_metadata` (in-place connections) or from a shadow user in a dedicated
//! provisioned-users connection, matched by email (federated connections).
//!
//! [`Session::list_memberships`] lists the role names an administrator can
//! provision.
//!
//! # Example
//!
//! ```ignore
//! use rolesync_provisioning::{Context, Session, User};
//!
//! let config = rolesync_config::load_config()?;
//! rolesync_provisioning::init_tracing(&config.logging)?;
//! let session = Session::from_config(config)?;
//!
//! let outcome = session.reconcile(user, Context::for_connection("corp-saml")).await?;
//! tracing::info!(action = ?outcome.action, "user reconciled");
//! ```

pub mod authz;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod logging;
pub mod memberships;
pub mod roles;
pub mod session;
pub mod transport;
pub mod types;
pub mod users;

#[cfg(test)]
mod testing;

pub use authz::AuthzClient;
pub use credentials::{AccessTokenPair, Audience, CredentialCache, GrantedToken, TokenGrant};
pub use engine::{classify, Classification, ReconcileAction, ReconcileOutcome, Reconciler};
pub use error::{ErrorKind, ProvisioningError, Service, TransportError};
pub use logging::{init_tracing, LoggingError};
pub use memberships::MembershipLister;
pub use roles::RoleDirectoryCache;
pub use session::Session;
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
pub use types::{Context, Role, RoleDirectory, User, MEMBERSHIPS_KEY};
pub use users::UserDirectoryClient;
