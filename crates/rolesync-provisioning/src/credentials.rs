// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-credentials grants and the access token pair cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rolesync_common_secret::SecretString;
use rolesync_config::{BrokerConfig, CredentialsConfig};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{body_excerpt, ProvisioningError, Service};
use crate::transport::{HttpTransport, TransportRequest};

/// The two audiences a session authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
	ManagementApi,
	Authz,
}

/// Bearer tokens for both audiences, fetched together.
#[derive(Debug, Clone)]
pub struct AccessTokenPair {
	pub management_api: SecretString,
	pub authz: SecretString,
}

impl AccessTokenPair {
	pub fn token(&self, audience: Audience) -> &SecretString {
		match audience {
			Audience::ManagementApi => &self.management_api,
			Audience::Authz => &self.authz,
		}
	}
}

/// Access token returned by a successful grant.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantedToken {
	pub access_token: SecretString,
	#[serde(default)]
	pub token_type: Option<String>,
	#[serde(default)]
	pub expires_in: Option<u64>,
}

/// Performs `client_credentials` grants against the broker token endpoint.
#[derive(Clone)]
pub struct TokenGrant {
	transport: Arc<dyn HttpTransport>,
	token_url: String,
	client_id: String,
	client_secret: SecretString,
}

impl TokenGrant {
	pub fn new(transport: Arc<dyn HttpTransport>, broker: &BrokerConfig) -> Self {
		Self {
			transport,
			token_url: broker.token_url(),
			client_id: broker.client_id.clone(),
			client_secret: broker.client_secret.clone(),
		}
	}

	/// Request a token for a single audience.
	#[instrument(skip(self), fields(token_url = %self.token_url))]
	pub async fn client_credentials(&self, audience: &str) -> Result<GrantedToken, ProvisioningError> {
		let body = json!({
			"grant_type": "client_credentials",
			"client_id": self.client_id,
			"client_secret": self.client_secret.expose(),
			"audience": audience,
		});

		let response = self
			.transport
			.send(TransportRequest::post(&self.token_url).json(body))
			.await?;

		if response.status != 200 {
			warn!(status = response.status, audience, "client credentials grant rejected");
			return Err(ProvisioningError::Authentication {
				audience: audience.to_string(),
				status: response.status,
				message: body_excerpt(&response.body),
			});
		}

		let token: GrantedToken = serde_json::from_value(response.body).map_err(|e| {
			ProvisioningError::invalid_response(
				Service::TokenEndpoint,
				"client credentials grant",
				e.to_string(),
			)
		})?;
		if token.access_token.is_empty() {
			return Err(ProvisioningError::invalid_response(
				Service::TokenEndpoint,
				"client credentials grant",
				"empty access_token",
			));
		}

		debug!(
			audience,
			token_type = token.token_type.as_deref().unwrap_or("unknown"),
			expires_in = token.expires_in,
			"client credentials grant succeeded"
		);
		Ok(token)
	}
}

impl std::fmt::Debug for TokenGrant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokenGrant")
			.field("token_url", &self.token_url)
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}

#[derive(Debug)]
struct CachedPair {
	tokens: Arc<AccessTokenPair>,
	expires_at: Option<Instant>,
}

impl CachedPair {
	fn is_fresh(&self, now: Instant) -> bool {
		self.expires_at.map_or(true, |at| now < at)
	}
}

/// Caches the [`AccessTokenPair`] for a session.
///
/// The first request for either audience grants both. A failed grant leaves
/// the cache empty.
#[derive(Debug)]
pub struct CredentialCache {
	grant: TokenGrant,
	management_audience: String,
	authz_audience: String,
	policy: CredentialsConfig,
	cached: RwLock<Option<CachedPair>>,
}

impl CredentialCache {
	pub fn new(
		grant: TokenGrant,
		management_audience: impl Into<String>,
		authz_audience: impl Into<String>,
		policy: CredentialsConfig,
	) -> Self {
		Self {
			grant,
			management_audience: management_audience.into(),
			authz_audience: authz_audience.into(),
			policy,
			cached: RwLock::new(None),
		}
	}

	/// Token for one audience, populating the pair on a miss.
	pub async fn get_token(&self, audience: Audience) -> Result<SecretString, ProvisioningError> {
		let pair = self.token_pair().await?;
		Ok(pair.token(audience).clone())
	}

	/// Both tokens, populating the cache on a miss or after expiry.
	pub async fn token_pair(&self) -> Result<Arc<AccessTokenPair>, ProvisioningError> {
		{
			let cached = self.cached.read().await;
			if let Some(entry) = cached.as_ref() {
				if entry.is_fresh(Instant::now()) {
					debug!("access tokens served from cache");
					return Ok(Arc::clone(&entry.tokens));
				}
			}
		}

		let mut cached = self.cached.write().await;

		// Another task may have refreshed while we waited for the write lock.
		if let Some(entry) = cached.as_ref() {
			if entry.is_fresh(Instant::now()) {
				return Ok(Arc::clone(&entry.tokens));
			}
			debug!("cached access tokens expired");
		}

		let entry = self.fetch_pair().await?;
		let tokens = Arc::clone(&entry.tokens);
		*cached = Some(entry);
		Ok(tokens)
	}

	/// Drop the cached pair.
	pub async fn clear(&self) {
		*self.cached.write().await = None;
	}

	pub async fn is_populated(&self) -> bool {
		self.cached.read().await.is_some()
	}

	#[instrument(skip(self))]
	async fn fetch_pair(&self) -> Result<CachedPair, ProvisioningError> {
		let (management, authz) = tokio::try_join!(
			self.grant.client_credentials(&self.management_audience),
			self.grant.client_credentials(&self.authz_audience),
		)?;

		let lifetime = [
			management.expires_in.map(Duration::from_secs),
			authz.expires_in.map(Duration::from_secs),
			self.policy.token_ttl,
		]
		.into_iter()
		.flatten()
		.min();
		let now = Instant::now();
		let expires_at = lifetime.map(|ttl| now + usable_lifetime(ttl, self.policy.expiry_skew));

		info!(
			lifetime_secs = lifetime.map(|d| d.as_secs()),
			"access token pair acquired"
		);

		Ok(CachedPair {
			tokens: Arc::new(AccessTokenPair {
				management_api: management.access_token,
				authz: authz.access_token,
			}),
			expires_at,
		})
	}
}

/// Lifetime minus the expiry skew. The skew is capped at half the lifetime
/// so a short-lived token is still reused.
fn usable_lifetime(lifetime: Duration, skew: Duration) -> Duration {
	if skew >= lifetime && !lifetime.is_zero() {
		warn!(
			lifetime_secs = lifetime.as_secs(),
			skew_secs = skew.as_secs(),
			"token lifetime shorter than expiry skew, capping skew"
		);
	}
	lifetime - skew.min(lifetime / 2)
}
