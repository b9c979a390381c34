// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::ProvisioningError;
use crate::types::{Role, RoleDirectory};

/// Session-lifetime cache of the role catalog.
///
/// The catalog is loaded once and then served unconditionally until
/// [`RoleDirectoryCache::clear`] is called.
#[derive(Debug, Default)]
pub struct RoleDirectoryCache {
	cached: RwLock<Option<Arc<RoleDirectory>>>,
}

impl RoleDirectoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<RoleDirectory>, ProvisioningError>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Vec<Role>, ProvisioningError>>,
	{
		if let Some(directory) = self.cached.read().await.as_ref() {
			debug!(roles = directory.len(), "role directory served from cache");
			return Ok(Arc::clone(directory));
		}

		let mut cached = self.cached.write().await;
		if let Some(directory) = cached.as_ref() {
			return Ok(Arc::clone(directory));
		}

		let catalog = load().await?;
		let catalog_len = catalog.len();
		let directory = Arc::new(RoleDirectory::from_catalog(catalog));
		if directory.len() < catalog_len {
			debug!(
				catalog = catalog_len,
				distinct = directory.len(),
				"role catalog contains duplicate names"
			);
		}
		info!(roles = directory.len(), "role directory loaded");

		*cached = Some(Arc::clone(&directory));
		Ok(directory)
	}

	pub async fn clear(&self) {
		*self.cached.write().await = None;
	}

	pub async fn is_loaded(&self) -> bool {
		self.cached.read().await.is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::TransportError;
	use crate::testing::role;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[tokio::test]
	async fn loads_once() {
		let cache = RoleDirectoryCache::new();
		let loads = AtomicUsize::new(0);

		for _ in 0..3 {
			let directory = cache
				.get_or_load(|| async {
					loads.fetch_add(1, Ordering::SeqCst);
					Ok(vec![role("r-1", "admins")])
				})
				.await
				.unwrap();
			assert_eq!(directory.get("admins").unwrap().id, "r-1");
		}
		assert_eq!(loads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn failed_load_is_not_cached() {
		let cache = RoleDirectoryCache::new();
		let result = cache
			.get_or_load(|| async {
				Err(ProvisioningError::from(TransportError::Timeout {
					url: "https://authz.example.com/roles".to_string(),
				}))
			})
			.await;
		assert!(result.is_err());
		assert!(!cache.is_loaded().await);

		cache
			.get_or_load(|| async { Ok(vec![]) })
			.await
			.unwrap();
		assert!(cache.is_loaded().await);
	}

	#[tokio::test]
	async fn clear_forces_reload() {
		let cache = RoleDirectoryCache::new();
		cache
			.get_or_load(|| async { Ok(vec![role("r-1", "old")]) })
			.await
			.unwrap();
		cache.clear().await;
		let directory = cache
			.get_or_load(|| async { Ok(vec![role("r-2", "new")]) })
			.await
			.unwrap();
		assert!(directory.get("old").is_none());
		assert_eq!(directory.get("new").unwrap().id, "r-2");
	}
}
