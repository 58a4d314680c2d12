//! Cache-aware role resolution.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    AuthzConfig, AuthzError, BackendRegistry, InMemoryRoleCache, NoCache, ResolutionChain,
    ResolutionReport, RoleCache, User,
};

/// A user after authorization, with the report of how it was resolved.
#[derive(Debug, Clone)]
pub struct Authorized {
    /// Resolved, frozen user.
    pub user: Arc<User>,
    /// Resolution outcome.
    pub report: ResolutionReport,
}

/// Resolves users through the role cache and the backend chain.
///
/// A cache hit returns the stored user without calling any backend. On a
/// miss the chain runs and the result is cached, unless every backend
/// failed: such a pass is returned but not stored, so the next request
/// tries the backends again.
#[derive(Clone)]
pub struct AuthorizationPipeline {
    chain: ResolutionChain,
    cache: Arc<dyn RoleCache>,
}

impl AuthorizationPipeline {
    /// Creates a pipeline.
    pub fn new(chain: ResolutionChain, cache: Arc<dyn RoleCache>) -> Self {
        Self { chain, cache }
    }

    /// Builds the chain and cache described by `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Parsed configuration
    /// * `registry` - Available backend types
    /// * `config_path` - Directory handed to backends as their path hint
    pub fn from_config(
        config: &AuthzConfig,
        registry: &BackendRegistry,
        config_path: &Path,
    ) -> Result<Self, AuthzError> {
        let chain = registry.build_chain(config, config_path)?;

        let cache: Arc<dyn RoleCache> = if config.cache.enabled {
            let cache = InMemoryRoleCache::new(Duration::from_secs(config.cache.ttl_secs));
            match config.cache.max_entries {
                Some(max) => Arc::new(cache.with_max_entries(max)),
                None => Arc::new(cache),
            }
        } else {
            Arc::new(NoCache)
        };

        info!(
            backends = chain.len(),
            cache = config.cache.enabled,
            "Authorization pipeline ready"
        );

        Ok(Self::new(chain, cache))
    }

    /// Backend chain.
    pub fn chain(&self) -> &ResolutionChain {
        &self.chain
    }

    /// Role cache.
    pub fn cache(&self) -> &Arc<dyn RoleCache> {
        &self.cache
    }

    /// Populates `user` with roles, from the cache or the chain.
    ///
    /// On a cache hit the cached record is returned as is: roles or
    /// attributes already present on the incoming `user` are dropped. Only
    /// on a miss do they survive, merged with what the backends add.
    pub async fn authorize(&self, mut user: User) -> Authorized {
        if let Some(cached) = self.cache.get(user.name()) {
            debug!(user = %cached.name(), "Role cache hit");
            return Authorized {
                user: cached,
                report: ResolutionReport::cached(),
            };
        }

        let report = self.chain.resolve(&mut user).await;

        let user = if report.all_failed() {
            warn!(
                user = %user.name(),
                failures = report.failures.len(),
                "Every authorization backend failed, result not cached"
            );
            Arc::new(user)
        } else {
            self.cache.put(user)
        };

        debug!(user = %user.name(), roles = ?user.roles(), "Roles resolved");
        Authorized { user, report }
    }

    /// Drops the cached entry for `principal`.
    pub fn invalidate(&self, principal: &str) {
        self.cache.invalidate(principal);
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
