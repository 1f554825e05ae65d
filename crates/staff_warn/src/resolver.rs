//! Origin resolution engine.
//!
//! [`OriginResolver`] answers one question per tracked command: should this
//! use raise an alert, and if so, which group gave the player the
//! permission?
//!
//! # Resolution
//!
//! 1. **Exclusion** - no context, or an excluded context: no alert. Decided
//!    before the authority is touched.
//! 2. **Baseline coverage** - if any default group grants the permission in
//!    the player's context, ordinary players could run the command too: no
//!    alert. Cached per `(context, permission)`.
//! 3. **Origin** - otherwise, the first inherited node matching the
//!    permission names the origin group, or `"unknown"`. Cached per
//!    `(player, context, permission)`.
//!
//! Authority failures never escape. A coverage check against an unavailable
//! authority yields no alert; a failed origin lookup yields `"unknown"`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use staff_warn::authority::InMemoryAuthority;
//! use staff_warn::context::ContextSet;
//! use staff_warn::player::{Player, SnapshotPlayer};
//! use staff_warn::resolver::OriginResolver;
//!
//! let authority = Arc::new(InMemoryAuthority::new());
//! authority.add_group("default");
//! authority.grant_group("staff", "server.ban", ContextSet::empty());
//!
//! let player = SnapshotPlayer::new("Notch").on_server("survival");
//! authority.add_player_group(player.id(), "staff", ContextSet::empty());
//!
//! let resolver = OriginResolver::builder(authority)
//!     .default_groups(vec!["default".to_string()])
//!     .excluded_contexts(vec!["lobby".to_string()])
//!     .build();
//!
//! assert_eq!(resolver.resolve_alert_origin(&player, "server.ban").as_deref(), Some("staff"));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::authority::{PermissionAuthority, UNKNOWN_ORIGIN};
use crate::cache::{BoundedCache, CacheLimits};
use crate::config::Settings;
use crate::context::ContextSet;
use crate::error::AuthorityError;
use crate::player::Player;

/// Sizes cleared by one [`OriginResolver::cleanup`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Pre-clear size of the coverage cache, if it was cleared
    pub coverage_cleared: Option<usize>,
    /// Pre-clear size of the origin cache, if it was cleared
    pub origins_cleared: Option<usize>,
}

/// Current sizes of the resolver caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheSizes {
    /// Entries in the baseline-coverage cache
    pub coverage: usize,
    /// Entries in the origin cache
    pub origins: usize,
}

/// Decides whether a command use alerts, and names the origin group
///
/// The resolver owns its two caches, so independent instances never share
/// state. It is `Send + Sync`; share it behind an `Arc` across worker tasks.
pub struct OriginResolver {
    authority: Arc<dyn PermissionAuthority>,
    default_groups: Vec<String>,
    excluded_contexts: HashSet<String>,
    verbose: bool,
    coverage: BoundedCache<bool>,
    origins: BoundedCache<String>,
}

impl OriginResolver {
    /// Start building a resolver around `authority`.
    pub fn builder(authority: Arc<dyn PermissionAuthority>) -> OriginResolverBuilder {
        OriginResolverBuilder {
            authority,
            default_groups: Vec::new(),
            excluded_contexts: Vec::new(),
            verbose: false,
            cache_limits: CacheLimits::default(),
        }
    }

    /// Build a resolver from loaded settings.
    pub fn from_settings(authority: Arc<dyn PermissionAuthority>, settings: &Settings) -> Self {
        Self::builder(authority)
            .default_groups(settings.default_groups.clone())
            .excluded_contexts(settings.excluded_servers.clone())
            .verbose(settings.verbose)
            .cache_limits(settings.cache_limits)
            .build()
    }

    /// Origin of `permission` for `player` if its use should alert.
    ///
    /// Returns `None` when the player has no context, the context is
    /// excluded, a default group already grants the permission, or the
    /// authority is unavailable. Otherwise returns the origin group name or
    /// `"unknown"`.
    pub fn resolve_alert_origin<P>(&self, player: &P, permission: &str) -> Option<String>
    where
        P: Player + ?Sized,
    {
        let Some(context_id) = player.current_context().map(|c| c.to_lowercase()) else {
            if self.verbose {
                debug!("Skipping alert for {} - no current server", player.name());
            }
            return None;
        };

        if self.excluded_contexts.contains(&context_id) {
            if self.verbose {
                debug!(
                    "Skipping alert for {} - server {} is excluded",
                    player.name(),
                    context_id
                );
            }
            return None;
        }

        let context = ContextSet::server(&context_id);

        match self.check_defaults(&context, permission) {
            Ok(true) => {
                if self.verbose {
                    debug!(
                        "Skipping alert for {} - permission {} is in default groups",
                        player.name(),
                        permission
                    );
                }
                return None;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Error checking default groups for {}: {}", permission, e);
                return None;
            }
        }

        let origin = self.find_origin(player.id(), &context, permission);
        if self.verbose {
            debug!(
                "Alert triggered for {} - permission {} from {} on server {}",
                player.name(),
                permission,
                origin,
                context_id
            );
        }
        Some(origin)
    }

    /// Whether any default group grants `permission` in `context`. Cached.
    ///
    /// An unavailable authority reads as `false` and is not cached.
    pub fn is_granted_to_defaults(&self, context: &ContextSet, permission: &str) -> bool {
        self.check_defaults(context, permission).unwrap_or_else(|e| {
            warn!("Error checking default groups for {}: {}", permission, e);
            false
        })
    }

    /// Group through which `player` holds `permission` in `context`. Cached.
    ///
    /// Failures are logged and reported as `"unknown"` without caching.
    pub fn find_origin(&self, player: Uuid, context: &ContextSet, permission: &str) -> String {
        let key = format!("{}:{}:{}", player, context.server_id(), permission);
        if let Some(origin) = self.origins.get(&key) {
            return origin;
        }

        match self
            .authority
            .resolve_inherited_origin(player, permission, context)
        {
            Ok(origin) => {
                self.origins.insert(key, origin.clone());
                origin
            }
            Err(e) => {
                warn!("Error determining permission origin: {}", e);
                UNKNOWN_ORIGIN.to_string()
            }
        }
    }

    /// Clear each cache that has grown past its cleanup threshold.
    pub fn cleanup(&self) -> CleanupReport {
        CleanupReport {
            coverage_cleared: self.coverage.clear_if_over(),
            origins_cleared: self.origins.clear_if_over(),
        }
    }

    /// Current cache sizes.
    pub fn cache_sizes(&self) -> CacheSizes {
        CacheSizes {
            coverage: self.coverage.len(),
            origins: self.origins.len(),
        }
    }

    /// The configured default groups.
    pub fn default_groups(&self) -> &[String] {
        &self.default_groups
    }

    fn check_defaults(&self, context: &ContextSet, permission: &str) -> Result<bool, AuthorityError> {
        let key = format!("{}:{}", context.server_id(), permission);
        if let Some(covered) = self.coverage.get(&key) {
            return Ok(covered);
        }

        let mut covered = false;
        for group in &self.default_groups {
            match self.authority.group_has_permission(group, permission, context) {
                Ok(true) => {
                    covered = true;
                    break;
                }
                Ok(false) => {}
                Err(e) if e.is_unavailable() => return Err(e),
                Err(e) => {
                    debug!("Default group {} check failed for {}: {}", group, permission, e);
                }
            }
        }

        self.coverage.insert(key, covered);
        Ok(covered)
    }
}

impl std::fmt::Debug for OriginResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginResolver")
            .field("default_groups", &self.default_groups)
            .field("excluded_contexts", &self.excluded_contexts)
            .field("verbose", &self.verbose)
            .field("coverage", &self.coverage)
            .field("origins", &self.origins)
            .finish_non_exhaustive()
    }
}

/// Builder for [`OriginResolver`].
pub struct OriginResolverBuilder {
    authority: Arc<dyn PermissionAuthority>,
    default_groups: Vec<String>,
    excluded_contexts: Vec<String>,
    verbose: bool,
    cache_limits: CacheLimits,
}

impl OriginResolverBuilder {
    /// Set the default (baseline) groups, checked in this order.
    pub fn default_groups(mut self, groups: Vec<String>) -> Self {
        self.default_groups = groups;
        self
    }

    /// Set the contexts where alerting is off. Compared lowercased.
    pub fn excluded_contexts(mut self, contexts: Vec<String>) -> Self {
        self.excluded_contexts = contexts;
        self
    }

    /// Enable verbose decision logging.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set limits for both caches.
    pub fn cache_limits(mut self, limits: CacheLimits) -> Self {
        self.cache_limits = limits;
        self
    }

    /// Build the resolver with empty caches.
    pub fn build(self) -> OriginResolver {
        OriginResolver {
            authority: self.authority,
            default_groups: self.default_groups,
            excluded_contexts: self
                .excluded_contexts
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            verbose: self.verbose,
            coverage: BoundedCache::new("permission check", self.cache_limits),
            origins: BoundedCache::new("permission origin", self.cache_limits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{InMemoryAuthority, InheritedNode};
    use crate::player::SnapshotPlayer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails on demand.
    struct SpyAuthority {
        inner: InMemoryAuthority,
        group_calls: AtomicUsize,
        node_calls: AtomicUsize,
        failing_group: Option<String>,
        fail_nodes: bool,
    }

    impl SpyAuthority {
        fn new(inner: InMemoryAuthority) -> Self {
            Self {
                inner,
                group_calls: AtomicUsize::new(0),
                node_calls: AtomicUsize::new(0),
                failing_group: None,
                fail_nodes: false,
            }
        }

        fn calls(&self) -> usize {
            self.group_calls.load(Ordering::SeqCst) + self.node_calls.load(Ordering::SeqCst)
        }
    }

    impl PermissionAuthority for SpyAuthority {
        fn group_has_permission(
            &self,
            group: &str,
            permission: &str,
            context: &ContextSet,
        ) -> Result<bool, AuthorityError> {
            self.group_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_group.as_deref() == Some(group) {
                return Err(AuthorityError::Query("lookup timed out".to_string()));
            }
            self.inner.group_has_permission(group, permission, context)
        }

        fn inherited_nodes(
            &self,
            player: Uuid,
            context: &ContextSet,
        ) -> Result<Vec<InheritedNode>, AuthorityError> {
            self.node_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_nodes {
                return Err(AuthorityError::Query("user not loaded".to_string()));
            }
            self.inner.inherited_nodes(player, context)
        }
    }

    fn global() -> ContextSet {
        ContextSet::empty()
    }

    fn fixture() -> (InMemoryAuthority, SnapshotPlayer) {
        let authority = InMemoryAuthority::new();
        let player = SnapshotPlayer::new("Notch").on_server("Survival");
        authority
            .grant_group("default", "server.spawn", global())
            .grant_group("staff", "server.ban", global())
            .add_player_group(player.id(), "default", global())
            .add_player_group(player.id(), "staff", global());
        (authority, player)
    }

    fn resolver(authority: Arc<dyn PermissionAuthority>) -> OriginResolver {
        OriginResolver::builder(authority)
            .default_groups(vec!["default".to_string()])
            .excluded_contexts(vec!["Lobby".to_string()])
            .verbose(true)
            .build()
    }

    #[test]
    fn test_alert_with_group_origin() {
        let (authority, player) = fixture();
        let resolver = resolver(Arc::new(authority));

        assert_eq!(
            resolver.resolve_alert_origin(&player, "server.ban").as_deref(),
            Some("staff")
        );
    }

    #[test]
    fn test_default_coverage_suppresses_alert() {
        let (authority, player) = fixture();
        let resolver = resolver(Arc::new(authority));

        assert_eq!(resolver.resolve_alert_origin(&player, "server.spawn"), None);
    }

    #[test]
    fn test_any_default_group_suffices() {
        let (authority, player) = fixture();
        authority.grant_group("member", "server.home", global());
        let resolver = OriginResolver::builder(Arc::new(authority))
            .default_groups(vec!["default".to_string(), "member".to_string()])
            .build();

        assert_eq!(resolver.resolve_alert_origin(&player, "server.home"), None);
    }

    #[test]
    fn test_short_circuit_on_first_granting_group() {
        let (authority, _player) = fixture();
        authority.grant_group("member", "server.spawn", global());
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = OriginResolver::builder(spy.clone())
            .default_groups(vec!["default".to_string(), "member".to_string()])
            .build();

        assert!(resolver.is_granted_to_defaults(&ContextSet::server("survival"), "server.spawn"));
        assert_eq!(spy.group_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_excluded_context_never_queries() {
        let (authority, _) = fixture();
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = resolver(spy.clone());
        let player = SnapshotPlayer::new("Notch").on_server("LOBBY");

        assert_eq!(resolver.resolve_alert_origin(&player, "server.ban"), None);
        assert_eq!(spy.calls(), 0);
    }

    #[test]
    fn test_no_context_never_queries() {
        let (authority, _) = fixture();
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = resolver(spy.clone());
        let player = SnapshotPlayer::new("Notch");

        assert_eq!(resolver.resolve_alert_origin(&player, "server.ban"), None);
        assert_eq!(spy.calls(), 0);
    }

    #[test]
    fn test_direct_grant_is_unknown() {
        let (authority, player) = fixture();
        authority.grant_player(player.id(), "server.stop", global());
        let resolver = resolver(Arc::new(authority));

        assert_eq!(
            resolver.resolve_alert_origin(&player, "server.stop").as_deref(),
            Some(UNKNOWN_ORIGIN)
        );
    }

    #[test]
    fn test_second_call_is_cached() {
        let (authority, player) = fixture();
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = resolver(spy.clone());

        let first = resolver.resolve_alert_origin(&player, "server.ban");
        let calls = spy.calls();
        let second = resolver.resolve_alert_origin(&player, "server.ban");

        assert_eq!(first, second);
        assert_eq!(calls, 2);
        assert_eq!(spy.calls(), calls);
        assert_eq!(
            resolver.cache_sizes(),
            CacheSizes {
                coverage: 1,
                origins: 1
            }
        );
    }

    #[test]
    fn test_cache_keys_are_lowercased_context() {
        let (authority, player) = fixture();
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = resolver(spy.clone());

        resolver.resolve_alert_origin(&player, "server.ban");
        let key = format!("{}:survival:server.ban", player.id());
        assert_eq!(resolver.origins.get(&key).as_deref(), Some("staff"));
        assert_eq!(resolver.coverage.get("survival:server.ban"), Some(false));
    }

    #[test]
    fn test_false_coverage_is_cached() {
        let (authority, _) = fixture();
        let spy = Arc::new(SpyAuthority::new(authority));
        let resolver = resolver(spy.clone());
        let context = ContextSet::server("survival");

        assert!(!resolver.is_granted_to_defaults(&context, "server.ban"));
        assert!(!resolver.is_granted_to_defaults(&context, "server.ban"));
        assert_eq!(spy.group_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_global_context_key() {
        let (authority, _) = fixture();
        let resolver = resolver(Arc::new(authority));

        assert!(resolver.is_granted_to_defaults(&ContextSet::empty(), "server.spawn"));
        assert_eq!(resolver.coverage.get("global:server.spawn"), Some(true));
    }

    #[test]
    fn test_failing_group_is_skipped() {
        let (authority, player) = fixture();
        authority.grant_group("member", "server.home", global());
        let mut spy = SpyAuthority::new(authority);
        spy.failing_group = Some("default".to_string());
        let spy = Arc::new(spy);
        let resolver = OriginResolver::builder(spy.clone())
            .default_groups(vec!["default".to_string(), "member".to_string()])
            .build();

        assert_eq!(resolver.resolve_alert_origin(&player, "server.home"), None);
        assert_eq!(spy.group_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_default_group_does_not_abort() {
        let (authority, player) = fixture();
        let resolver = OriginResolver::builder(Arc::new(authority))
            .default_groups(vec!["missing".to_string(), "default".to_string()])
            .build();

        assert_eq!(resolver.resolve_alert_origin(&player, "server.spawn"), None);
        assert_eq!(
            resolver.resolve_alert_origin(&player, "server.ban").as_deref(),
            Some("staff")
        );
    }

    #[test]
    fn test_unavailable_authority_means_no_alert() {
        let (authority, player) = fixture();
        authority.set_available(false);
        let authority = Arc::new(authority);
        let resolver = resolver(authority.clone());

        assert_eq!(resolver.resolve_alert_origin(&player, "server.ban"), None);
        assert_eq!(resolver.cache_sizes(), CacheSizes::default());

        authority.set_available(true);
        assert_eq!(
            resolver.resolve_alert_origin(&player, "server.ban").as_deref(),
            Some("staff")
        );
    }

    #[test]
    fn test_origin_failure_is_unknown_and_not_cached() {
        let (authority, player) = fixture();
        let mut spy = SpyAuthority::new(authority);
        spy.fail_nodes = true;
        let spy = Arc::new(spy);
        let resolver = resolver(spy.clone());

        assert_eq!(
            resolver.resolve_alert_origin(&player, "server.ban").as_deref(),
            Some(UNKNOWN_ORIGIN)
        );
        assert_eq!(resolver.cache_sizes().origins, 0);
    }

    #[test]
    fn test_coverage_cache_trims_at_limit() {
        let (authority, _) = fixture();
        let resolver = resolver(Arc::new(authority));
        let context = ContextSet::server("survival");

        for i in 0..1001 {
            resolver.is_granted_to_defaults(&context, &format!("perm.{}", i));
        }
        assert_eq!(resolver.cache_sizes().coverage, 901);
    }

    #[test]
    fn test_origin_cache_trims_at_limit() {
        let (authority, player) = fixture();
        let resolver = resolver(Arc::new(authority));
        let context = ContextSet::server("survival");

        for i in 0..1001 {
            resolver.find_origin(player.id(), &context, &format!("perm.{}", i));
        }
        assert_eq!(
            resolver.cache_sizes(),
            CacheSizes {
                coverage: 0,
                origins: 901
            }
        );
    }

    #[test]
    fn test_cleanup_clears_large_caches_only() {
        let (authority, player) = fixture();
        let resolver = resolver(Arc::new(authority));
        let context = ContextSet::server("survival");

        for i in 0..501 {
            resolver.is_granted_to_defaults(&context, &format!("perm.{}", i));
        }
        resolver.find_origin(player.id(), &context, "server.ban");

        let report = resolver.cleanup();
        assert_eq!(report.coverage_cleared, Some(501));
        assert_eq!(report.origins_cleared, None);
        assert_eq!(
            resolver.cache_sizes(),
            CacheSizes {
                coverage: 0,
                origins: 1
            }
        );
    }

    #[test]
    fn test_from_settings() {
        let (authority, player) = fixture();
        let settings = Settings::builder()
            .default_groups(vec!["default".to_string()])
            .excluded_servers(vec!["survival".to_string()])
            .build();
        let resolver = OriginResolver::from_settings(Arc::new(authority), &settings);

        assert_eq!(resolver.default_groups(), ["default".to_string()]);
        assert_eq!(resolver.resolve_alert_origin(&player, "server.ban"), None);
    }

    #[test]
    fn test_independent_instances() {
        let (authority, player) = fixture();
        let authority: Arc<dyn PermissionAuthority> = Arc::new(authority);
        let a = resolver(authority.clone());
        let b = resolver(authority);

        a.resolve_alert_origin(&player, "server.ban");
        assert_eq!(a.cache_sizes().origins, 1);
        assert_eq!(b.cache_sizes(), CacheSizes::default());
    }
}
