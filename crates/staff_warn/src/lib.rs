//! StaffWarn - command privilege alerts for game server staff
//!
//! When a player runs a tracked command, StaffWarn works out whether the
//! permission it needs is something every ordinary player already has. If
//! not, it finds the group the player inherited it from and tells the player,
//! so staff notice when they are acting on elevated privilege.
//!
//! # Overview
//!
//! - A pluggable [`PermissionAuthority`](authority::PermissionAuthority)
//!   answers group and inheritance queries
//! - [`OriginResolver`](resolver::OriginResolver) decides whether to alert
//!   and caches both answers in bounded concurrent maps
//! - [`CommandMonitor`](monitor::CommandMonitor) filters command events and
//!   runs resolution off the caller's thread
//! - A periodic task clears oversized caches
//! - Settings, the command catalog and the alert template load from TOML
//!
//! # Architecture
//!
//! - `authority`: permission backend trait and an in-memory implementation
//! - `resolver`: alert decision and origin lookup
//! - `cache`: bounded concurrent cache with trim and cleanup
//! - `monitor`: command event pipeline
//! - `service`: wiring for hosts
//! - `config`: file loading and defaults
//! - `catalog`: command → permission map and its generator
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use staff_warn::prelude::*;
//!
//! let authority = Arc::new(InMemoryAuthority::new());
//! authority
//!     .grant_group("default", "server.spawn", ContextSet::empty())
//!     .grant_group("moderator", "server.ban", ContextSet::empty());
//!
//! let player = SnapshotPlayer::new("Notch").on_server("survival");
//! authority.add_player_group(player.id(), "moderator", ContextSet::empty());
//!
//! let resolver = OriginResolver::builder(authority)
//!     .default_groups(vec!["default".to_string()])
//!     .build();
//!
//! assert_eq!(resolver.resolve_alert_origin(&player, "server.ban").as_deref(), Some("moderator"));
//! assert_eq!(resolver.resolve_alert_origin(&player, "server.spawn"), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Alert templates, alert values and delivery sinks
pub mod alert;

/// Permission backend abstraction
///
/// The `PermissionAuthority` trait is the only way the resolver learns about
/// groups and inheritance. `InMemoryAuthority` is a complete implementation
/// for tests, demos and hosts that keep permissions themselves.
pub mod authority;

/// Bounded concurrent cache
pub mod cache;

/// Command catalog and catalog generation from plugin dumps
pub mod catalog;

/// Settings, file loading and bundled defaults
pub mod config;

/// Permission contexts
pub mod context;

/// Error types
///
/// - `WarnError` - config, I/O and delivery failures (config-class errors are fatal at startup)
/// - `AuthorityError` - permission backend failures, never surfaced to players
pub mod error;

/// Periodic cache cleanup task
pub mod maintenance;

/// Command event pipeline
pub mod monitor;

/// Host player abstraction
pub mod player;

/// Alert decision and origin resolution
///
/// `OriginResolver` owns the coverage cache (`context:permission` → granted
/// to a default group) and the origin cache (`player:context:permission` →
/// group name).
pub mod resolver;

/// Service wiring for hosts
pub mod service;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for staff_warn users
    //!
    //! Use `use staff_warn::prelude::*;` to import commonly used types.

    pub use crate::alert::{Alert, AlertSink, AlertTemplate, ChannelAlertSink, LogAlertSink};
    pub use crate::authority::{InMemoryAuthority, InheritedNode, PermissionAuthority};
    pub use crate::cache::CacheLimits;
    pub use crate::catalog::CommandCatalog;
    pub use crate::config::{ConfigLoader, LoadedConfig, Settings};
    pub use crate::context::ContextSet;
    pub use crate::error::{AuthorityError, WarnError};
    pub use crate::monitor::CommandMonitor;
    pub use crate::player::{Player, SnapshotPlayer};
    pub use crate::resolver::OriginResolver;
    pub use crate::service::StaffWarn;
}
