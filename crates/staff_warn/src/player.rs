//! Host-side view of a player.
//!
//! Host front ends (a game server, a proxy) wrap their own player objects in
//! the [`Player`] trait. The resolver only needs the id and current context;
//! the command monitor also checks permissions and whether the player is
//! still online before delivering an alert.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

/// A connected player as seen by the host
pub trait Player: Send + Sync {
    /// Stable player identity.
    fn id(&self) -> Uuid;

    /// Display name for logs.
    fn name(&self) -> &str;

    /// World or backend server the player is on, if the host knows it.
    fn current_context(&self) -> Option<String>;

    /// The host's own permission check for this player.
    fn has_permission(&self, permission: &str) -> bool;

    /// Whether the player is still connected.
    fn is_online(&self) -> bool {
        true
    }
}

/// Fixed snapshot of a player, for hosts that copy state out of their own
/// player objects and for tests
///
/// # Examples
///
/// ```
/// use staff_warn::player::{Player, SnapshotPlayer};
///
/// let player = SnapshotPlayer::new("Notch")
///     .on_server("survival")
///     .with_permission("server.ban");
///
/// assert_eq!(player.current_context().as_deref(), Some("survival"));
/// assert!(player.has_permission("server.ban"));
/// assert!(!player.has_permission("server.stop"));
/// ```
#[derive(Debug)]
pub struct SnapshotPlayer {
    id: Uuid,
    name: String,
    context: Option<String>,
    permissions: HashSet<String>,
    online: AtomicBool,
}

impl SnapshotPlayer {
    /// A new online player with a random id, no context and no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            context: None,
            permissions: HashSet::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Use a specific id.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Place the player on a world or server.
    pub fn on_server(mut self, server: impl Into<String>) -> Self {
        self.context = Some(server.into());
        self
    }

    /// Add a permission the host reports for this player.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Mark the player as disconnected.
    pub fn disconnect(&self) {
        self.online.store(false, Ordering::SeqCst);
    }
}

impl Clone for SnapshotPlayer {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            context: self.context.clone(),
            permissions: self.permissions.clone(),
            online: AtomicBool::new(self.online.load(Ordering::SeqCst)),
        }
    }
}

impl Player for SnapshotPlayer {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn current_context(&self) -> Option<String> {
        self.context.clone()
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
