//! Permission authority abstraction.
//!
//! The resolver never looks inside the permission store. It asks two
//! questions through [`PermissionAuthority`]:
//!
//! 1. Does group G have permission P in context C?
//! 2. Which nodes does player U inherit in context C, and where from?
//!
//! Each deployment target provides one adapter implementing the trait. This
//! crate ships [`InMemoryAuthority`], a self-contained group store with
//! inheritance and context-scoped grants, used by the test suite and demos.
//!
//! # Example
//!
//! ```
//! use staff_warn::authority::{InMemoryAuthority, PermissionAuthority};
//! use staff_warn::context::ContextSet;
//! use uuid::Uuid;
//!
//! let authority = InMemoryAuthority::new();
//! let player = Uuid::new_v4();
//! authority.grant_group("staff", "server.ban", ContextSet::empty());
//! authority.add_player_group(player, "staff", ContextSet::empty());
//!
//! let context = ContextSet::server("survival");
//! assert!(authority.group_has_permission("staff", "server.ban", &context).unwrap());
//! assert_eq!(
//!     authority.resolve_inherited_origin(player, "server.ban", &context).unwrap(),
//!     "staff"
//! );
//! ```

mod memory;

pub use memory::InMemoryAuthority;

use crate::context::ContextSet;
use crate::error::AuthorityError;
use uuid::Uuid;

/// Origin reported when the authority cannot explain a grant.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// A permission node as seen on a player's resolved inheritance graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritedNode {
    /// Permission key, e.g. `server.ban`
    pub key: String,
    /// Whether the node grants (`true`) or negates (`false`) the key
    pub value: bool,
    /// Group the node was inherited from; `None` for direct grants
    pub origin: Option<String>,
}

impl InheritedNode {
    /// A node inherited from `group`.
    pub fn from_group(key: impl Into<String>, value: bool, group: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value,
            origin: Some(group.into()),
        }
    }

    /// A node set directly on the player.
    pub fn direct(key: impl Into<String>, value: bool) -> Self {
        Self {
            key: key.into(),
            value,
            origin: None,
        }
    }
}

/// Queryable permission store
///
/// Calls are synchronous and may block; callers run them off any
/// latency-critical thread.
pub trait PermissionAuthority: Send + Sync {
    /// Whether `group`'s effective permissions grant `permission` in `context`.
    ///
    /// # Errors
    ///
    /// * [`AuthorityError::Unavailable`] if the authority cannot be queried at all
    /// * [`AuthorityError::UnknownGroup`] if the group does not exist
    fn group_has_permission(
        &self,
        group: &str,
        permission: &str,
        context: &ContextSet,
    ) -> Result<bool, AuthorityError>;

    /// The player's distinct inherited nodes in `context`, in resolution order.
    ///
    /// Each key appears at most once; the first occurrence wins.
    fn inherited_nodes(
        &self,
        player: Uuid,
        context: &ContextSet,
    ) -> Result<Vec<InheritedNode>, AuthorityError>;

    /// Name of the group through which the player holds `permission`.
    ///
    /// Takes the first inherited node whose key matches and reads its origin.
    /// Returns [`UNKNOWN_ORIGIN`] when no node matches or the match carries no
    /// origin.
    fn resolve_inherited_origin(
        &self,
        player: Uuid,
        permission: &str,
        context: &ContextSet,
    ) -> Result<String, AuthorityError> {
        Ok(self
            .inherited_nodes(player, context)?
            .into_iter()
            .find(|node| node.key == permission)
            .and_then(|node| node.origin)
            .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNodes(Vec<InheritedNode>);

    impl PermissionAuthority for FixedNodes {
        fn group_has_permission(
            &self,
            _group: &str,
            _permission: &str,
            _context: &ContextSet,
        ) -> Result<bool, AuthorityError> {
            Ok(false)
        }

        fn inherited_nodes(
            &self,
            _player: Uuid,
            _context: &ContextSet,
        ) -> Result<Vec<InheritedNode>, AuthorityError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_first_matching_node_wins() {
        let authority = FixedNodes(vec![
            InheritedNode::from_group("chat.color", true, "vip"),
            InheritedNode::from_group("server.ban", true, "moderator"),
            InheritedNode::from_group("server.ban", true, "admin"),
        ]);

        let origin = authority
            .resolve_inherited_origin(Uuid::nil(), "server.ban", &ContextSet::empty())
            .unwrap();
        assert_eq!(origin, "moderator");
    }

    #[test]
    fn test_no_match_is_unknown() {
        let authority = FixedNodes(vec![InheritedNode::from_group("chat.color", true, "vip")]);

        let origin = authority
            .resolve_inherited_origin(Uuid::nil(), "server.ban", &ContextSet::empty())
            .unwrap();
        assert_eq!(origin, UNKNOWN_ORIGIN);
    }

    #[test]
    fn test_direct_grant_is_unknown() {
        let authority = FixedNodes(vec![InheritedNode::direct("server.ban", true)]);

        let origin = authority
            .resolve_inherited_origin(Uuid::nil(), "server.ban", &ContextSet::empty())
            .unwrap();
        assert_eq!(origin, UNKNOWN_ORIGIN);
    }

    #[test]
    fn test_trait_object() {
        let authority: Box<dyn PermissionAuthority> = Box::new(FixedNodes(vec![]));
        assert!(!authority
            .group_has_permission("default", "server.ban", &ContextSet::empty())
            .unwrap());
    }
}
