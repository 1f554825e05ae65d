//! In-memory permission authority.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{InheritedNode, PermissionAuthority};
use crate::context::ContextSet;
use crate::error::AuthorityError;

#[derive(Debug, Clone)]
struct Node {
    key: String,
    value: bool,
    context: ContextSet,
}

#[derive(Debug, Clone)]
struct Inheritance {
    group: String,
    context: ContextSet,
}

#[derive(Debug, Clone, Default)]
struct Holder {
    nodes: Vec<Node>,
    parents: Vec<Inheritance>,
}

/// Group store with inheritance and context-scoped nodes
///
/// Resolution order for a player: nodes set directly on the player, then each
/// group membership in insertion order, walking a group's own nodes before its
/// parents (depth-first). Only nodes and memberships whose context is
/// satisfied by the query context take part. Direct nodes carry no origin.
///
/// All mutators take `&self`, so the store can be shared behind an `Arc` and
/// edited while a resolver is running.
///
/// # Examples
///
/// ```
/// use staff_warn::authority::{InMemoryAuthority, PermissionAuthority};
/// use staff_warn::context::ContextSet;
///
/// let authority = InMemoryAuthority::new();
/// authority.grant_group("builder", "worldedit.wand", ContextSet::server("creative"));
///
/// let creative = ContextSet::server("creative");
/// let survival = ContextSet::server("survival");
/// assert!(authority.group_has_permission("builder", "worldedit.wand", &creative).unwrap());
/// assert!(!authority.group_has_permission("builder", "worldedit.wand", &survival).unwrap());
/// ```
#[derive(Debug)]
pub struct InMemoryAuthority {
    groups: DashMap<String, Holder>,
    players: DashMap<Uuid, Holder>,
    available: AtomicBool,
    queries: AtomicUsize,
}

impl InMemoryAuthority {
    /// Create an empty, available store.
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            players: DashMap::new(),
            available: AtomicBool::new(true),
            queries: AtomicUsize::new(0),
        }
    }

    /// Create a group with no nodes. Does nothing if it exists.
    pub fn add_group(&self, group: impl Into<String>) -> &Self {
        self.groups.entry(group.into()).or_default();
        self
    }

    /// Grant `permission` to `group` within `context`, creating the group.
    pub fn grant_group(
        &self,
        group: impl Into<String>,
        permission: impl Into<String>,
        context: ContextSet,
    ) -> &Self {
        self.set_group_node(group.into(), permission.into(), true, context)
    }

    /// Negate `permission` on `group` within `context`, creating the group.
    pub fn deny_group(
        &self,
        group: impl Into<String>,
        permission: impl Into<String>,
        context: ContextSet,
    ) -> &Self {
        self.set_group_node(group.into(), permission.into(), false, context)
    }

    /// Make `group` inherit from `parent` within `context`.
    pub fn add_group_parent(
        &self,
        group: impl Into<String>,
        parent: impl Into<String>,
        context: ContextSet,
    ) -> &Self {
        self.groups
            .entry(group.into())
            .or_default()
            .parents
            .push(Inheritance {
                group: parent.into(),
                context,
            });
        self
    }

    /// Grant `permission` directly to `player` within `context`.
    pub fn grant_player(
        &self,
        player: Uuid,
        permission: impl Into<String>,
        context: ContextSet,
    ) -> &Self {
        self.players.entry(player).or_default().nodes.push(Node {
            key: permission.into(),
            value: true,
            context,
        });
        self
    }

    /// Add `player` to `group` within `context`.
    pub fn add_player_group(
        &self,
        player: Uuid,
        group: impl Into<String>,
        context: ContextSet,
    ) -> &Self {
        self.players.entry(player).or_default().parents.push(Inheritance {
            group: group.into(),
            context,
        });
        self
    }

    /// Simulate the authority going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of trait queries served so far, failed ones included.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn set_group_node(&self, group: String, key: String, value: bool, context: ContextSet) -> &Self {
        self.groups
            .entry(group)
            .or_default()
            .nodes
            .push(Node { key, value, context });
        self
    }

    fn begin_query(&self) -> Result<(), AuthorityError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthorityError::Unavailable(
                "in-memory authority disabled".to_string(),
            ))
        }
    }

    /// Append `holder`'s applicable nodes, then walk its applicable parents.
    fn walk(
        &self,
        holder: &Holder,
        origin: Option<&str>,
        context: &ContextSet,
        visited: &mut HashSet<String>,
        seen: &mut HashSet<String>,
        out: &mut Vec<InheritedNode>,
    ) {
        for node in &holder.nodes {
            if node.context.is_satisfied_by(context) && seen.insert(node.key.clone()) {
                out.push(InheritedNode {
                    key: node.key.clone(),
                    value: node.value,
                    origin: origin.map(str::to_string),
                });
            }
        }

        for parent in &holder.parents {
            if !parent.context.is_satisfied_by(context) || !visited.insert(parent.group.clone()) {
                continue;
            }
            // Clone out of the map so no shard guard is held while recursing.
            let Some(group) = self.groups.get(&parent.group).map(|g| g.value().clone()) else {
                debug!("Skipping missing parent group '{}'", parent.group);
                continue;
            };
            self.walk(&group, Some(&parent.group), context, visited, seen, out);
        }
    }
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionAuthority for InMemoryAuthority {
    fn group_has_permission(
        &self,
        group: &str,
        permission: &str,
        context: &ContextSet,
    ) -> Result<bool, AuthorityError> {
        self.begin_query()?;

        let holder = self
            .groups
            .get(group)
            .map(|g| g.value().clone())
            .ok_or_else(|| AuthorityError::UnknownGroup(group.to_string()))?;

        let mut visited = HashSet::from([group.to_string()]);
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        self.walk(&holder, Some(group), context, &mut visited, &mut seen, &mut nodes);

        Ok(nodes
            .iter()
            .find(|node| node.key == permission)
            .is_some_and(|node| node.value))
    }

    fn inherited_nodes(
        &self,
        player: Uuid,
        context: &ContextSet,
    ) -> Result<Vec<InheritedNode>, AuthorityError> {
        self.begin_query()?;

        let holder = self
            .players
            .get(&player)
            .map(|p| p.value().clone())
            .ok_or(AuthorityError::UnknownPlayer(player))?;

        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        self.walk(&holder, None, context, &mut visited, &mut seen, &mut nodes);
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::UNKNOWN_ORIGIN;

    fn global() -> ContextSet {
        ContextSet::empty()
    }

    #[test]
    fn test_group_grant() {
        let authority = InMemoryAuthority::new();
        authority.grant_group("staff", "server.ban", global());

        let context = ContextSet::server("survival");
        assert!(authority.group_has_permission("staff", "server.ban", &context).unwrap());
        assert!(!authority.group_has_permission("staff", "server.kick", &context).unwrap());
    }

    #[test]
    fn test_unknown_group() {
        let authority = InMemoryAuthority::new();
        let err = authority
            .group_has_permission("ghost", "server.ban", &global())
            .unwrap_err();
        assert_eq!(err, AuthorityError::UnknownGroup("ghost".to_string()));
    }

    #[test]
    fn test_empty_group_grants_nothing() {
        let authority = InMemoryAuthority::new();
        authority.add_group("default");
        assert!(!authority.group_has_permission("default", "server.ban", &global()).unwrap());
    }

    #[test]
    fn test_inherited_group_grant() {
        let authority = InMemoryAuthority::new();
        authority
            .grant_group("moderator", "server.kick", global())
            .add_group_parent("admin", "moderator", global());

        assert!(authority.group_has_permission("admin", "server.kick", &global()).unwrap());
    }

    #[test]
    fn test_negation_shadows_parent() {
        let authority = InMemoryAuthority::new();
        authority
            .grant_group("moderator", "server.kick", global())
            .deny_group("trial", "server.kick", global())
            .add_group_parent("trial", "moderator", global());

        assert!(!authority.group_has_permission("trial", "server.kick", &global()).unwrap());
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let authority = InMemoryAuthority::new();
        authority
            .add_group_parent("a", "b", global())
            .add_group_parent("b", "a", global())
            .grant_group("b", "loop.ok", global());

        assert!(authority.group_has_permission("a", "loop.ok", &global()).unwrap());
    }

    #[test]
    fn test_player_origin_through_group() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        authority
            .grant_group("staff", "server.ban", global())
            .add_player_group(player, "staff", global());

        let origin = authority
            .resolve_inherited_origin(player, "server.ban", &ContextSet::server("survival"))
            .unwrap();
        assert_eq!(origin, "staff");
    }

    #[test]
    fn test_player_origin_through_parent_group() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        authority
            .grant_group("moderator", "server.kick", global())
            .add_group_parent("admin", "moderator", global())
            .add_player_group(player, "admin", global());

        let origin = authority
            .resolve_inherited_origin(player, "server.kick", &global())
            .unwrap();
        assert_eq!(origin, "moderator");
    }

    #[test]
    fn test_direct_player_grant_has_no_origin() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        authority
            .grant_player(player, "server.ban", global())
            .grant_group("staff", "server.ban", global())
            .add_player_group(player, "staff", global());

        let nodes = authority.inherited_nodes(player, &global()).unwrap();
        assert_eq!(nodes, vec![InheritedNode::direct("server.ban", true)]);
        assert_eq!(
            authority
                .resolve_inherited_origin(player, "server.ban", &global())
                .unwrap(),
            UNKNOWN_ORIGIN
        );
    }

    #[test]
    fn test_membership_order_decides_origin() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        authority
            .grant_group("helper", "server.mute", global())
            .grant_group("moderator", "server.mute", global())
            .add_player_group(player, "helper", global())
            .add_player_group(player, "moderator", global());

        assert_eq!(
            authority
                .resolve_inherited_origin(player, "server.mute", &global())
                .unwrap(),
            "helper"
        );
    }

    #[test]
    fn test_context_scoped_membership() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        authority
            .grant_group("builder", "worldedit.wand", global())
            .add_player_group(player, "builder", ContextSet::server("creative"));

        let creative = authority
            .inherited_nodes(player, &ContextSet::server("creative"))
            .unwrap();
        let survival = authority
            .inherited_nodes(player, &ContextSet::server("survival"))
            .unwrap();
        assert_eq!(creative.len(), 1);
        assert!(survival.is_empty());
    }

    #[test]
    fn test_unknown_player() {
        let authority = InMemoryAuthority::new();
        let player = Uuid::new_v4();
        let err = authority.inherited_nodes(player, &global()).unwrap_err();
        assert_eq!(err, AuthorityError::UnknownPlayer(player));
    }

    #[test]
    fn test_unavailable_and_query_count() {
        let authority = InMemoryAuthority::new();
        authority.add_group("default");
        authority.set_available(false);

        let err = authority
            .group_has_permission("default", "server.ban", &global())
            .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(authority.query_count(), 1);

        authority.set_available(true);
        assert!(authority.group_has_permission("default", "server.ban", &global()).is_ok());
        assert_eq!(authority.query_count(), 2);
    }
}
