//! Immutable permission query contexts.
//!
//! A [`ContextSet`] scopes a permission query, e.g. "on the survival server".
//! Each key maps to a set of values. Grants in the authority may carry their
//! own context requirements; a grant applies to a query when every key it
//! requires is present in the query with at least one matching value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Context key naming the world or backend server a player is on.
pub const SERVER_KEY: &str = "server";

/// Context id used in cache keys when a context carries no server value.
pub const GLOBAL_CONTEXT: &str = "global";

/// Immutable set of context key/value pairs
///
/// # Examples
///
/// ```
/// use staff_warn::context::ContextSet;
///
/// let context = ContextSet::server("survival");
/// assert_eq!(context.server_id(), "survival");
/// assert_eq!(ContextSet::empty().server_id(), "global");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextSet {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl ContextSet {
    /// A context with no entries (global scope).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A context carrying only `server = id`.
    pub fn server(id: impl Into<String>) -> Self {
        Self::builder().add(SERVER_KEY, id).build()
    }

    /// Start building a context.
    pub fn builder() -> ContextSetBuilder {
        ContextSetBuilder::default()
    }

    /// All values stored under `key`, in sorted order.
    pub fn values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .get(key)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    /// The first value stored under `key`, if any.
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.values(key).next()
    }

    /// The context id used in cache keys: the server value or `"global"`.
    pub fn server_id(&self) -> &str {
        self.first_value(SERVER_KEY).unwrap_or(GLOBAL_CONTEXT)
    }

    /// Whether `key = value` is part of this context.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    /// Whether the context has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a grant scoped to `self` applies to a query made in `query`.
    ///
    /// An empty requirement applies everywhere.
    pub fn is_satisfied_by(&self, query: &ContextSet) -> bool {
        self.entries.iter().all(|(key, required)| {
            required
                .iter()
                .any(|value| query.contains(key, value))
        })
    }
}

impl fmt::Display for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, values) in &self.entries {
            for value in values {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", key, value)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Builder for [`ContextSet`].
#[derive(Debug, Default)]
pub struct ContextSetBuilder {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl ContextSetBuilder {
    /// Add a key/value pair. Keys may hold several values.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(value.into());
        self
    }

    /// Freeze the context.
    pub fn build(self) -> ContextSet {
        ContextSet {
            entries: self.entries,
        }
    }
}
