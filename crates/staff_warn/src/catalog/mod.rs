//! Command → permission catalog.
//!
//! The catalog says which permission a command requires. It is loaded once at
//! startup (usually from `commandPermissions.toml`) and only read afterwards.
//! Commands missing from the catalog are not tracked and never alert.
//!
//! # Example
//!
//! ```
//! use staff_warn::catalog::{CommandCatalog, base_command};
//!
//! let catalog = CommandCatalog::from_toml_str(r#"
//! ban = "server.ban"
//! Kick = "server.kick"
//! "#).unwrap();
//!
//! assert_eq!(catalog.permission_for("kick"), Some("server.kick"));
//! assert_eq!(base_command("/BAN Notch griefing").as_deref(), Some("ban"));
//! ```

mod generate;

pub use generate::{generate_catalog, render_catalog_toml, CommandRow, PermissionRow};

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

/// Immutable mapping of lowercase command names to permission strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCatalog {
    commands: HashMap<String, String>,
}

impl CommandCatalog {
    /// Build a catalog, lowercasing every command name.
    ///
    /// When two names collide after lowercasing, the first one in iteration
    /// order is kept.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = entries.into_iter();
        let mut commands = HashMap::with_capacity(entries.size_hint().0);

        for (command, permission) in entries {
            let command = command.as_ref().to_lowercase();
            let permission = permission.into();
            if let Some(existing) = commands.get(&command) {
                warn!(
                    "Ignoring duplicate command '{}' -> '{}' (already mapped to '{}')",
                    command, permission, existing
                );
                continue;
            }
            commands.insert(command, permission);
        }

        Self { commands }
    }

    /// Parse a flat TOML table of `command = "permission"` pairs.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let table: BTreeMap<String, String> = toml::from_str(source)?;
        Ok(Self::new(table))
    }

    /// Permission required by `command`. The name must already be lowercase.
    pub fn permission_for(&self, command: &str) -> Option<&str> {
        self.commands.get(command).map(String::as_str)
    }

    /// Number of tracked commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is tracked.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate `(command, permission)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands
            .iter()
            .map(|(command, permission)| (command.as_str(), permission.as_str()))
    }
}

/// Extract the lowercase base command from raw command text.
///
/// Strips one leading `/` and keeps the first whitespace-separated token.
/// Returns `None` when nothing is left.
pub fn base_command(raw: &str) -> Option<String> {
    let text = raw.strip_prefix('/').unwrap_or(raw);
    text.split_whitespace()
        .next()
        .map(str::to_lowercase)
}
