//! Catalog generation from plugin dumps.
//!
//! Server tooling can export two tables as JSON, each wrapped in a `data`
//! array of rows:
//!
//! - commands: `[plugin, command, aliases, description, help]`, where
//!   `aliases` is a comma-separated string (or empty / null)
//! - permissions: `[plugin, command, node, description]`
//!
//! For every command with at least one permission row, the shortest node
//! wins (the first one on ties) and all of the command's aliases map to it.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::WarnError;

#[derive(Deserialize)]
struct Dump {
    data: Vec<Vec<Value>>,
}

fn text_at(row: &[Value], index: usize) -> Option<String> {
    row.get(index)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One row of the commands dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRow {
    /// Owning plugin
    pub plugin: Option<String>,
    /// Primary command name
    pub command: String,
    /// Alternative names for the command
    pub aliases: Vec<String>,
}

impl CommandRow {
    /// Parse a commands dump. Rows without a command name are skipped.
    pub fn parse_dump(json: &str) -> Result<Vec<Self>, WarnError> {
        let dump: Dump = serde_json::from_str(json)?;
        Ok(dump
            .data
            .iter()
            .filter_map(|row| {
                let command = text_at(row, 1)?;
                let aliases = text_at(row, 2)
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|alias| !alias.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Some(CommandRow {
                    plugin: text_at(row, 0),
                    command,
                    aliases,
                })
            })
            .collect())
    }
}

/// One row of the permissions dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRow {
    /// Owning plugin
    pub plugin: Option<String>,
    /// Command the node guards, if any
    pub command: Option<String>,
    /// Permission node
    pub node: Option<String>,
}

impl PermissionRow {
    /// Parse a permissions dump.
    pub fn parse_dump(json: &str) -> Result<Vec<Self>, WarnError> {
        let dump: Dump = serde_json::from_str(json)?;
        Ok(dump
            .data
            .iter()
            .map(|row| PermissionRow {
                plugin: text_at(row, 0),
                command: text_at(row, 1),
                node: text_at(row, 2),
            })
            .collect())
    }
}

/// Build a `command → permission` table from parsed dumps.
///
/// Commands absent from `commands` are ignored, as are permission rows
/// without a command or node. Names are lowercased. A command's own name
/// always keeps its own node; when aliases collide, the alphabetically first
/// command keeps the alias.
pub fn generate_catalog(
    commands: &[CommandRow],
    permissions: &[PermissionRow],
) -> BTreeMap<String, String> {
    let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in commands {
        aliases
            .entry(row.command.to_lowercase())
            .or_default()
            .extend(row.aliases.iter().map(|alias| alias.to_lowercase()));
    }

    let mut shortest: BTreeMap<String, String> = BTreeMap::new();
    for row in permissions {
        let (Some(command), Some(node)) = (&row.command, &row.node) else {
            continue;
        };
        let command = command.to_lowercase();
        if !aliases.contains_key(&command) {
            continue;
        }
        match shortest.get(&command) {
            Some(existing) if existing.len() <= node.len() => {}
            _ => {
                shortest.insert(command, node.clone());
            }
        }
    }

    // Own names first: a command's name always beats another command's alias.
    let mut catalog = shortest.clone();
    for (command, node) in &shortest {
        for alias in aliases.get(command).into_iter().flatten() {
            catalog.entry(alias.clone()).or_insert_with(|| node.clone());
        }
    }
    catalog
}

/// Render a generated table as `commandPermissions.toml` content.
pub fn render_catalog_toml(catalog: &BTreeMap<String, String>) -> Result<String, WarnError> {
    Ok(toml::to_string(catalog)?)
}
