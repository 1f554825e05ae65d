//! Bundled default configuration files.
//!
//! Written to the data directory when a file is missing.

/// Default `config.toml`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# Groups every ordinary player has. Commands these groups can already run
# never raise an alert.
defaultGroups = ["default"]

# Worlds or backend servers where alerts are disabled.
excludedServers = []

[debug]
# Log why each tracked command did or did not alert.
verbose = false

[cache]
maxEntries = 1000
trimBatch = 100
cleanupThreshold = 500
cleanupIntervalSecs = 300
"#;

/// Default `messages.toml`.
pub const DEFAULT_MESSAGES_TOML: &str = r#"# Placeholders: %command%, %permission%, %origin%
alert = "[StaffWarn] %command% requires %permission%, which you hold through %origin%"
"#;

/// Default `commandPermissions.toml`.
pub const DEFAULT_COMMANDS_TOML: &str = r#"# command = "permission node"
ban = "minecraft.command.ban"
ban-ip = "minecraft.command.ban-ip"
deop = "minecraft.command.deop"
gamemode = "minecraft.command.gamemode"
give = "minecraft.command.give"
kick = "minecraft.command.kick"
op = "minecraft.command.op"
pardon = "minecraft.command.pardon"
stop = "minecraft.command.stop"
tp = "minecraft.command.teleport"
whitelist = "minecraft.command.whitelist"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::DEFAULT_ALERT_TEMPLATE;
    use crate::catalog::CommandCatalog;
    use crate::config::{ConfigFile, MessagesFile};

    #[test]
    fn test_default_config_parses() {
        let file: ConfigFile = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(file.default_groups, vec!["default"]);
        assert!(file.excluded_servers.is_empty());
    }

    #[test]
    fn test_default_messages_match_template() {
        let file: MessagesFile = toml::from_str(DEFAULT_MESSAGES_TOML).unwrap();
        assert_eq!(file.alert, DEFAULT_ALERT_TEMPLATE);
    }

    #[test]
    fn test_default_commands_parse() {
        let catalog = CommandCatalog::from_toml_str(DEFAULT_COMMANDS_TOML).unwrap();
        assert_eq!(catalog.permission_for("tp"), Some("minecraft.command.teleport"));
        assert_eq!(catalog.len(), 11);
    }
}
