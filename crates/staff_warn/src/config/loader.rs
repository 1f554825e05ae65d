//! Configuration loader.
//!
//! # Files
//!
//! | File                      | Contents                                   |
//! |---------------------------|--------------------------------------------|
//! | `config.toml`             | default groups, excluded servers, debug, cache |
//! | `commandPermissions.toml` | command → permission catalog               |
//! | `messages.toml`           | alert template                             |
//!
//! Missing files are created from the bundled defaults before loading. Any
//! read, parse or validation failure is fatal: the service must not start on
//! a partial configuration.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::defaults::{DEFAULT_COMMANDS_TOML, DEFAULT_CONFIG_TOML, DEFAULT_MESSAGES_TOML};
use super::{ConfigFile, MessagesFile, Settings};
use crate::catalog::CommandCatalog;
use crate::error::WarnError;

/// Main settings file name.
pub const CONFIG_FILE: &str = "config.toml";
/// Command catalog file name.
pub const COMMANDS_FILE: &str = "commandPermissions.toml";
/// Message template file name.
pub const MESSAGES_FILE: &str = "messages.toml";

/// Everything read from the data directory
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Runtime settings
    pub settings: Settings,
    /// Command → permission catalog
    pub catalog: CommandCatalog,
}

/// Loads settings and catalog from a data directory
///
/// # Example
///
/// ```no_run
/// use staff_warn::config::ConfigLoader;
///
/// let loaded = ConfigLoader::new("plugins/staffwarn").load()?;
/// println!("{} commands tracked", loaded.catalog.len());
/// # Ok::<(), staff_warn::error::WarnError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    data_dir: PathBuf,
    write_defaults: bool,
}

impl ConfigLoader {
    /// Create a loader for `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_defaults: true,
        }
    }

    /// Do not create missing files; a missing file becomes a read error.
    #[must_use]
    pub fn skip_default_files(mut self) -> Self {
        self.write_defaults = false;
        self
    }

    /// The directory this loader reads from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load all three files.
    ///
    /// # Errors
    ///
    /// Returns a config-class [`WarnError`] if a file cannot be created, read
    /// or parsed, or holds invalid values.
    pub fn load(&self) -> Result<LoadedConfig, WarnError> {
        if self.write_defaults && !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)
                .map_err(|e| WarnError::create_dir(&self.data_dir, e))?;
            info!("Created config folder: {}", self.data_dir.display());
        }

        let (path, source) = self.read_or_create(COMMANDS_FILE, DEFAULT_COMMANDS_TOML)?;
        let catalog =
            CommandCatalog::from_toml_str(&source).map_err(|e| WarnError::parse_toml(&path, e))?;
        debug!("Command permission map created with {} entries", catalog.len());

        let (path, source) = self.read_or_create(CONFIG_FILE, DEFAULT_CONFIG_TOML)?;
        let config: ConfigFile =
            toml::from_str(&source).map_err(|e| WarnError::parse_toml(&path, e))?;

        let (path, source) = self.read_or_create(MESSAGES_FILE, DEFAULT_MESSAGES_TOML)?;
        let messages: MessagesFile =
            toml::from_str(&source).map_err(|e| WarnError::parse_toml(&path, e))?;

        let settings = config.into_settings(messages)?;

        info!("Loaded {} command permissions", catalog.len());
        info!(
            "Configured with {} default groups and {} excluded servers",
            settings.default_groups.len(),
            settings.excluded_servers.len()
        );
        if settings.default_groups.is_empty() {
            warn!("No default groups configured; every tracked command will alert");
        }
        if settings.verbose {
            debug!("Default groups: {}", settings.default_groups.join(", "));
            debug!("Excluded servers: {}", settings.excluded_servers.join(", "));
        }

        Ok(LoadedConfig { settings, catalog })
    }

    fn read_or_create(&self, file: &str, default: &str) -> Result<(PathBuf, String), WarnError> {
        let path = self.data_dir.join(file);

        if self.write_defaults && !path.exists() {
            info!("Creating default config at: {}", path.display());
            fs::write(&path, default).map_err(|e| WarnError::write_file(&path, e))?;
        }

        let source = fs::read_to_string(&path).map_err(|e| WarnError::read_file(&path, e))?;
        Ok((path, source))
    }
}
