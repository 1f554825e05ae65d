//! Service settings and their on-disk form.
//!
//! Settings come from three TOML files in a data directory (see
//! [`ConfigLoader`]); tests and embedders can also build them directly:
//!
//! ```
//! use staff_warn::config::Settings;
//! use std::time::Duration;
//!
//! let settings = Settings::builder()
//!     .default_groups(vec!["default".to_string()])
//!     .excluded_servers(vec!["Lobby".to_string()])
//!     .cleanup_interval(Duration::from_secs(60))
//!     .build();
//!
//! assert!(settings.is_excluded("lobby"));
//! ```

mod defaults;
mod loader;

pub use defaults::{DEFAULT_COMMANDS_TOML, DEFAULT_CONFIG_TOML, DEFAULT_MESSAGES_TOML};
pub use loader::{ConfigLoader, LoadedConfig, COMMANDS_FILE, CONFIG_FILE, MESSAGES_FILE};

use std::time::Duration;

use serde::Deserialize;

use crate::alert::AlertTemplate;
use crate::cache::CacheLimits;
use crate::error::WarnError;

/// Default period of the cache cleanup task.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Runtime settings, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Groups every ordinary player has
    pub default_groups: Vec<String>,
    /// Lowercased context ids where alerting is off
    pub excluded_servers: Vec<String>,
    /// Log every skip and alert decision at debug level
    pub verbose: bool,
    /// Alert message template
    pub alert_template: AlertTemplate,
    /// Bounds for both resolver caches
    pub cache_limits: CacheLimits,
    /// Period of the cleanup task
    pub cleanup_interval: Duration,
}

impl Settings {
    /// Create a new builder.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Whether alerting is off in `context_id` (compared lowercased).
    pub fn is_excluded(&self, context_id: &str) -> bool {
        let context_id = context_id.to_lowercase();
        self.excluded_servers.iter().any(|s| *s == context_id)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`Settings`].
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    default_groups: Vec<String>,
    excluded_servers: Vec<String>,
    verbose: bool,
    alert_template: Option<AlertTemplate>,
    cache_limits: Option<CacheLimits>,
    cleanup_interval: Option<Duration>,
}

impl SettingsBuilder {
    /// Set the default (baseline) groups.
    pub fn default_groups(mut self, groups: Vec<String>) -> Self {
        self.default_groups = groups;
        self
    }

    /// Set the excluded context ids. They are lowercased on build.
    pub fn excluded_servers(mut self, servers: Vec<String>) -> Self {
        self.excluded_servers = servers;
        self
    }

    /// Enable verbose decision logging.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the alert template.
    pub fn alert_template(mut self, template: AlertTemplate) -> Self {
        self.alert_template = Some(template);
        self
    }

    /// Set the cache limits.
    pub fn cache_limits(mut self, limits: CacheLimits) -> Self {
        self.cache_limits = Some(limits);
        self
    }

    /// Set the cleanup period.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the settings.
    pub fn build(self) -> Settings {
        Settings {
            default_groups: self.default_groups,
            excluded_servers: self
                .excluded_servers
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            verbose: self.verbose,
            alert_template: self.alert_template.unwrap_or_default(),
            cache_limits: self.cache_limits.unwrap_or_default(),
            cleanup_interval: self.cleanup_interval.unwrap_or(DEFAULT_CLEANUP_INTERVAL),
        }
    }
}

/// `config.toml`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigFile {
    pub default_groups: Vec<String>,
    pub excluded_servers: Vec<String>,
    #[serde(default)]
    pub debug: DebugSection,
    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DebugSection {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CacheSection {
    pub max_entries: usize,
    pub trim_batch: usize,
    pub cleanup_threshold: usize,
    pub cleanup_interval_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        let limits = CacheLimits::default();
        Self {
            max_entries: limits.max_entries,
            trim_batch: limits.trim_batch,
            cleanup_threshold: limits.cleanup_threshold,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL.as_secs(),
        }
    }
}

/// `messages.toml`
#[derive(Debug, Deserialize)]
pub(crate) struct MessagesFile {
    pub alert: String,
}

impl ConfigFile {
    /// Validate and combine with the message template.
    pub(crate) fn into_settings(self, messages: MessagesFile) -> Result<Settings, WarnError> {
        if self.cache.cleanup_interval_secs == 0 {
            return Err(WarnError::InvalidConfig(
                "cache.cleanupIntervalSecs must be greater than zero".to_string(),
            ));
        }
        if self.cache.trim_batch == 0 {
            return Err(WarnError::InvalidConfig(
                "cache.trimBatch must be greater than zero".to_string(),
            ));
        }

        Ok(Settings::builder()
            .default_groups(self.default_groups)
            .excluded_servers(self.excluded_servers)
            .verbose(self.debug.verbose)
            .alert_template(AlertTemplate::new(messages.alert))
            .cache_limits(CacheLimits {
                max_entries: self.cache.max_entries,
                trim_batch: self.cache.trim_batch,
                cleanup_threshold: self.cache.cleanup_threshold,
            })
            .cleanup_interval(Duration::from_secs(self.cache.cleanup_interval_secs))
            .build())
    }
}
