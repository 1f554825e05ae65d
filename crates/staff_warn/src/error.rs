//! Error types for staff_warn
//!
//! This module defines the error hierarchy using `thiserror`. Two enums cover
//! the two very different failure classes of the crate:
//!
//! - [`WarnError`]: crate-wide errors. The config variants are fatal at
//!   startup; everything else is recovered close to where it happens.
//! - [`AuthorityError`]: failures talking to the permission authority. These
//!   never leave the resolver; they are logged and mapped to safe defaults.
//!
//! # Example
//!
//! ```rust
//! use staff_warn::error::WarnError;
//!
//! fn example() -> Result<(), WarnError> {
//!     // Auto-conversion from std::io::Error
//!     let _file = std::fs::read_to_string("/nonexistent")?;
//!     Ok(())
//! }
//!
//! assert!(example().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for staff_warn operations
///
/// Variants `ReadFile`, `ParseToml`, `WriteFile`, `CreateDir` and
/// `InvalidConfig` form the configuration class: any of them at startup means
/// the service must not run (see [`WarnError::is_config_error`]).
#[derive(Error, Debug)]
pub enum WarnError {
    /// A configuration file exists but could not be read
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML or misses required keys
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// A default configuration file could not be written
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The data directory could not be created
    #[error("failed to create config directory '{path}': {source}")]
    CreateDir {
        /// Directory that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration parsed but holds values the service cannot run with
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The permission authority failed
    #[error("permission authority error: {0}")]
    Authority(#[from] AuthorityError),

    /// An alert could not be handed to its recipient
    #[error("failed to deliver alert: {0}")]
    AlertDelivery(String),

    /// A plugin command or permission dump is not the expected JSON
    #[error("failed to parse plugin dump: {0}")]
    CatalogDump(#[from] serde_json::Error),

    /// A generated catalog could not be rendered as TOML
    #[error("failed to render catalog: {0}")]
    RenderCatalog(#[from] toml::ser::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WarnError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse TOML error.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    /// Creates a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the configuration class.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            WarnError::ReadFile { .. }
                | WarnError::ParseToml { .. }
                | WarnError::WriteFile { .. }
                | WarnError::CreateDir { .. }
                | WarnError::InvalidConfig(_)
        )
    }
}

/// Failure reported by a [`PermissionAuthority`](crate::authority::PermissionAuthority)
///
/// Only [`AuthorityError::Unavailable`] is treated as a failure of the
/// authority as a whole; the other variants concern a single group or player.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// The authority is not loaded or cannot be reached
    #[error("permission authority unavailable: {0}")]
    Unavailable(String),

    /// The named group does not exist in the authority
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// The authority has no data loaded for this player
    #[error("unknown player {0}")]
    UnknownPlayer(Uuid),

    /// A lookup failed for another reason
    #[error("permission lookup failed: {0}")]
    Query(String),
}

impl AuthorityError {
    /// Whether the whole authority is out, as opposed to one lookup failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthorityError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_message() {
        let err = WarnError::read_file(
            "config.toml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "failed to read config file 'config.toml': denied"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_parse_toml_message() {
        let source = toml::from_str::<toml::Table>("not = = toml").unwrap_err();
        let err = WarnError::parse_toml("messages.toml", source);
        assert!(err.to_string().contains("messages.toml"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = WarnError::InvalidConfig("cleanup interval must be positive".to_string());
        assert!(err.is_config_error());
        assert!(err.to_string().contains("cleanup interval"));
    }

    #[test]
    fn test_authority_error_conversion() {
        let err: WarnError = AuthorityError::Unavailable("not loaded".to_string()).into();
        assert!(matches!(err, WarnError::Authority(_)));
        assert!(!err.is_config_error());
        assert!(err.to_string().contains("not loaded"));
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(AuthorityError::Unavailable("down".to_string()).is_unavailable());
        assert!(!AuthorityError::UnknownGroup("default".to_string()).is_unavailable());
        assert!(!AuthorityError::Query("timeout".to_string()).is_unavailable());
        assert!(!AuthorityError::UnknownPlayer(Uuid::nil()).is_unavailable());
    }

    #[test]
    fn test_unknown_group_message() {
        let err = AuthorityError::UnknownGroup("vip".to_string());
        assert_eq!(err.to_string(), "unknown group 'vip'");
    }

    #[test]
    fn test_alert_delivery_message() {
        let err = WarnError::AlertDelivery("receiver dropped".to_string());
        assert!(err.to_string().contains("receiver dropped"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WarnError = io_err.into();
        assert!(matches!(err, WarnError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        fn parse_json() -> Result<serde_json::Value, WarnError> {
            Ok(serde_json::from_str("{ invalid }")?)
        }

        let err = parse_json().unwrap_err();
        assert!(matches!(err, WarnError::CatalogDump(_)));
    }
}
