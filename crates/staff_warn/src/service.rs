//! Top-level service wiring.
//!
//! [`StaffWarn`] owns the loaded configuration, the resolver with its caches,
//! the command monitor and the cleanup task. Hosts create one per process:
//!
//! ```no_run
//! use std::sync::Arc;
//! use staff_warn::prelude::*;
//!
//! # async fn example() -> Result<(), WarnError> {
//! let authority = Arc::new(InMemoryAuthority::new());
//! let mut service = StaffWarn::load("plugins/staffwarn", authority, Arc::new(LogAlertSink))?;
//! service.start();
//!
//! let player = Arc::new(SnapshotPlayer::new("Notch").on_server("survival"));
//! if let Some(pending) = service.on_command(player, "/ban Herobrine") {
//!     let _alert = pending.await;
//! }
//!
//! service.shutdown();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::alert::{Alert, AlertSink};
use crate::authority::PermissionAuthority;
use crate::catalog::CommandCatalog;
use crate::config::{ConfigLoader, LoadedConfig, Settings};
use crate::error::WarnError;
use crate::maintenance::{spawn_cleanup, CleanupTask};
use crate::monitor::CommandMonitor;
use crate::player::Player;
use crate::resolver::OriginResolver;

/// A running alert service
#[derive(Debug)]
pub struct StaffWarn {
    settings: Settings,
    catalog: Arc<CommandCatalog>,
    resolver: Arc<OriginResolver>,
    monitor: CommandMonitor,
    cleanup: Option<CleanupTask>,
}

impl StaffWarn {
    /// Load configuration from `data_dir` and wire the service.
    ///
    /// # Errors
    ///
    /// Returns a config-class [`WarnError`] if loading fails. Nothing is
    /// started in that case.
    pub fn load(
        data_dir: impl Into<PathBuf>,
        authority: Arc<dyn PermissionAuthority>,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self, WarnError> {
        let loaded = ConfigLoader::new(data_dir).load()?;
        Ok(Self::new(loaded, authority, sink))
    }

    /// Wire the service from an already loaded configuration.
    pub fn new(
        loaded: LoadedConfig,
        authority: Arc<dyn PermissionAuthority>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let LoadedConfig { settings, catalog } = loaded;
        let catalog = Arc::new(catalog);
        let resolver = Arc::new(OriginResolver::from_settings(authority, &settings));
        let monitor = CommandMonitor::new(
            resolver.clone(),
            catalog.clone(),
            settings.alert_template.clone(),
            sink,
        );

        Self {
            settings,
            catalog,
            resolver,
            monitor,
            cleanup: None,
        }
    }

    /// Start the periodic cache cleanup. No-op if already started.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&mut self) {
        if self.cleanup.is_some() {
            return;
        }
        self.cleanup = Some(spawn_cleanup(
            self.resolver.clone(),
            self.settings.cleanup_interval,
        ));
        info!(
            "StaffWarn started, cache cleanup every {}s",
            self.settings.cleanup_interval.as_secs()
        );
    }

    /// Feed one command event to the monitor.
    ///
    /// See [`CommandMonitor::on_command`].
    pub fn on_command(
        &self,
        player: Arc<dyn Player>,
        raw_command: &str,
    ) -> Option<JoinHandle<Option<Alert>>> {
        self.monitor.on_command(player, raw_command)
    }

    /// Stop the cleanup task. The service can be started again.
    pub fn shutdown(&mut self) {
        if let Some(mut task) = self.cleanup.take() {
            task.cancel();
            info!("StaffWarn stopped");
        }
    }

    /// Whether the cleanup task is running.
    pub fn is_running(&self) -> bool {
        self.cleanup.as_ref().is_some_and(CleanupTask::is_running)
    }

    /// Loaded settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loaded command catalog.
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// The resolver, shared with the monitor and cleanup task.
    pub fn resolver(&self) -> &Arc<OriginResolver> {
        &self.resolver
    }

    /// The command monitor.
    pub fn monitor(&self) -> &CommandMonitor {
        &self.monitor
    }
}
