//! Command event pipeline.
//!
//! A host front end calls [`CommandMonitor::on_command`] once per command a
//! player issues. The cheap filters run inline on the caller's thread:
//!
//! 1. players holding [`BYPASS_PERMISSION`] are ignored
//! 2. the base command must be in the catalog
//! 3. the player must actually hold the mapped permission
//!
//! Resolution then moves to tokio's blocking pool, since the authority may
//! block. If it yields an origin, the use is logged and an [`Alert`] is
//! delivered to the player, provided they are still online.
//!
//! ```text
//! on_command ─► bypass? ─► catalog ─► has_permission? ─► spawn_blocking(resolve)
//!                                                              │
//!                                 deliver ◄─ online? ◄─ Some(origin)
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::alert::{Alert, AlertSink, AlertTemplate};
use crate::catalog::{base_command, CommandCatalog};
use crate::player::Player;
use crate::resolver::OriginResolver;

/// Players holding this permission never trigger alerts.
pub const BYPASS_PERMISSION: &str = "staffwarnv.bypass";

/// Filters command events and dispatches alert resolution
#[derive(Clone)]
pub struct CommandMonitor {
    resolver: Arc<OriginResolver>,
    catalog: Arc<CommandCatalog>,
    template: Arc<AlertTemplate>,
    sink: Arc<dyn AlertSink>,
}

impl CommandMonitor {
    /// Create a monitor.
    pub fn new(
        resolver: Arc<OriginResolver>,
        catalog: Arc<CommandCatalog>,
        template: AlertTemplate,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            resolver,
            catalog,
            template: Arc::new(template),
            sink,
        }
    }

    /// Permission to check for `raw_command`, if the command should be
    /// resolved at all for this player.
    pub fn tracked_permission<P>(&self, player: &P, raw_command: &str) -> Option<String>
    where
        P: Player + ?Sized,
    {
        if player.has_permission(BYPASS_PERMISSION) {
            return None;
        }

        let command = base_command(raw_command)?;
        let permission = self.catalog.permission_for(&command)?;

        if !player.has_permission(permission) {
            return None;
        }
        Some(permission.to_string())
    }

    /// Handle one command event.
    ///
    /// Returns `None` if the command was filtered out inline. Otherwise
    /// returns a handle resolving to the alert that was raised, if any.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn on_command(
        &self,
        player: Arc<dyn Player>,
        raw_command: &str,
    ) -> Option<JoinHandle<Option<Alert>>> {
        let permission = self.tracked_permission(player.as_ref(), raw_command)?;
        let raw_command = raw_command.to_string();
        let monitor = self.clone();

        Some(tokio::spawn(async move {
            monitor.resolve_and_deliver(player, raw_command, permission).await
        }))
    }

    async fn resolve_and_deliver(
        self,
        player: Arc<dyn Player>,
        raw_command: String,
        permission: String,
    ) -> Option<Alert> {
        let resolver = self.resolver.clone();
        let resolve_player = player.clone();
        let resolve_permission = permission.clone();
        let origin = match tokio::task::spawn_blocking(move || {
            resolver.resolve_alert_origin(resolve_player.as_ref(), &resolve_permission)
        })
        .await
        {
            Ok(origin) => origin?,
            Err(e) => {
                error!("Error processing command alert: {}", e);
                return None;
            }
        };

        info!(
            "{} used {} (requires {}) from {}",
            player.name(),
            raw_command,
            permission,
            origin
        );

        let alert = Alert::new(
            player.id(),
            player.name(),
            raw_command,
            permission,
            origin,
            &self.template,
        );

        if player.is_online() {
            if let Err(e) = self.sink.deliver(&alert).await {
                warn!("Could not deliver alert to {}: {}", player.name(), e);
            }
        }
        Some(alert)
    }
}

impl std::fmt::Debug for CommandMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMonitor")
            .field("resolver", &self.resolver)
            .field("catalog_size", &self.catalog.len())
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
