//! Alert formatting and delivery.
//!
//! An [`AlertTemplate`] is a plain string with three placeholders:
//! `%command%`, `%permission%` and `%origin%`. Rendering is literal
//! substitution; markup, if any, is left for the host to interpret.
//!
//! Delivery goes through the [`AlertSink`] trait. Two sinks ship with the
//! crate: [`LogAlertSink`] writes alerts to the log, [`ChannelAlertSink`]
//! forwards them to a stream the host consumes.
//!
//! # Example
//!
//! ```
//! use staff_warn::alert::AlertTemplate;
//!
//! let template = AlertTemplate::new("%command% needs %permission% (via %origin%)");
//! assert_eq!(
//!     template.render("/ban Notch", "server.ban", "staff"),
//!     "/ban Notch needs server.ban (via staff)"
//! );
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use uuid::Uuid;

use crate::error::WarnError;

/// Placeholder for the raw command text.
pub const COMMAND_PLACEHOLDER: &str = "%command%";
/// Placeholder for the permission the command requires.
pub const PERMISSION_PLACEHOLDER: &str = "%permission%";
/// Placeholder for the group the permission came from.
pub const ORIGIN_PLACEHOLDER: &str = "%origin%";

/// Template used when `messages.toml` is freshly created.
pub const DEFAULT_ALERT_TEMPLATE: &str =
    "[StaffWarn] %command% requires %permission%, which you hold through %origin%";

/// Alert message template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTemplate(String);

impl AlertTemplate {
    /// Wrap a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every placeholder occurrence.
    pub fn render(&self, command: &str, permission: &str, origin: &str) -> String {
        self.0
            .replace(COMMAND_PLACEHOLDER, command)
            .replace(PERMISSION_PLACEHOLDER, permission)
            .replace(ORIGIN_PLACEHOLDER, origin)
    }
}

impl Default for AlertTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TEMPLATE)
    }
}

/// A privileged command use, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Player who ran the command
    pub player_id: Uuid,
    /// Player name at the time of the command
    pub player_name: String,
    /// Raw command text as typed
    pub command: String,
    /// Permission the command requires
    pub permission: String,
    /// Group the permission was inherited from, or `"unknown"`
    pub origin: String,
    /// Rendered message
    pub message: String,
}

impl Alert {
    /// Build an alert, rendering `template` with the command details.
    pub fn new(
        player_id: Uuid,
        player_name: impl Into<String>,
        command: impl Into<String>,
        permission: impl Into<String>,
        origin: impl Into<String>,
        template: &AlertTemplate,
    ) -> Self {
        let command = command.into();
        let permission = permission.into();
        let origin = origin.into();
        let message = template.render(&command, &permission, &origin);
        Self {
            player_id,
            player_name: player_name.into(),
            command,
            permission,
            origin,
            message,
        }
    }
}

/// Destination for alerts
///
/// # Example
///
/// ```
/// use staff_warn::alert::{Alert, AlertSink};
/// use staff_warn::error::WarnError;
/// use async_trait::async_trait;
///
/// struct Stdout;
///
/// #[async_trait]
/// impl AlertSink for Stdout {
///     async fn deliver(&self, alert: &Alert) -> Result<(), WarnError> {
///         println!("to {}: {}", alert.player_name, alert.message);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert to the player it concerns.
    async fn deliver(&self, alert: &Alert) -> Result<(), WarnError>;
}

/// Sink that writes alerts to the log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), WarnError> {
        info!(player = %alert.player_name, "{}", alert.message);
        Ok(())
    }
}

/// Sink that forwards alerts to a stream
///
/// # Example
///
/// ```
/// use staff_warn::alert::{Alert, AlertSink, AlertTemplate, ChannelAlertSink};
/// use tokio_stream::StreamExt;
/// use uuid::Uuid;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (sink, mut alerts) = ChannelAlertSink::new();
/// let alert = Alert::new(Uuid::nil(), "Notch", "/ban x", "server.ban", "staff", &AlertTemplate::default());
/// sink.deliver(&alert).await.unwrap();
///
/// assert_eq!(alerts.next().await.unwrap().origin, "staff");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: mpsc::UnboundedSender<Alert>,
}

impl ChannelAlertSink {
    /// Create a sink and the stream its alerts arrive on.
    pub fn new() -> (Self, UnboundedReceiverStream<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UnboundedReceiverStream::new(rx))
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), WarnError> {
        self.tx
            .send(alert.clone())
            .map_err(|_| WarnError::AlertDelivery("alert stream closed".to_string()))
    }
}
