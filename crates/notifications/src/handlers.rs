use chrono::{DateTime, Utc};
use model::notification::{NotificationData, NotificationKind};
use serde_json::Value;

use crate::{
    display::ACTION_DISMISS, routing::target_route, AnalyticsSink, DismissalEvent,
    NotificationError, WindowClients,
};

pub const SKIP_WAITING: &str = "SKIP_WAITING";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The dismiss action was clicked.
    Ignored,
    Focused { client_id: String, url: String },
    Opened { url: String },
}

/// Brings the app to the page a clicked notification refers to. An already
/// open window is reused, otherwise a new one is opened.
pub async fn handle_click<C>(
    action: Option<&str>,
    data: Option<&NotificationData>,
    clients: &C,
) -> Result<ClickOutcome, NotificationError>
where
    C: WindowClients + ?Sized,
{
    if action == Some(ACTION_DISMISS) {
        return Ok(ClickOutcome::Ignored);
    }

    let url = target_route(data);
    log::debug!("Notification clicked, navigating to '{url}'.");

    match clients.windows().await?.into_iter().next() {
        Some(client) => {
            clients.focus_and_navigate(&client, &url).await?;
            Ok(ClickOutcome::Focused {
                client_id: client.id,
                url,
            })
        }
        None => {
            clients.open_window(&url).await?;
            Ok(ClickOutcome::Opened { url })
        }
    }
}

/// Reports a dismissed notification. Failures are logged and otherwise
/// ignored. Returns whether an event was delivered.
pub async fn handle_close<A>(
    data: Option<&NotificationData>,
    sink: &A,
    now: DateTime<Utc>,
) -> bool
where
    A: AnalyticsSink + ?Sized,
{
    let Some(kind) = data.and_then(|data| data.kind.clone()) else {
        return false;
    };

    let event = DismissalEvent {
        kind,
        timestamp: now.timestamp_millis(),
    };
    match sink.notification_dismissed(&event).await {
        Ok(()) => true,
        Err(why) => {
            log::warn!("Analytics error: {why}");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushKind {
    Empty,
    Urgent,
    Normal,
}

pub fn handle_push(data: Option<&Value>) -> PushKind {
    let Some(data) = data else {
        return PushKind::Empty;
    };
    log::debug!("Push data: {data}");

    let kind = data
        .get("type")
        .and_then(Value::as_str)
        .map(NotificationKind::from_name);
    if kind == Some(NotificationKind::Urgent) {
        log::info!("Urgent notification received.");
        PushKind::Urgent
    } else {
        PushKind::Normal
    }
}

/// Things the worker asks its runtime to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    SkipWaiting,
    ClaimClients,
}

pub fn handle_message(message: Option<&Value>) -> Option<WorkerCommand> {
    let kind = message?.get("type")?.as_str()?;
    (kind == SKIP_WAITING).then_some(WorkerCommand::SkipWaiting)
}

/// A newly installed worker takes over without waiting for old tabs to close.
pub fn on_install() -> WorkerCommand {
    log::info!("Service worker installed.");
    WorkerCommand::SkipWaiting
}

pub fn on_activate() -> WorkerCommand {
    log::info!("Service worker activated.");
    WorkerCommand::ClaimClients
}
