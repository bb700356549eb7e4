use chrono::{DateTime, Utc};
use model::notification::{NotificationData, NotificationPayload};
use serde::Serialize;

pub const DEFAULT_TITLE: &str = "Pasada Admin";
pub const DEFAULT_BODY: &str = "You have a new notification";
pub const DEFAULT_TAG: &str = "default";

const ICON: &str = "/icons/icon-192x192.png";
const BADGE: &str = "/icons/icon-72x72.png";
const VIBRATION_PATTERN: [u32; 3] = [200, 100, 200];

pub const ACTION_VIEW: &str = "view";
pub const ACTION_DISMISS: &str = "dismiss";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

impl NotificationAction {
    fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_owned(),
            title: title.to_owned(),
            icon: BADGE.to_owned(),
        }
    }
}

/// Everything needed to show a notification while the app is in the
/// background.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    #[serde(skip)]
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data: Option<NotificationData>,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub silent: bool,
    pub vibrate: Vec<u32>,
    pub timestamp: i64,
}

pub fn display_options(payload: &NotificationPayload, now: DateTime<Utc>) -> NotificationOptions {
    let content = payload.notification.clone().unwrap_or_default();
    let tag = payload
        .data
        .as_ref()
        .and_then(|data| data.kind.clone())
        .unwrap_or_else(|| DEFAULT_TAG.to_owned());

    NotificationOptions {
        title: content.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        body: content.body.unwrap_or_else(|| DEFAULT_BODY.to_owned()),
        icon: ICON.to_owned(),
        badge: BADGE.to_owned(),
        tag,
        data: payload.data.clone(),
        actions: vec![
            NotificationAction::new(ACTION_VIEW, "View Details"),
            NotificationAction::new(ACTION_DISMISS, "Dismiss"),
        ],
        require_interaction: true,
        silent: false,
        vibrate: VIBRATION_PATTERN.to_vec(),
        timestamp: now.timestamp_millis(),
    }
}
