use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A push message as delivered by the messaging service.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub notification: Option<NotificationContent>,
    pub data: Option<NotificationData>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Data attached to a notification. The messaging service delivers every
/// value as a string.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl NotificationData {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn notification_kind(&self) -> Option<NotificationKind> {
        self.kind.as_deref().map(NotificationKind::from_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    QuotaReached,
    CapacityOvercrowded,
    RouteChanged,
    HeavyRainAlert,
    Urgent,
    Other(String),
}

impl NotificationKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "quota_reached" => Self::QuotaReached,
            "capacity_overcrowded" => Self::CapacityOvercrowded,
            "route_changed" => Self::RouteChanged,
            "heavy_rain_alert" => Self::HeavyRainAlert,
            "urgent" => Self::Urgent,
            other => Self::Other(other.to_owned()),
        }
    }
}
