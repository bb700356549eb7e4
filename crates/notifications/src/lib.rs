//! Background notification handling for the admin app: what to show when a
//! push message arrives, where a click leads, and the analytics event sent
//! when a notification is dismissed.
//!
//! The browser runtime is reached through the [`WindowClients`] and
//! [`AnalyticsSink`] traits.

use std::{error, fmt, sync::Arc};

use async_trait::async_trait;

pub mod display;
pub mod handlers;
pub mod routing;

pub use display::{display_options, NotificationOptions};
pub use handlers::{
    handle_click, handle_close, handle_message, handle_push, ClickOutcome, PushKind,
    WorkerCommand,
};
pub use routing::target_route;

#[derive(Debug, Clone)]
pub enum NotificationError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
    },
    Client(String),
}

impl error::Error for NotificationError {}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NotificationError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            NotificationError::InvalidResponse { status_code, url } => {
                write!(f, "Invalid Response ({}) {}", status_code, url)
            }
            NotificationError::Client(e) => write!(f, "Client error: {}", e),
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(e: reqwest::Error) -> Self {
        NotificationError::RequestError(Arc::new(e))
    }
}

/// An open window of the admin app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

/// The windows controlled by the app.
#[async_trait]
pub trait WindowClients: Send + Sync {
    /// All open windows, including ones not yet controlled by the worker.
    async fn windows(&self) -> Result<Vec<WindowClient>, NotificationError>;

    async fn focus_and_navigate(
        &self,
        client: &WindowClient,
        url: &str,
    ) -> Result<(), NotificationError>;

    async fn open_window(&self, url: &str) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DismissalEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn notification_dismissed(
        &self,
        event: &DismissalEvent,
    ) -> Result<(), NotificationError>;
}

pub const DISMISSAL_ENDPOINT: &str = "/api/analytics/notification-dismissed";

/// Posts analytics events to the admin backend.
pub struct HttpAnalyticsSink {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAnalyticsSink {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn notification_dismissed(
        &self,
        event: &DismissalEvent,
    ) -> Result<(), NotificationError> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            DISMISSAL_ENDPOINT
        );
        let response = self.client.post(&url).json(event).send().await?;
        if !response.status().is_success() {
            return Err(NotificationError::InvalidResponse {
                status_code: response.status(),
                url,
            });
        }
        Ok(())
    }
}
