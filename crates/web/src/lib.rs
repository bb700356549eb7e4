pub use crate::common::RouteResult;

use std::{env, sync::Arc};

use api::analytics_proxy::{self, ProxyConfig, ProxyState};
use archive_export::ArchiveExporter;
use axum::{extract::FromRef, routing::get_service, Router};
use directions::DirectionsProvider;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};

pub mod api;
pub mod common;
pub mod middleware;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "./resources/www/";

#[derive(Clone, FromRef)]
pub struct WebState {
    pub proxy: ProxyState,
    pub export_job: Option<Arc<dyn ArchiveExporter>>,
    pub directions: Option<Arc<dyn DirectionsProvider>>,
}

impl WebState {
    pub fn new(
        proxy: ProxyConfig,
        export_job: Option<Arc<dyn ArchiveExporter>>,
        directions: Option<Arc<dyn DirectionsProvider>>,
    ) -> Self {
        Self {
            proxy: ProxyState::new(proxy),
            export_job,
            directions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: String,
    /// Directory holding the built admin app.
    pub static_dir: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            static_dir: DEFAULT_STATIC_DIR.to_owned(),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env::var("WEB_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            static_dir: env::var("WEB_STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }
}

pub async fn start_web_server(state: WebState, config: WebConfig) -> std::io::Result<()> {
    let routes = app(state, &config);

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!("Listening on {}.", listener.local_addr()?);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

pub fn app(state: WebState, config: &WebConfig) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state.clone()))
        .nest_service("/analytics-proxy", analytics_proxy::routes(state.clone()))
        .nest_service("/functions", api::functions::routes(state))
        .fallback_service(static_content_router(&config.static_dir))
        .layer(axum::middleware::from_fn(
            middleware::request_log::request_log_middleware,
        ))
}

fn static_content_router(static_dir: &str) -> Router {
    let not_found = format!("{}/error404.html", static_dir.trim_end_matches('/'));
    Router::new().nest_service(
        "/",
        get_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(not_found))),
    )
}
