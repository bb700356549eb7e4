use std::time::Instant;

use axum::{extract, middleware::Next, response::IntoResponse};

/// Logs method, path, status and duration of every request.
pub async fn request_log_middleware(req: extract::Request, next: Next) -> impl IntoResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = started.elapsed();
    if status.is_server_error() {
        log::warn!("{method} {path} -> {status} ({elapsed:?})");
    } else {
        log::debug!("{method} {path} -> {status} ({elapsed:?})");
    }

    response
}
