use archive_export::{ExportReport, DEFAULT_RETENTION_DAYS};
use axum::{
    extract::{OriginalUri, Query, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route(
            "/export-booking-archives",
            get(export_booking_archives).post(export_booking_archives),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    retention_days: Option<String>,
}

impl ExportParams {
    fn retention_days(&self) -> Result<i64, RouteErrorResponse> {
        match self.retention_days.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_RETENTION_DAYS),
            Some(days) => days.parse().map_err(|_| {
                RouteErrorResponse::bad_request(format!(
                    "retentionDays must be a whole number of days, got '{}'.",
                    days
                ))
                .with_error("Invalid retentionDays")
            }),
        }
    }
}

async fn export_booking_archives(
    OriginalUri(original_uri): OriginalUri,
    method: Method,
    State(WebState { export_job, .. }): State<WebState>,
    Query(params): Query<ExportParams>,
) -> RouteResult<Json<ExportReport>> {
    let with_request = |response: RouteErrorResponse| {
        response.with_method(&method).with_uri(original_uri.path())
    };

    let Some(export_job) = export_job else {
        return Err(with_request(
            RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                .with_error("Archive export is not configured"),
        ));
    };
    let retention_days = params.retention_days().map_err(&with_request)?;

    log::info!("Starting booking archive export ({retention_days} days retention).");
    export_job
        .export(retention_days)
        .await
        .map(|report| {
            log::info!("Exported {} booking archives.", report.processed);
            Json(report)
        })
        .map_err(|why| {
            log::error!("Booking archive export failed: {why}");
            with_request(RouteErrorResponse::from(why))
        })
}
