use async_trait::async_trait;
use itertools::Itertools as _;
use model::{
    route::{DirectionsRequest, Route},
    Coordinate,
};
use serde::Deserialize;
use utility::polyline;

use crate::{route_from_path, DirectionsError, DirectionsProvider};

pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

// Geometries are requested as `polyline6`.
const GEOMETRY_PRECISION: u32 = 6;

#[derive(Debug, Clone, Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct OsrmRoute {
    geometry: String,
}

/// Driving directions from an OSRM routing server.
pub struct OsrmDirections {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmDirections {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// OSRM expects `lng,lat` pairs separated by `;`.
    fn coordinates(request: &DirectionsRequest) -> String {
        std::iter::once(&request.origin)
            .chain(request.waypoints.iter())
            .chain(std::iter::once(&request.destination))
            .map(|c: &Coordinate| format!("{},{}", c.longitude, c.latitude))
            .join(";")
    }
}

#[async_trait]
impl DirectionsProvider for OsrmDirections {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn route(&self, request: &DirectionsRequest) -> Result<Route, DirectionsError> {
        let url = format!(
            "{}/route/v1/driving/{}",
            self.base_url.trim_end_matches('/'),
            Self::coordinates(request)
        );
        log::debug!("Requesting osrm route '{url}'.");

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "polyline6")])
            .send()
            .await?;

        // OSRM reports routing failures with a 400 and a json body.
        let status_code = response.status();
        let text = response.text().await?;
        let parsed: RouteResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) => {
                return Err(DirectionsError::InvalidResponse {
                    status_code,
                    url,
                    response: Some(text),
                })
            }
        };

        if parsed.code != "Ok" {
            log::warn!("OSRM answered with code {}.", parsed.code);
            return Err(DirectionsError::Provider {
                status: parsed.code,
                message: parsed.message,
            });
        }

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or(DirectionsError::NoRoute)?;
        let points = polyline::decode_with_precision(&route.geometry, GEOMETRY_PRECISION)?;

        route_from_path(self.name(), points)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::tests::serve;

    async fn route(
        Path(coordinates): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        assert_eq!(params.get("geometries").map(String::as_str), Some("polyline6"));
        if coordinates == "0,0;0,0" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": "NoRoute", "message": "Impossible route" })),
            );
        }
        assert_eq!(coordinates, "120.9842,14.5995;121.0022,14.6095");
        (
            StatusCode::OK,
            Json(json!({
                "code": "Ok",
                "routes": [{ "geometry": "wsazZoghweF_pR_db@", "distance": 2200.0 }]
            })),
        )
    }

    async fn provider() -> OsrmDirections {
        OsrmDirections::new(
            serve(Router::new().route("/route/v1/driving/:coordinates", get(route))).await,
        )
    }

    #[test]
    fn coordinates_are_longitude_first() {
        let request = DirectionsRequest::new(Coordinate::new(1.5, 2.5), Coordinate::new(3.0, 4.0))
            .with_waypoints(vec![Coordinate::new(-1.0, -2.0)]);
        assert_eq!(OsrmDirections::coordinates(&request), "2.5,1.5;-2,-1;4,3");
    }

    #[tokio::test]
    async fn reencodes_geometry_with_default_precision() {
        let request = DirectionsRequest::new(
            Coordinate::new(14.5995, 120.9842),
            Coordinate::new(14.6095, 121.0022),
        );
        let route = provider().await.route(&request).await.unwrap();

        assert_eq!(route.provider, "osrm");
        assert_eq!(route.points.len(), 2);
        assert_eq!(
            route.polyline,
            polyline::encode(&[
                Coordinate::new(14.5995, 120.9842),
                Coordinate::new(14.6095, 121.0022),
            ])
            .unwrap()
        );
    }

    #[tokio::test]
    async fn routing_failure_is_a_provider_error() {
        let request = DirectionsRequest::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0));
        match provider().await.route(&request).await.unwrap_err() {
            DirectionsError::Provider { status, message } => {
                assert_eq!(status, "NoRoute");
                assert_eq!(message.as_deref(), Some("Impossible route"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
