use axum::{
    extract::{OriginalUri, Query, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Json, Router,
};
use itertools::Itertools;
use model::{
    route::{DirectionsRequest, Route},
    Coordinate,
};
use serde::Deserialize;

use crate::{
    common::{route_not_found, schema, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<Route>))
        .route("/", get(get_directions).post(post_directions))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsQuery {
    origin: String,
    destination: String,
    /// `lat,lng` pairs separated by `|`.
    waypoints: Option<String>,
}

impl DirectionsQuery {
    fn to_request(&self) -> Result<DirectionsRequest, RouteErrorResponse> {
        let waypoints = self
            .waypoints
            .iter()
            .flat_map(|waypoints| waypoints.split('|'))
            .filter(|waypoint| !waypoint.trim().is_empty())
            .map(|waypoint| parse_coordinate("waypoint", waypoint))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DirectionsRequest::new(
            parse_coordinate("origin", &self.origin)?,
            parse_coordinate("destination", &self.destination)?,
        )
        .with_waypoints(waypoints))
    }
}

fn parse_coordinate(name: &str, text: &str) -> Result<Coordinate, RouteErrorResponse> {
    Coordinate::parse(text).ok_or_else(|| {
        RouteErrorResponse::bad_request(format!(
            "Invalid {}: expected 'latitude,longitude', got '{}'.",
            name, text
        ))
        .with_error("Invalid coordinate")
    })
}

async fn get_directions(
    OriginalUri(original_uri): OriginalUri,
    state: State<WebState>,
    Query(params): Query<DirectionsQuery>,
) -> RouteResult<Json<Route>> {
    let request = params.to_request().map_err(|why| {
        why.with_method(&Method::GET).with_uri(original_uri.path())
    })?;
    route_request(state, &request)
        .await
        .map_err(|why| why.with_method(&Method::GET).with_uri(original_uri.path()))
}

async fn post_directions(
    OriginalUri(original_uri): OriginalUri,
    state: State<WebState>,
    Json(request): Json<DirectionsRequest>,
) -> RouteResult<Json<Route>> {
    route_request(state, &request)
        .await
        .map_err(|why| why.with_method(&Method::POST).with_uri(original_uri.path()))
}

async fn route_request(
    State(WebState { directions, .. }): State<WebState>,
    request: &DirectionsRequest,
) -> RouteResult<Json<Route>> {
    let Some(provider) = directions else {
        return Err(RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_error("Directions provider is not configured"));
    };

    log::debug!(
        "Routing {} -> {} via [{}] with {}.",
        request.origin,
        request.destination,
        request.waypoints.iter().join("|"),
        provider.name()
    );
    provider.route(request).await.map(Json).map_err(|why| {
        log::warn!("Directions request failed: {why}");
        RouteErrorResponse::from(why)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ::directions::{DirectionsError, DirectionsProvider};
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        api::analytics_proxy::ProxyConfig,
        tests::serve,
        WebConfig,
    };

    #[derive(Default)]
    struct FakeProvider {
        requests: Mutex<Vec<DirectionsRequest>>,
    }

    #[async_trait]
    impl DirectionsProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn route(&self, request: &DirectionsRequest) -> Result<Route, DirectionsError> {
            self.requests.lock().unwrap().push(request.clone());
            if request.origin == request.destination {
                return Err(DirectionsError::Provider {
                    status: "ZERO_RESULTS".to_owned(),
                    message: None,
                });
            }
            Ok(Route {
                polyline: "_p~iF~ps|U_ulLnnqC".to_owned(),
                points: vec![request.origin, request.destination],
                distance_km: 250.0,
                provider: self.name().to_owned(),
            })
        }
    }

    async fn server(provider: Option<Arc<FakeProvider>>) -> String {
        let provider = provider.map(|provider| provider as Arc<dyn DirectionsProvider>);
        let state = WebState::new(ProxyConfig::default(), None, provider);
        serve(crate::app(state, &WebConfig::default())).await
    }

    #[test]
    fn query_is_parsed_into_a_request() {
        let query = DirectionsQuery {
            origin: "38.5,-120.2".to_owned(),
            destination: "43.252, -126.453".to_owned(),
            waypoints: Some("40.7,-120.95|".to_owned()),
        };

        assert_eq!(
            query.to_request().unwrap(),
            DirectionsRequest::new(
                Coordinate::new(38.5, -120.2),
                Coordinate::new(43.252, -126.453)
            )
            .with_waypoints(vec![Coordinate::new(40.7, -120.95)])
        );

        let query = DirectionsQuery {
            origin: "38.5".to_owned(),
            ..query
        };
        let error = query.to_request().unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn returns_the_route() {
        let provider = Arc::new(FakeProvider::default());
        let server = server(Some(provider.clone())).await;

        let response = reqwest::get(format!(
            "{}/api/v1/directions?origin=38.5,-120.2&destination=40.7,-120.95&waypoints=39,-120.5",
            server
        ))
        .await
        .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.json::<Value>().await.unwrap();
        assert_eq!(body["polyline"], "_p~iF~ps|U_ulLnnqC");
        assert_eq!(body["provider"], "fake");
        assert_eq!(body["points"][0], json!({"latitude": 38.5, "longitude": -120.2}));
        assert_eq!(
            provider.requests.lock().unwrap()[0].waypoints,
            vec![Coordinate::new(39.0, -120.5)]
        );
    }

    #[tokio::test]
    async fn accepts_json_requests() {
        let server = server(Some(Arc::new(FakeProvider::default()))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/v1/directions", server))
            .json(&json!({
                "origin": {"latitude": 14.5995, "longitude": 120.9842},
                "destination": {"latitude": 14.6095, "longitude": 121.0022}
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn error_statuses() {
        let configured = server(Some(Arc::new(FakeProvider::default()))).await;

        let response = reqwest::get(format!(
            "{}/api/v1/directions?origin=north&destination=40.7,-120.95",
            configured
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = reqwest::get(format!(
            "{}/api/v1/directions?origin=40.7,-120.95&destination=40.7,-120.95",
            configured
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

        let unconfigured = server(None).await;
        let response = reqwest::get(format!(
            "{}/api/v1/directions?origin=38.5,-120.2&destination=40.7,-120.95",
            unconfigured
        ))
        .await
        .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn schema_with_example_data() {
        let server = server(None).await;

        let response = reqwest::get(format!(
            "{}/api/v1/directions/schema?exampleData=true",
            server
        ))
        .await
        .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.json::<Value>().await.unwrap();
        assert_eq!(body["examples"][0]["provider"], "google");
    }
}
