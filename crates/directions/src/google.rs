use async_trait::async_trait;
use itertools::Itertools as _;
use model::route::{DirectionsRequest, Route};
use serde::Deserialize;
use utility::polyline;

use crate::{extend_path, route_from_path, DirectionsError, DirectionsProvider};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Debug, Clone, Deserialize)]
struct DirectionsResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleRoute {
    overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Clone, Deserialize)]
struct Leg {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
struct Step {
    polyline: EncodedPolyline,
}

#[derive(Debug, Clone, Deserialize)]
struct EncodedPolyline {
    points: String,
}

/// Driving directions from the Google Directions api.
pub struct GoogleDirections {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleDirections {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, DirectionsError> {
        let url = format!(
            "{}/maps/api/directions/json",
            self.base_url.trim_end_matches('/')
        );
        let mut query = vec![
            ("origin", request.origin.to_string()),
            ("destination", request.destination.to_string()),
            ("mode", "driving".to_owned()),
            ("key", self.api_key.clone()),
        ];
        if !request.waypoints.is_empty() {
            query.push(("waypoints", request.waypoints.iter().join("|")));
        }

        log::debug!(
            "Requesting google directions from {} to {} via {} waypoints.",
            request.origin,
            request.destination,
            request.waypoints.len()
        );
        let response = self.client.get(&url).query(&query).send().await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await?),
            other => Err(DirectionsError::InvalidResponse {
                status_code: other,
                url,
                response: response.text().await.ok(),
            }),
        }
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirections {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn route(&self, request: &DirectionsRequest) -> Result<Route, DirectionsError> {
        let response = self.fetch(request).await?;
        if response.status != "OK" {
            log::warn!("Google directions answered with status {}.", response.status);
            return Err(DirectionsError::Provider {
                status: response.status,
                message: response.error_message,
            });
        }

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(DirectionsError::NoRoute)?;

        // step polylines are more detailed than the overview
        let mut points = vec![];
        for step in route.legs.iter().flat_map(|leg| leg.steps.iter()) {
            extend_path(&mut points, polyline::decode(&step.polyline.points)?);
        }
        if points.is_empty() {
            if let Some(overview) = &route.overview_polyline {
                points = polyline::decode(&overview.points)?;
            }
        }

        route_from_path(self.name(), points)
    }
}
