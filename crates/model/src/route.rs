use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Coordinate, ExampleData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
}

impl DirectionsRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            waypoints: vec![],
        }
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Coordinate>) -> Self {
        self.waypoints = waypoints;
        self
    }
}

/// A driving route as returned to the admin app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// The path as encoded polyline with 1e-5 precision.
    pub polyline: String,
    pub points: Vec<Coordinate>,
    pub distance_km: f64,
    pub provider: String,
}

impl ExampleData for Route {
    fn example_data() -> Self {
        Self {
            polyline: "_p~iF~ps|U_ulLnnqC_mqNvxq`@".to_owned(),
            points: vec![
                Coordinate::new(38.5, -120.2),
                Coordinate::new(40.7, -120.95),
                Coordinate::new(43.252, -126.453),
            ],
            distance_km: 783.5,
            provider: "google".to_owned(),
        }
    }
}
