use std::{env, error, fmt, sync::Arc};

use async_trait::async_trait;
use model::{
    route::{DirectionsRequest, Route},
    Coordinate,
};
use utility::{
    geo::path_length_km,
    polyline::{self, PolylineError},
};

pub mod api_key;
pub mod google;
pub mod osrm;

pub use google::GoogleDirections;
pub use osrm::OsrmDirections;

#[derive(Debug, Clone)]
pub enum DirectionsError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    /// The provider answered, but could not compute a route.
    Provider {
        status: String,
        message: Option<String>,
    },
    NoRoute,
    Polyline(PolylineError),
}

impl error::Error for DirectionsError {}

impl fmt::Display for DirectionsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DirectionsError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            DirectionsError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response ({}) {}", status_code, url),
            },
            DirectionsError::Provider { status, message } => match message {
                Some(message) => write!(f, "Directions failed ({}): {}", status, message),
                None => write!(f, "Directions failed ({})", status),
            },
            DirectionsError::NoRoute => write!(f, "No route found."),
            DirectionsError::Polyline(e) => write!(f, "{}", e),
        }
    }
}

impl From<reqwest::Error> for DirectionsError {
    fn from(e: reqwest::Error) -> Self {
        DirectionsError::RequestError(Arc::new(e))
    }
}

impl From<PolylineError> for DirectionsError {
    fn from(e: PolylineError) -> Self {
        DirectionsError::Polyline(e)
    }
}

/// A service computing driving routes.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn route(&self, request: &DirectionsRequest) -> Result<Route, DirectionsError>;
}

/// Selects and configures the directions provider.
#[derive(Clone, Debug)]
pub enum DirectionsConfig {
    Google { api_key: String },
    Osrm { base_url: String },
}

impl DirectionsConfig {
    /// Reads `DIRECTIONS_PROVIDER` (`google` or `osrm`, default `google`).
    /// The google key is taken from `GOOGLE_MAPS_API_KEY`, or extracted
    /// from the maps script url in `GOOGLE_MAPS_SCRIPT_URL`.
    pub fn from_env() -> Option<Self> {
        let provider = env::var("DIRECTIONS_PROVIDER").unwrap_or_else(|_| "google".to_owned());
        match provider.to_lowercase().as_str() {
            "osrm" => Some(Self::Osrm {
                base_url: env::var("OSRM_URL")
                    .unwrap_or_else(|_| osrm::DEFAULT_BASE_URL.to_owned()),
            }),
            "google" => {
                let api_key = env::var("GOOGLE_MAPS_API_KEY").ok().or_else(|| {
                    env::var("GOOGLE_MAPS_SCRIPT_URL")
                        .ok()
                        .and_then(|url| api_key::extract_api_key(&url))
                })?;
                Some(Self::Google { api_key })
            }
            other => {
                log::warn!("Unknown directions provider '{other}'.");
                None
            }
        }
    }

    pub fn provider(self) -> Arc<dyn DirectionsProvider> {
        match self {
            Self::Google { api_key } => Arc::new(GoogleDirections::new(api_key)),
            Self::Osrm { base_url } => Arc::new(OsrmDirections::new(base_url)),
        }
    }
}

/// Builds the route returned to callers from the full path of a provider.
pub(crate) fn route_from_path(
    provider: &str,
    points: Vec<Coordinate>,
) -> Result<Route, DirectionsError> {
    if points.is_empty() {
        return Err(DirectionsError::NoRoute);
    }
    Ok(Route {
        polyline: polyline::encode(&points)?,
        distance_km: path_length_km(&points),
        points,
        provider: provider.to_owned(),
    })
}

/// Appends `segment` to `path`, dropping its first point when it repeats
/// the end of the path.
pub(crate) fn extend_path(path: &mut Vec<Coordinate>, segment: Vec<Coordinate>) {
    let mut segment = segment.into_iter().peekable();
    if path.last().is_some() && path.last() == segment.peek() {
        segment.next();
    }
    path.extend(segment);
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::Router;
    use tokio::net::TcpListener;

    use super::*;

    pub(crate) async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{address}")
    }

    #[test]
    fn joins_segments_without_duplicates() {
        let mut path = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
        extend_path(
            &mut path,
            vec![Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0)],
        );
        extend_path(&mut path, vec![Coordinate::new(3.0, 3.0)]);
        extend_path(&mut path, vec![]);
        assert_eq!(
            path,
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(2.0, 2.0),
                Coordinate::new(3.0, 3.0),
            ]
        );
    }

    #[test]
    fn empty_path_is_no_route() {
        assert!(matches!(
            route_from_path("test", vec![]),
            Err(DirectionsError::NoRoute)
        ));
    }

    #[test]
    fn route_is_encoded_with_default_precision() {
        let route = route_from_path(
            "test",
            vec![
                Coordinate::new(38.5, -120.2),
                Coordinate::new(40.7, -120.95),
                Coordinate::new(43.252, -126.453),
            ],
        )
        .unwrap();
        assert_eq!(route.polyline, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
        assert_eq!(route.provider, "test");
        assert!(route.distance_km > 700.0);
    }
}
