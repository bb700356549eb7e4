//! Forwards `/analytics-proxy/<path>` requests to the analytics backend, so
//! the admin app can reach it without cross-origin requests.

use std::{env, error, fmt, sync::Arc};

use axum::{
    body::Bytes,
    extract::{OriginalUri, RawQuery, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::on,
    Router,
};
use reqwest::Url;

use crate::{
    common::{RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

const FORWARDED_HEADERS: [axum::http::HeaderName; 2] = [CONTENT_TYPE, AUTHORIZATION];
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const ROUTE_PREFIXES: [&str; 2] = ["/api/analytics-proxy/", "/analytics-proxy/"];

#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub upstream_base_url: Option<String>,
}

impl ProxyConfig {
    /// Reads the upstream base url from `ANALYTICS_API_URL`.
    pub fn from_env() -> Self {
        Self {
            upstream_base_url: env::var("ANALYTICS_API_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub client: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug)]
enum ProxyError {
    InvalidUrl(String),
    Request(reqwest::Error),
}

impl error::Error for ProxyError {}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProxyError::InvalidUrl(e) => write!(f, "Invalid upstream url: {}", e),
            ProxyError::Request(e) => write!(f, "{}", e),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Request(e)
    }
}

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/*path", on(METHOD_FILTER_ALL, proxy))
        .with_state(state)
}

async fn proxy(
    State(WebState { proxy, .. }): State<WebState>,
    OriginalUri(original_uri): OriginalUri,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(base_url) = proxy.config.upstream_base_url.as_deref() else {
        return RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_error("ANALYTICS_API_URL is not configured")
            .into_response();
    };

    let path = proxied_path(original_uri.path());
    match forward(
        &proxy.client,
        base_url,
        path,
        query.as_deref(),
        method,
        &headers,
        body,
    )
    .await
    {
        Ok(response) => response,
        Err(why) => {
            log::error!("Analytics proxy request to '{path}' failed: {why}");
            RouteErrorResponse::new(StatusCode::BAD_GATEWAY)
                .with_error("Proxy error")
                .with_message(format!("{}", why))
                .into_response()
        }
    }
}

async fn forward(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    query: Option<&str>,
    method: Method,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let url = target_url(base_url, path, query)?;
    log::debug!("Proxying {method} to '{url}'.");

    let mut request = client.request(method.clone(), url);
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value.clone());
        }
    }
    if carries_body(&method) {
        request = request.body(body);
    }

    let upstream = request.send().await?;
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let bytes = upstream.bytes().await?;

    Ok((status, [(CONTENT_TYPE, content_type)], bytes).into_response())
}

/// The part of the request path behind the proxy route, still percent-encoded.
fn proxied_path(request_path: &str) -> &str {
    ROUTE_PREFIXES
        .iter()
        .find_map(|prefix| request_path.strip_prefix(prefix))
        .unwrap_or_else(|| request_path.trim_start_matches('/'))
}

// `%2e` counts as a dot when urls are resolved.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Resolves the encoded `path` below the upstream base url and appends the
/// original query string unchanged. The result never leaves the base path.
fn target_url(base_url: &str, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
    if path.split('/').any(is_dot_segment) {
        return Err(ProxyError::InvalidUrl(format!(
            "dot segments are not allowed in '{}'",
            path
        )));
    }
    // relative to the base even when the path starts with slashes
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join(&format!("./{}", path)))
        .map_err(|why| ProxyError::InvalidUrl(format!("{}", why)))?;
    url.set_query(query.filter(|query| !query.is_empty()));
    Ok(url)
}

fn carries_body(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::Request, routing::any};
    use serde_json::{json, Value};

    use super::*;
    use crate::tests::serve;

    #[derive(Debug, Clone, Default)]
    struct Seen {
        method: String,
        uri: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    /// An upstream that records the last request and answers with a fixed
    /// csv body.
    async fn upstream() -> (String, Arc<Mutex<Seen>>) {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/*path",
            any(move |req: Request| {
                let recorder = recorder.clone();
                async move {
                    let (parts, body) = req.into_parts();
                    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
                    *recorder.lock().unwrap() = Seen {
                        method: parts.method.to_string(),
                        uri: parts.uri.to_string(),
                        headers: parts
                            .headers
                            .iter()
                            .map(|(name, value)| {
                                (name.to_string(), value.to_str().unwrap().to_owned())
                            })
                            .collect(),
                        body: body.to_vec(),
                    };
                    (StatusCode::ACCEPTED, [(CONTENT_TYPE, "text/csv")], "a,b\n1,2\n")
                }
            }),
        );
        (serve(app).await, seen)
    }

    async fn proxy_server(upstream_base_url: Option<String>) -> String {
        let state = WebState::new(ProxyConfig { upstream_base_url }, None, None);
        serve(crate::app(state, &crate::WebConfig::default())).await
    }

    #[test]
    fn target_url_keeps_query_verbatim() {
        let url = target_url("http://analytics:8000/", "api/stats", Some("a=1&b=%20x")).unwrap();
        assert_eq!(url.as_str(), "http://analytics:8000/api/stats?a=1&b=%20x");

        let url = target_url("http://analytics:8000", "daily", None).unwrap();
        assert_eq!(url.as_str(), "http://analytics:8000/daily");

        assert!(target_url("not a url", "daily", None).is_err());
    }

    #[test]
    fn encoded_paths_stay_below_the_base() {
        let base = "http://analytics:8000/analytics/v1/";
        let target = |path: &str| target_url(base, path, None).map(|url| url.to_string());

        assert_eq!(
            target("reports%3Fid/summary").unwrap(),
            "http://analytics:8000/analytics/v1/reports%3Fid/summary"
        );
        assert_eq!(
            target("files/a%2Fb").unwrap(),
            "http://analytics:8000/analytics/v1/files/a%2Fb"
        );
        assert_eq!(
            target("..%2F..%2Fadmin%2Fusers").unwrap(),
            "http://analytics:8000/analytics/v1/..%2F..%2Fadmin%2Fusers"
        );
        assert_eq!(
            target("//elsewhere.example/x").unwrap(),
            "http://analytics:8000/analytics/v1//elsewhere.example/x"
        );
        assert!(target("../admin").is_err());
        assert!(target("a/%2E%2e/admin").is_err());
        assert!(target("./x").is_err());
    }

    #[test]
    fn route_prefix_is_stripped() {
        assert_eq!(proxied_path("/api/analytics-proxy/a%2Fb/c"), "a%2Fb/c");
        assert_eq!(proxied_path("/analytics-proxy/summary"), "summary");
        assert_eq!(proxied_path("/other"), "other");
    }

    #[test]
    fn only_writing_methods_carry_a_body() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::DELETE));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::HEAD));
    }

    #[tokio::test]
    async fn forwards_request_and_mirrors_response() {
        let (upstream_url, seen) = upstream().await;
        let server = proxy_server(Some(format!("{}/", upstream_url))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/analytics-proxy/api/bookings?range=7d", server))
            .header("authorization", "Bearer token")
            .header("content-type", "application/json")
            .header("x-secret", "dropped")
            .body(r#"{"a":1}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "text/csv");
        assert_eq!(response.text().await.unwrap(), "a,b\n1,2\n");

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.method, "POST");
        assert_eq!(seen.uri, "/api/bookings?range=7d");
        assert_eq!(seen.body, br#"{"a":1}"#);
        assert!(seen
            .headers
            .contains(&("authorization".to_owned(), "Bearer token".to_owned())));
        assert!(seen.headers.iter().all(|(name, _)| name != "x-secret"));
    }

    #[tokio::test]
    async fn get_requests_are_forwarded_without_body() {
        let (upstream_url, seen) = upstream().await;
        let server = proxy_server(Some(format!("{}/", upstream_url))).await;

        let response = reqwest::Client::new()
            .get(format!("{}/analytics-proxy/summary", server))
            .body("ignored")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.uri, "/summary");
        assert!(seen.body.is_empty());
    }

    #[tokio::test]
    async fn encoded_characters_reach_the_upstream_unchanged() {
        let (upstream_url, seen) = upstream().await;
        let server = proxy_server(Some(format!("{}/analytics/v1/", upstream_url))).await;

        for (path, expected) in [
            ("reports%3Fid/summary", "/analytics/v1/reports%3Fid/summary?range=7d"),
            ("files/a%2Fb", "/analytics/v1/files/a%2Fb?range=7d"),
            ("x%23y", "/analytics/v1/x%23y?range=7d"),
            (
                "..%2F..%2Fadmin%2Fusers",
                "/analytics/v1/..%2F..%2Fadmin%2Fusers?range=7d",
            ),
        ] {
            let response = reqwest::get(format!("{}/analytics-proxy/{}?range=7d", server, path))
                .await
                .unwrap();

            assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
            assert_eq!(seen.lock().unwrap().uri, expected);
        }
    }

    #[tokio::test]
    async fn missing_upstream_is_a_server_error() {
        let server = proxy_server(None).await;

        let response = reqwest::get(format!("{}/api/analytics-proxy/summary", server))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>().await.unwrap(),
            json!({"error": "ANALYTICS_API_URL is not configured"})
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_bad_gateway() {
        let server = proxy_server(Some("http://127.0.0.1:9/".to_owned())).await;

        let response = reqwest::get(format!("{}/api/analytics-proxy/summary", server))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body = response.json::<Value>().await.unwrap();
        assert_eq!(body["error"], "Proxy error");
        assert!(body["message"].is_string());
    }
}
