use std::{env, error, fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

pub const DEFAULT_BUCKET: &str = "booking-archives";

#[derive(Debug, Clone)]
pub enum StorageError {
    RequestError(Arc<reqwest::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
}

impl error::Error for StorageError {}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            StorageError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response ({}) {}", status_code, url),
            },
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::RequestError(Arc::new(e))
    }
}

/// A bucket objects can be written to.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Writes `bytes` to `path`, replacing an existing object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

impl StorageConfig {
    pub fn from_env() -> Option<Self> {
        let url = env::var("SUPABASE_URL").ok()?;
        let service_key = env::var("SUPABASE_SERVICE_ROLE_KEY").ok()?;
        let bucket =
            env::var("ARCHIVE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_owned());
        Some(Self {
            url,
            service_key,
            bucket,
        })
    }

    pub fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.url.trim_end_matches('/'),
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

/// Client for the storage REST api of a supabase project.
#[derive(Clone)]
pub struct SupabaseStorage {
    config: StorageConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.config.object_url(path);
        log::debug!("Uploading {} bytes to '{url}'.", bytes.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status_code = response.status();
        if status_code.is_success() {
            return Ok(());
        }
        Err(StorageError::InvalidResponse {
            status_code,
            url,
            response: response.text().await.ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{
        body::Bytes,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Debug, Clone)]
    struct Upload {
        path: String,
        authorization: Option<String>,
        upsert: Option<String>,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    type Uploads = Arc<Mutex<Vec<Upload>>>;

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    async fn receive(
        State(uploads): State<Uploads>,
        Path(path): Path<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        if path.starts_with("booking-archives/forbidden") {
            return StatusCode::FORBIDDEN;
        }
        uploads.lock().unwrap().push(Upload {
            path,
            authorization: header(&headers, "authorization"),
            upsert: header(&headers, "x-upsert"),
            content_type: header(&headers, "content-type"),
            body: body.to_vec(),
        });
        StatusCode::OK
    }

    async fn serve(uploads: Uploads) -> String {
        let app = Router::new()
            .route("/storage/v1/object/*path", post(receive))
            .with_state(uploads);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{address}/")
    }

    fn storage(url: String) -> SupabaseStorage {
        SupabaseStorage::new(StorageConfig {
            url,
            service_key: "service-key".to_owned(),
            bucket: DEFAULT_BUCKET.to_owned(),
        })
    }

    #[test]
    fn object_url_joins_segments() {
        let config = StorageConfig {
            url: "https://project.supabase.co/".to_owned(),
            service_key: String::new(),
            bucket: "booking-archives".to_owned(),
        };
        assert_eq!(
            config.object_url("2024/01/booking_7.pdf"),
            "https://project.supabase.co/storage/v1/object/booking-archives/2024/01/booking_7.pdf"
        );
    }

    #[tokio::test]
    async fn uploads_with_upsert_and_credentials() {
        let uploads = Uploads::default();
        let storage = storage(serve(uploads.clone()).await);

        storage
            .upload("2024/01/booking_7.pdf", b"%PDF-".to_vec(), "application/pdf")
            .await
            .unwrap();

        let uploads = uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        let upload = &uploads[0];
        assert_eq!(upload.path, "booking-archives/2024/01/booking_7.pdf");
        assert_eq!(upload.authorization.as_deref(), Some("Bearer service-key"));
        assert_eq!(upload.upsert.as_deref(), Some("true"));
        assert_eq!(upload.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(upload.body, b"%PDF-");
    }

    #[tokio::test]
    async fn rejected_upload_is_an_error() {
        let storage = storage(serve(Uploads::default()).await);

        let error = storage
            .upload("forbidden.pdf", vec![], "application/pdf")
            .await
            .unwrap_err();

        match error {
            StorageError::InvalidResponse { status_code, .. } => {
                assert_eq!(status_code, reqwest::StatusCode::FORBIDDEN)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
