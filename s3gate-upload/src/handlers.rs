//! Upload HTTP handler

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::StatusCode,
};
use bytes::Bytes;
use s3gate_core::GatewayError;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::key::upload_key;
use crate::storage::{ObjectMetadata, ObjectStore, PutObjectResult, StorageError};

/// Multipart field holding the uploaded file
pub const UPLOAD_FIELD: &str = "image";

/// Body returned after a successful upload
pub const UPLOAD_SUCCESS: &str = "File uploaded successfully";

/// Shared state for the upload handler
pub struct UploadState {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
}

/// A file part read from the request
#[derive(Debug)]
pub struct FileField {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FileField {
    /// Key the file is stored under
    pub fn key(&self) -> &str {
        upload_key(&self.filename)
    }
}

/// `POST /upload`
pub async fn upload(
    State(state): State<Arc<UploadState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<&'static str, GatewayError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Request is not a readable multipart form");
        GatewayError::MissingFile
    })?;

    let file = read_file_field(&mut multipart, UPLOAD_FIELD).await?;
    store_file(&state, file).await?;

    Ok(UPLOAD_SUCCESS)
}

/// Find the first part called `name` that carries a filename and read it.
///
/// Parts with that name but no filename are form values, not files, and are skipped.
pub async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<FileField, GatewayError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                debug!(field = name, "No file part in request");
                return Err(GatewayError::MissingFile);
            }
            Err(e) if exceeds_body_limit(&e) => {
                warn!(field = name, error = %e, "Request body exceeds the upload limit");
                return Err(GatewayError::OpenFile);
            }
            Err(e) => {
                debug!(field = name, error = %e, "Malformed multipart body");
                return Err(GatewayError::MissingFile);
            }
        };

        if field.name() != Some(name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);

        let data = field.bytes().await.map_err(|e| {
            warn!(field = name, filename = %filename, error = %e, "Failed to read file part");
            GatewayError::OpenFile
        })?;

        return Ok(FileField {
            filename,
            content_type,
            data,
        });
    }
}

/// Body-limit rejections can surface while scanning for the part or while
/// reading it; both count as a failure to read the file.
fn exceeds_body_limit(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

/// Write a file to the configured bucket, consuming it.
///
/// The part's bytes move into the store call and are dropped exactly once
/// when it returns, whichever way it returns.
pub async fn store_file(
    state: &UploadState,
    file: FileField,
) -> Result<PutObjectResult, GatewayError> {
    let key = file.key().to_owned();
    let FileField {
        content_type, data, ..
    } = file;
    let size = data.len();

    match state
        .store
        .put_object(&state.bucket, &key, data, ObjectMetadata { content_type })
        .await
    {
        Ok(result) => {
            info!(bucket = %state.bucket, key = %key, size, "File uploaded");
            Ok(result)
        }
        Err(StorageError::Config(detail)) => {
            warn!(bucket = %state.bucket, key = %key, error = %detail, "Storage client misconfigured");
            Err(GatewayError::StorageConfig)
        }
        Err(e) => {
            warn!(bucket = %state.bucket, key = %key, error = %e, "Upload failed");
            Err(GatewayError::Upload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EphemeralStore;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        extract::DefaultBodyLimit,
        http::{header, Request},
        routing::post,
        Router,
    };
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "s3gate-test-boundary";

    /// Store that always fails and counts how often it was called
    struct FailingStore {
        config_error: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _data: Bytes,
            _metadata: ObjectMetadata,
        ) -> Result<PutObjectResult, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.config_error {
                Err(StorageError::Config("missing region".to_string()))
            } else {
                Err(StorageError::Upload("access denied".to_string()))
            }
        }
    }

    fn app(store: Arc<dyn ObjectStore>) -> Router {
        let state = Arc::new(UploadState {
            store,
            bucket: "uploads".to_string(),
        });
        Router::new().route("/upload", post(upload)).with_state(state)
    }

    /// Build a multipart body from (field name, filename, content)
    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    async fn post_body(app: Router, body: String) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upload_success() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let body = multipart_body(&[("image", Some("photo.png"), "png bytes")]);

        let (status, text) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "File uploaded successfully");

        let obj = store.get_object("uploads", "photo.png").unwrap();
        assert_eq!(obj.data, Bytes::from("png bytes"));
        assert_eq!(obj.metadata.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_upload_key_is_base_name() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let body = multipart_body(&[("image", Some("a/b/../../etc/photo.png"), "data")]);

        let (status, _) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.list_keys("uploads").unwrap(), vec!["photo.png".to_string()]);
    }

    #[tokio::test]
    async fn test_skips_other_fields() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let body = multipart_body(&[
            ("caption", None, "a cat"),
            ("image", None, "not a file"),
            ("image", Some("cat.png"), "meow"),
        ]);

        let (status, _) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            store.get_object("uploads", "cat.png").unwrap().data,
            Bytes::from("meow")
        );
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let store = Arc::new(FailingStore {
            config_error: false,
            calls: AtomicUsize::new(0),
        });
        let body = multipart_body(&[("document", Some("cv.pdf"), "pdf")]);

        let (status, text) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Error retrieving the file");
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_without_filename_is_missing() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let body = multipart_body(&[("image", None, "plain value")]);

        let (status, _) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.list_keys("uploads").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_multipart() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(store).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_truncated_file_part() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\r\npartial data"
        );

        let (status, text) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error opening the file");
        assert!(store.list_keys("uploads").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));
        let router = app(store.clone()).layer(DefaultBodyLimit::max(1024));
        let body = multipart_body(&[("image", Some("big.png"), &"x".repeat(2048))]);

        let (status, text) = post_body(router, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error opening the file");
        assert!(store.list_keys("uploads").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let store = Arc::new(FailingStore {
            config_error: false,
            calls: AtomicUsize::new(0),
        });
        let body = multipart_body(&[("image", Some("photo.png"), "data")]);

        let (status, text) = post_body(app(store.clone()), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error uploading to S3");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_storage_config_failure() {
        let store = Arc::new(FailingStore {
            config_error: true,
            calls: AtomicUsize::new(0),
        });
        let body = multipart_body(&[("image", Some("photo.png"), "data")]);

        let (status, text) = post_body(app(store), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error loading AWS configuration");
    }

    #[tokio::test]
    async fn test_missing_bucket_is_upload_error() {
        let store = Arc::new(EphemeralStore::new());
        let body = multipart_body(&[("image", Some("photo.png"), "data")]);

        let (status, text) = post_body(app(store), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error uploading to S3");
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let store = Arc::new(EphemeralStore::with_bucket("uploads"));

        let first = multipart_body(&[("image", Some("one/photo.png"), "first")]);
        let second = multipart_body(&[("image", Some("two/photo.png"), "second")]);
        assert_eq!(post_body(app(store.clone()), first).await.0, StatusCode::OK);
        assert_eq!(post_body(app(store.clone()), second).await.0, StatusCode::OK);

        assert_eq!(store.list_keys("uploads").unwrap(), vec!["photo.png".to_string()]);
        assert_eq!(
            store.get_object("uploads", "photo.png").unwrap().data,
            Bytes::from("second")
        );
    }
}
