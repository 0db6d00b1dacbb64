//! Admin file upload
//!
//! Mounted outside the JSON router so it gets its own body limit.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use beeri_core::Message;
use tracing::instrument;

use crate::http::envelope::{created, Created};
use crate::http::error::ApiError;
use crate::http::extractors::AdminSession;
use crate::http::server::AppState;
use crate::services::StoredFile;

const FILE_FIELD: &str = "file";

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        tracing::debug!(error = %e, "malformed multipart body");
        ApiError::BadRequest(Message::MissingFile)
    }
}

/// POST /api/upload - multipart with a single `file` field
#[instrument(skip_all)]
async fn upload(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Created<StoredFile> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "not a multipart request");
        ApiError::BadRequest(Message::MissingFile)
    })?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let stored = state
            .uploads
            .store(&name, content_type.as_deref(), &bytes)
            .await?;
        return Ok(created(stored));
    }

    Err(ApiError::BadRequest(Message::MissingFile))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{admin_cookie, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    const BOUNDARY: &str = "beeri-test-boundary";

    fn multipart(field: &str, file_name: &str, content_type: &str, content: &[u8], admin: bool) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
        if admin {
            builder = builder.header("cookie", admin_cookie());
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn requires_admin() {
        let (status, _) = send(multipart("file", "a.pdf", "application/pdf", b"%PDF-1.4", false)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn stores_pdf_and_returns_public_url() {
        let (status, body) = send(multipart("file", "bus-contract.pdf", "application/pdf", b"%PDF-1.4", true)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert!(body["data"]["url"].as_str().unwrap().starts_with("/uploads/"));
        assert_eq!(body["data"]["content_type"], "application/pdf");
        assert_eq!(body["data"]["size"], 8);
    }

    #[tokio::test]
    async fn rejects_executables() {
        let (status, body) = send(multipart("file", "run.exe", "application/octet-stream", b"MZ", true)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn wrong_field_name_is_missing_file() {
        let (status, body) = send(multipart("attachment", "a.pdf", "application/pdf", b"%PDF", true)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "לא נבחר קובץ להעלאה");
    }

    #[tokio::test]
    async fn file_over_limit_is_413() {
        let big = vec![b'a'; 2048];
        let (status, body) = send(multipart("file", "big.pdf", "application/pdf", &big, true)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "payload_too_large");
    }

    #[tokio::test]
    async fn json_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header("content-type", "application/json")
            .header("cookie", admin_cookie())
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
