use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use rand::RngCore;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser, auth::token::now_millis, error::ApiError, state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /upload: multipart `file` field, image types only, 10MB cap.
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut file: Option<(String, String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.bin").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("File too large (max 10MB)".to_string()))?;
            file = Some((file_name, content_type, data));
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation("File too large (max 10MB)".to_string()));
    }
    if !ALLOWED_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::Validation(
            "Only image files are allowed".to_string(),
        ));
    }

    let key = object_key(&file_name);
    state.storage.put_object(&key, data, &content_type).await?;
    let url = state.storage.object_url(&key);

    info!(%key, "image uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

fn object_key(original_name: &str) -> String {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let mut nonce = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut nonce);
    format!("uploads/{}-{}.{}", now_millis(), hex::encode(nonce), ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::Role;
    use crate::auth::token::TokenKeys;
    use axum::body::Body;
    use axum::extract::FromRef;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "upload-test-boundary";

    fn multipart_body(file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_upload(state: AppState, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let token = TokenKeys::from_ref(&state)
            .mint(1, "admin@admin.com", Role::Admin)
            .expect("mint");
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("authorization", format!("Bearer {token}"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = crate::uploads::router()
            .with_state(state)
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn small_image_answers_created_with_object_url() {
        let state = AppState::fake();
        let body = multipart_body("pic.png", "image/png", b"png-bytes");
        let (status, json) = post_upload(state, body).await;
        assert_eq!(status, StatusCode::CREATED);
        let url = json["url"].as_str().expect("url");
        assert!(url.starts_with("https://fake.local/uploads/"));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let state = AppState::fake();
        let body = multipart_body("big.png", "image/png", &vec![0u8; MAX_UPLOAD_BYTES + 1]);
        let (status, json) = post_upload(state, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "File too large (max 10MB)");
    }

    #[tokio::test]
    async fn non_image_type_is_rejected() {
        let state = AppState::fake();
        let body = multipart_body("doc.pdf", "application/pdf", b"%PDF-1.4");
        let (status, json) = post_upload(state, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Only image files are allowed");
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let state = AppState::fake();
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"other\"\r\n\r\n\
             text\r\n--{BOUNDARY}--\r\n"
        )
        .into_bytes();
        let (status, json) = post_upload(state, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file provided");
    }

    #[tokio::test]
    async fn truncated_multipart_body_reports_the_parse_failure() {
        let state = AppState::fake();
        // Headers cut off mid-part; the stream errors instead of ending.
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"\r\n"
        )
        .into_bytes();
        let (status, json) = post_upload(state, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = json["error"].as_str().expect("message");
        assert!(message.starts_with("Malformed multipart body"), "{message}");
    }

    #[test]
    fn object_key_keeps_extension_and_is_unique() {
        let a = object_key("photo.PNG");
        let b = object_key("photo.PNG");
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with(".PNG"));
        assert_ne!(a, b);
    }

    #[test]
    fn object_key_falls_back_without_extension() {
        assert!(object_key("noext").ends_with(".bin"));
        assert!(object_key("").ends_with(".bin"));
    }
}
