use crate::server::AppState;
use crate::upload::{UploadError, UploadFile, DEFAULT_NAMESPACE};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MissingFile
            | UploadError::InvalidNamespace(_)
            | UploadError::InvalidForm(_)
            | UploadError::Processing(_) => StatusCode::BAD_REQUEST,
            UploadError::TooLarge { .. } | UploadError::BodyTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            UploadError::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::Storage(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingFile => "missing_file",
            UploadError::InvalidNamespace(_) => "invalid_namespace",
            UploadError::TooLarge { .. } | UploadError::BodyTooLarge { .. } => "too_large",
            UploadError::UnsupportedType(_) => "unsupported_type",
            UploadError::InvalidForm(_) => "invalid_form",
            UploadError::Processing(_) => "invalid_image",
            UploadError::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind()
            }
        });

        (self.status(), Json(body)).into_response()
    }
}

fn form_error(e: MultipartError, max_bytes: usize) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::BodyTooLarge { max: max_bytes }
    } else {
        UploadError::InvalidForm(e.body_text())
    }
}

/// `POST /api/upload`: multipart form with `file` and optional `namespace`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let max_bytes = state.uploader.max_bytes();
    let mut file: Option<UploadFile> = None;
    let mut namespace = DEFAULT_NAMESPACE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| form_error(e, max_bytes))?;
                file = Some(UploadFile {
                    data: data.to_vec(),
                    content_type,
                });
            }
            "namespace" => {
                let value = field.text().await.map_err(|e| form_error(e, max_bytes))?;
                let value = value.trim();
                if !value.is_empty() {
                    namespace = value.to_string();
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or(UploadError::MissingFile)?;
    info!(
        "Upload request: {} bytes ({}), namespace {}",
        file.data.len(),
        file.content_type.as_deref().unwrap_or("no content type"),
        namespace
    );

    let url = state.uploader.upload(file, &namespace).await.map_err(|e| {
        warn!("Upload rejected: {}", e);
        e
    })?;

    Ok(Json(serde_json::json!({ "url": url })))
}
