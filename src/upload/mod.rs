//! Image uploads
//!
//! Validates palm photos sent by the browser, normalizes them to a bounded
//! JPEG, and stores them in S3-compatible object storage (DigitalOcean
//! Spaces) so the workflow API can fetch them by URL.

pub mod client;
pub mod inline;
pub mod mock;
pub mod normalize;

pub use client::S3UploadClient;
pub use inline::InlineUploadClient;
pub use mock::MockUploadClient;

use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
pub const DEFAULT_NAMESPACE: &str = "palm";
const MAX_NAMESPACE_LEN: usize = 32;

#[async_trait]
pub trait UploadService: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file was provided")]
    MissingFile,

    #[error("Invalid namespace '{0}'")]
    InvalidNamespace(String),

    #[error("File is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Request body exceeds the upload limit of {max} bytes")]
    BodyTooLarge { max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Invalid upload form: {0}")]
    InvalidForm(String),

    #[error("Could not process image: {0}")]
    Processing(crate::Error),

    #[error("Storage failure: {0}")]
    Storage(crate::Error),
}

/// An uploaded file as received from the browser.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Vec<u8>,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
}

pub fn validate_namespace(namespace: &str) -> std::result::Result<(), UploadError> {
    let valid = !namespace.is_empty()
        && namespace.len() <= MAX_NAMESPACE_LEN
        && namespace
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(UploadError::InvalidNamespace(namespace.to_string()))
    }
}

/// Check size and type. The sniffed format must be allow-listed and, when the
/// client declared a type, agree with it.
pub fn validate_file(file: &UploadFile, max_bytes: usize) -> std::result::Result<&'static str, UploadError> {
    if file.data.is_empty() {
        return Err(UploadError::MissingFile);
    }
    if file.data.len() > max_bytes {
        return Err(UploadError::TooLarge {
            size: file.data.len(),
            max: max_bytes,
        });
    }

    if let Some(declared) = file.content_type.as_deref() {
        if !ALLOWED_IMAGE_TYPES.contains(&declared) {
            return Err(UploadError::UnsupportedType(declared.to_string()));
        }
    }

    let sniffed = image::guess_format(&file.data)
        .map(|format| format.to_mime_type())
        .map_err(|_| UploadError::UnsupportedType("unrecognized image data".to_string()))?;

    if !ALLOWED_IMAGE_TYPES.contains(&sniffed) {
        return Err(UploadError::UnsupportedType(sniffed.to_string()));
    }
    if let Some(declared) = file.content_type.as_deref() {
        if declared != sniffed {
            return Err(UploadError::UnsupportedType(format!(
                "declared {} but content is {}",
                declared, sniffed
            )));
        }
    }
    Ok(sniffed)
}

/// Validates, normalizes and stores uploaded images.
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn UploadService>,
    max_bytes: usize,
}

impl ImageUploader {
    pub fn new(storage: Arc<dyn UploadService>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn upload(
        &self,
        file: UploadFile,
        namespace: &str,
    ) -> std::result::Result<String, UploadError> {
        validate_namespace(namespace)?;
        let sniffed = validate_file(&file, self.max_bytes)?;
        let original_size = file.data.len();

        let normalized = normalize::normalize(file.data)
            .await
            .map_err(UploadError::Processing)?;

        let key = format!(
            "{}/{}/{}.jpg",
            namespace,
            Utc::now().format("%Y-%m-%d"),
            Uuid::new_v4()
        );
        let url = self
            .storage
            .upload_file(&key, &normalized.bytes, normalize::OUTPUT_MIME)
            .await
            .map_err(UploadError::Storage)?;

        tracing::info!(
            "Stored upload {} ({} {} bytes -> {}x{} jpeg {} bytes)",
            key,
            sniffed,
            original_size,
            normalized.width,
            normalized.height,
            normalized.bytes.len()
        );
        Ok(url)
    }
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 150, 120, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
