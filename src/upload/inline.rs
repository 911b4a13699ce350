use super::UploadService;
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;

/// Storage stand-in for local development: returns the image itself as a
/// `data:` URL instead of storing it anywhere.
#[derive(Debug, Default, Clone)]
pub struct InlineUploadClient;

impl InlineUploadClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UploadService for InlineUploadClient {
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        tracing::debug!("Inlining {} ({} bytes) as data URL", key, data.len());
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        Ok(format!("data:{};base64,{}", content_type, encoded))
    }
}
