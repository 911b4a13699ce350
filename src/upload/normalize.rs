use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

/// Longest side of a stored image, in pixels.
pub const MAX_DIMENSION: u32 = 2048;
pub const OUTPUT_MIME: &str = "image/jpeg";
const JPEG_QUALITY: u8 = 85;

pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

fn normalize_sync(data: &[u8]) -> Result<NormalizedImage> {
    let img = image::load_from_memory(data)?;

    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel. Re-encoding also drops EXIF (GPS, orientation).
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?;

    Ok(NormalizedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
    })
}

/// Decode, downscale and re-encode as JPEG off the async runtime.
pub async fn normalize(data: Vec<u8>) -> Result<NormalizedImage> {
    tokio::task::spawn_blocking(move || normalize_sync(&data))
        .await
        .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::test_png;

    #[tokio::test]
    async fn test_small_image_keeps_dimensions() {
        let out = normalize(test_png(10, 6)).await.unwrap();

        assert_eq!((out.width, out.height), (10, 6));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.width(), 10);
    }

    #[tokio::test]
    async fn test_large_image_is_downscaled_preserving_aspect() {
        let out = normalize(test_png(4096, 1024)).await.unwrap();

        assert_eq!(out.width, MAX_DIMENSION);
        assert_eq!(out.height, 512);
    }

    #[tokio::test]
    async fn test_output_is_jpeg() {
        let out = normalize(test_png(4, 4)).await.unwrap();
        assert_eq!(&out.bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_garbage_is_an_image_error() {
        let err = normalize(vec![0x89, 0x50, 0x4E, 0x47, 0, 0]).await.err().unwrap();
        assert!(matches!(err, Error::Image(_)));
    }
}
