//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workflow API error: {0}")]
    Workflow(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
