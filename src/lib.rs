//! Streaming chat backend for an AI palm-reading web app
//!
//! Palm readings run a hosted workflow, whose nested-JSON stream is parsed,
//! translated into the reader's language when needed, and re-streamed as
//! paced `0:<json>\n` records. Other models are bridged to OpenAI-compatible
//! providers. Palm photos are uploaded to object storage.

pub mod ai;
pub mod app;
pub mod bridge;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod language;
pub mod models;
pub mod prompts;
pub mod server;
pub mod transcoder;
pub mod translate;
pub mod upload;
pub mod wire;
pub mod workflow;

pub use error::{Error, Result};
