//! Re-streams a workflow answer to the browser.
//!
//! The upstream reply is buffered in full, translated when its language does
//! not match the requested locale, then replayed as evenly paced text deltas
//! so the reader sees the same typing animation whatever the upstream speed.

use crate::extract::{Collected, TextCollector};
use crate::language::{self, Language};
use crate::models::Locale;
use crate::translate::Translator;
use crate::wire::{split_utf16, Pacing, WireChunk, WireMessage, CHUNK_UTF16_UNITS};
use crate::workflow::ByteStream;
use crate::Result;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn, Span};

/// Body stream handed to the HTTP layer. It never fails: every error is
/// reported inside the protocol.
pub type WireStream = BoxStream<'static, std::result::Result<Bytes, Infallible>>;

pub struct Transcoder {
    model: String,
    locale: Locale,
    pacing: Pacing,
    translator: Option<Translator>,
    span: Span,
}

impl Transcoder {
    pub fn new(model: &str, locale: Locale, pacing: Pacing, span: Span) -> Self {
        Self {
            model: model.to_string(),
            locale,
            pacing,
            translator: None,
            span,
        }
    }

    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Read the whole upstream body. A read error ends collection early;
    /// whatever arrived before it is kept.
    pub async fn collect(&self, mut upstream: ByteStream) -> Collected {
        let mut collector = TextCollector::new();
        let mut received = 0usize;

        while let Some(item) = upstream.next().await {
            match item {
                Ok(bytes) => {
                    received += bytes.len();
                    collector.push(&bytes);
                }
                Err(e) => {
                    warn!(parent: &self.span, "Workflow stream interrupted after {} bytes: {}", received, e);
                    break;
                }
            }
        }

        let collected = collector.finish();
        info!(
            parent: &self.span,
            "Workflow answer collected ({} bytes in, {} chars out, {} error records)",
            received,
            collected.text.chars().count(),
            collected.errors.len()
        );
        collected
    }

    /// The text to show: the upstream answer, translated if needed, or the
    /// localized busy message when nothing usable came back.
    pub async fn resolve_text(&self, upstream: ByteStream) -> String {
        let collected = self.collect(upstream).await;

        if collected.text.trim().is_empty() {
            warn!(
                parent: &self.span,
                "Workflow produced no text (upstream errors: {:?})",
                collected.errors
            );
            return language::service_busy(self.locale).to_string();
        }

        let text = collected.text;
        let detected = language::detect(&text);
        let wanted = Language::from(self.locale);
        if detected == wanted {
            return text;
        }

        let Some(translator) = &self.translator else {
            return text;
        };

        info!(
            parent: &self.span,
            "Translating answer {:?} -> {:?} with {}",
            detected,
            wanted,
            translator.model()
        );
        match translator.translate(&text, wanted).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(parent: &self.span, "Translation failed, keeping original text: {}", e);
                text
            }
        }
    }

    /// Produce the full wire stream for an upstream call that has not been
    /// made yet. `message-start` goes out before `upstream` is awaited.
    pub fn transcode<F>(self, upstream: F) -> WireStream
    where
        F: Future<Output = Result<ByteStream>> + Send + 'static,
    {
        let stream = async_stream::stream! {
            yield Ok::<Bytes, Infallible>(WireChunk::MessageStart {
                message: WireMessage::assistant(&self.model),
            }
            .encode());

            match upstream.await {
                Ok(body) => {
                    let text = self.resolve_text(body).await;
                    let slices = split_utf16(&text, CHUNK_UTF16_UNITS);
                    let delay = self.pacing.delay_for(slices.len());

                    for (i, slice) in slices.iter().enumerate() {
                        if i > 0 && delay > Duration::ZERO {
                            tokio::time::sleep(delay).await;
                        }
                        yield Ok(WireChunk::text(*slice).encode());
                    }
                }
                Err(e) => {
                    warn!(parent: &self.span, "Workflow call failed: {}", e);
                    yield Ok(WireChunk::text(language::request_failed(self.locale, &e.to_string())).encode());
                }
            }

            yield Ok(WireChunk::MessageEnd.encode());
        };

        stream.boxed()
    }
}
