//! The conversion workflow and its reply-and-log policy.
//!
//! [`Relay`] is the application context: built once at startup, shared by
//! every handler through an `Arc`, and immutable afterwards. One request
//! flows through it like this:
//!
//! ```text
//! admit ─▶ stage ─▶ download ─▶ status ─▶ convert ─▶ verify ─▶ thumbnail ─▶ upload
//!   │                   (any error)                                   (non-fatal)
//!   └──────────────────────────▶ report: log + one failure reply
//! ```
//!
//! Scratch artifacts are released after the last step on every path, before
//! the failure reply is sent, so a failed request never leaves files behind.

use crate::config::RelayConfig;
use crate::error::{FailureKind, RelayError};
use crate::messages;
use crate::pipeline::converter::{self, Converter};
use crate::pipeline::scratch::ScratchSpace;
use crate::pipeline::thumbnail::ThumbnailSource;
use crate::pipeline::{admission, naming};
use crate::request::{ConversionRequest, Delivery};
use crate::transport::{ChatTransport, OutgoingDocument};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Shared application context.
pub struct Relay {
    config: RelayConfig,
    transport: Arc<dyn ChatTransport>,
    converter: Arc<dyn Converter>,
    thumbnail: ThumbnailSource,
}

impl Relay {
    pub fn new(
        config: RelayConfig,
        transport: Arc<dyn ChatTransport>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        let thumbnail = ThumbnailSource::from_config(&config);
        Self {
            config,
            transport,
            converter,
            thumbnail,
        }
    }

    /// Answer `/start` and `/help`.
    pub async fn greet(&self, chat_id: i64) {
        self.reply(chat_id, messages::GREETING).await;
    }

    /// Answer a text message that is not a command.
    pub async fn hint(&self, chat_id: i64) {
        self.reply(chat_id, messages::SEND_EPUB_HINT).await;
    }

    /// Run the full workflow for one attachment and reply to the sender.
    ///
    /// Failures are logged and answered with exactly one text reply before
    /// this returns; the `Err` is handed back for callers that want it.
    pub async fn handle_document(
        &self,
        request: ConversionRequest,
    ) -> Result<Delivery, RelayError> {
        let span = info_span!(
            "conversion",
            chat_id = request.chat_id,
            message_id = request.message_id,
        );

        async {
            match self.process(&request).await {
                Ok(delivery) => {
                    info!(
                        file = %delivery.file_name,
                        bytes = delivery.pdf_bytes,
                        thumbnail = delivery.thumbnail_attached,
                        "Delivered in {}ms",
                        delivery.duration_ms
                    );
                    Ok(delivery)
                }
                Err(e) => {
                    self.report(&request, &e).await;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Admission, staging, conversion and upload, without replying on error.
    ///
    /// Rejected attachments return before any file is created.
    pub async fn process(&self, request: &ConversionRequest) -> Result<Delivery, RelayError> {
        admission::admit(request)?;

        let started = Instant::now();
        let scratch = ScratchSpace::create(&self.config.scratch_dir, request).await?;
        let outcome = self.run(request, &scratch, started).await;
        scratch.release();
        outcome
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        scratch: &ScratchSpace,
        started: Instant,
    ) -> Result<Delivery, RelayError> {
        info!("Receiving '{}'", request.file_name);
        self.transport
            .download(&request.file_id, scratch.input())
            .await?;

        if let Err(e) = self
            .transport
            .send_text(request.chat_id, &messages::processing(&request.file_name))
            .await
        {
            warn!("Status reply failed, continuing: {}", e);
        }

        self.converter
            .convert(scratch.input(), scratch.output())
            .await?;
        let pdf_bytes = converter::verify_output(scratch.output()).await?;

        let thumbnail = match self.thumbnail.prepare().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Sending without thumbnail: {}", e);
                None
            }
        };
        let thumbnail_attached = thumbnail.is_some();

        let file_name = naming::output_file_name(&request.file_name, &self.config.output_suffix);
        self.transport
            .send_document(
                request.chat_id,
                OutgoingDocument {
                    path: scratch.output().to_path_buf(),
                    file_name: file_name.clone(),
                    caption: messages::caption(thumbnail_attached),
                    thumbnail,
                },
            )
            .await?;

        Ok(Delivery {
            file_name,
            thumbnail_attached,
            pdf_bytes,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Log `error` at a level matching its kind and send the one failure reply.
    async fn report(&self, request: &ConversionRequest, error: &RelayError) {
        let kind = error.kind();
        match kind {
            FailureKind::Validation => info!(file = %request.file_name, "{}", error),
            FailureKind::Conversion => warn!(
                file = %request.file_name,
                converter = self.converter.name(),
                "Conversion failed: {}",
                error
            ),
            FailureKind::Transport => error!(file = %request.file_name, "Request failed: {}", error),
        }
        self.reply(request.chat_id, messages::failure_reply(kind))
            .await;
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.transport.send_text(chat_id, text).await {
            error!(chat_id, "Failed to reply: {}", e);
        }
    }
}
