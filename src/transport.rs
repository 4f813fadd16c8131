//! Chat transport: everything the workflow needs from the messaging platform.
//!
//! The workflow only ever talks to a [`ChatTransport`]; the Telegram
//! implementation wraps a teloxide [`Bot`]. Tests substitute an in-memory
//! transport that records what would have been sent.

use crate::error::RelayError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// File name Telegram sees for the uploaded thumbnail.
const THUMBNAIL_FILE_NAME: &str = "thumbnail.jpg";

/// A converted document ready to be uploaded.
#[derive(Debug, Clone)]
pub struct OutgoingDocument {
    /// Local file to upload.
    pub path: PathBuf,
    /// Name shown to the recipient.
    pub file_name: String,
    /// Caption shown under the document.
    pub caption: String,
    /// JPEG thumbnail, if one could be prepared.
    pub thumbnail: Option<Vec<u8>>,
}

/// Messaging operations used by the relay.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), RelayError>;

    /// Download the attachment `file_id` into `destination`.
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), RelayError>;

    /// Upload a document with caption and optional thumbnail.
    async fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> Result<(), RelayError>;
}

/// [`ChatTransport`] backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), RelayError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| RelayError::SendFailed {
                what: "message",
                chat_id,
                detail: e.to_string(),
            })?;
        Ok(())
    }

    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), RelayError> {
        let download_failed = |detail: String| RelayError::DownloadFailed {
            file_id: file_id.to_string(),
            detail,
        };

        let file = self
            .bot
            .get_file(file_id)
            .await
            .map_err(|e| download_failed(e.to_string()))?;

        let scratch_error = |e: std::io::Error| RelayError::Scratch {
            path: destination.to_path_buf(),
            source: e,
        };
        let mut dst = tokio::fs::File::create(destination)
            .await
            .map_err(scratch_error)?;
        self.bot
            .download_file(&file.path, &mut dst)
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        dst.flush().await.map_err(scratch_error)?;

        debug!(
            "Downloaded {} bytes to {}",
            file.meta.size,
            destination.display()
        );
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: i64,
        document: OutgoingDocument,
    ) -> Result<(), RelayError> {
        let file = InputFile::file(document.path).file_name(document.file_name);
        let mut request = self
            .bot
            .send_document(ChatId(chat_id), file)
            .caption(document.caption);
        if let Some(bytes) = document.thumbnail {
            request = request.thumbnail(InputFile::memory(bytes).file_name(THUMBNAIL_FILE_NAME));
        }

        request.await.map_err(|e| RelayError::SendFailed {
            what: "document",
            chat_id,
            detail: e.to_string(),
        })?;
        Ok(())
    }
}
