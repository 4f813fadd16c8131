//! Error types for the oldtown-epub2pdf relay.
//!
//! Every failure a request can hit is a [`RelayError`]. The variants carry
//! enough context (paths, exit codes, file names) to produce a useful log
//! line, while [`RelayError::kind`] folds them into the three
//! [`FailureKind`]s the reply policy cares about:
//!
//! * [`FailureKind::Validation`]: the sender uploaded the wrong thing.
//!   They get a rejection text; nothing is retried.
//! * [`FailureKind::Conversion`]: the converter could not turn the upload
//!   into a PDF. They get a "send a valid epub" text.
//! * [`FailureKind::Transport`]: the chat API, the scratch directory or
//!   anything else unexpected failed. They get a generic "try again" text.
//!
//! Thumbnail errors are ordinary variants as well but never leave the
//! workflow: a failed thumbnail degrades the reply instead of failing it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while handling a single conversion request.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Admission ─────────────────────────────────────────────────────────
    /// The attachment is neither declared as an EPUB nor named like one.
    #[error("Rejected attachment '{file_name}' (declared MIME type: {mime_type:?})")]
    UnsupportedDocument {
        file_name: String,
        mime_type: Option<String>,
    },

    // ── Converter ─────────────────────────────────────────────────────────
    /// The converter binary could not be started at all.
    #[error("Failed to start converter '{program}': {source}")]
    ConverterSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but exited unsuccessfully.
    #[error("Converter exited with status {status}: {stderr}")]
    ConverterFailed { status: String, stderr: String },

    /// The converter did not finish in time and was killed.
    #[error("Converter timed out after {secs}s on '{input}'")]
    ConverterTimeout { input: PathBuf, secs: u64 },

    /// The converter reported success but produced nothing usable.
    #[error("Converter produced no PDF at '{path}': {detail}")]
    MissingOutput { path: PathBuf, detail: String },

    // ── Thumbnail (non-fatal) ─────────────────────────────────────────────
    /// The thumbnail source could not be read, decoded or re-encoded.
    #[error("Thumbnail preparation failed for '{path}': {detail}")]
    Thumbnail { path: PathBuf, detail: String },

    // ── Transport ─────────────────────────────────────────────────────────
    /// Downloading the attachment from the chat platform failed.
    #[error("Failed to download file '{file_id}': {detail}")]
    DownloadFailed { file_id: String, detail: String },

    /// Sending a reply or the converted document failed.
    #[error("Failed to send {what} to chat {chat_id}: {detail}")]
    SendFailed {
        what: &'static str,
        chat_id: i64,
        detail: String,
    },

    /// Creating or writing scratch files failed.
    #[error("Scratch storage error at '{path}': {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by the reply-and-log policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Wrong input from the sender; reply with a rejection, never retry.
    Validation,
    /// The converter failed on this input.
    Conversion,
    /// Chat API, filesystem or other unexpected failure.
    Transport,
}

impl RelayError {
    /// Map this error onto the reply policy's taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            RelayError::UnsupportedDocument { .. } => FailureKind::Validation,
            RelayError::ConverterSpawn { .. }
            | RelayError::ConverterFailed { .. }
            | RelayError::ConverterTimeout { .. }
            | RelayError::MissingOutput { .. } => FailureKind::Conversion,
            RelayError::Thumbnail { .. }
            | RelayError::DownloadFailed { .. }
            | RelayError::SendFailed { .. }
            | RelayError::Scratch { .. }
            | RelayError::InvalidConfig(_)
            | RelayError::Internal(_) => FailureKind::Transport,
        }
    }
}
