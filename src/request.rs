//! Per-request data: what came in and what went out.

/// One inbound document upload, detached from the transport's own types.
///
/// Everything except `chat_id` and `message_id` was declared by the sender
/// and is untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Conversation the reply goes to.
    pub chat_id: i64,
    /// Id of the message carrying the attachment; unique within the chat.
    pub message_id: i32,
    /// Transport-specific handle used to download the content.
    pub file_id: String,
    /// File name as declared by the sender.
    pub file_name: String,
    /// MIME type as declared by the sender, if any.
    pub mime_type: Option<String>,
}

/// Summary of a successfully delivered conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// File name the PDF was uploaded under.
    pub file_name: String,
    /// Whether the branding thumbnail was attached.
    pub thumbnail_attached: bool,
    /// Size of the uploaded PDF in bytes.
    pub pdf_bytes: u64,
    /// Wall-clock time from admission to upload.
    pub duration_ms: u64,
}
