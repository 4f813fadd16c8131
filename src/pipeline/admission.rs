//! Admission control for inbound attachments.
//!
//! Telegram clients do not always fill in the MIME type, and some set it to
//! `application/octet-stream` for EPUB files. An attachment is therefore
//! admitted when *either* the declared MIME type *or* the file extension
//! says EPUB. Nothing here touches the filesystem.

use crate::error::RelayError;
use crate::request::ConversionRequest;
use tracing::debug;

/// Registered MIME type for EPUB publications.
pub const EPUB_MIME: &str = "application/epub+zip";

/// File extension (without dot) the converter keys its input format on.
pub const EPUB_EXTENSION: &str = "epub";

/// `true` when `file_name` ends in `.epub`, ignoring case.
pub fn has_epub_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(EPUB_EXTENSION))
}

/// `true` when the declared MIME type is the EPUB type.
///
/// Parameters such as `; charset=...` are ignored.
pub fn has_epub_mime(mime_type: Option<&str>) -> bool {
    mime_type
        .and_then(|m| m.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(EPUB_MIME))
}

/// Reject attachments that are neither declared nor named as EPUB.
pub fn admit(request: &ConversionRequest) -> Result<(), RelayError> {
    let by_mime = has_epub_mime(request.mime_type.as_deref());
    let by_name = has_epub_extension(&request.file_name);

    if by_mime || by_name {
        debug!(by_mime, by_name, "Admitted '{}'", request.file_name);
        Ok(())
    } else {
        Err(RelayError::UnsupportedDocument {
            file_name: request.file_name.clone(),
            mime_type: request.mime_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(file_name: &str, mime: Option<&str>) -> ConversionRequest {
        ConversionRequest {
            chat_id: 1,
            message_id: 1,
            file_id: "f".into(),
            file_name: file_name.into(),
            mime_type: mime.map(str::to_string),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_epub_extension("book.epub"));
        assert!(has_epub_extension("Book.EPUB"));
        assert!(!has_epub_extension("book.pdf"));
        assert!(!has_epub_extension("epub"));
        assert!(!has_epub_extension("book.epub.zip"));
    }

    #[test]
    fn mime_check_ignores_parameters() {
        assert!(has_epub_mime(Some("application/epub+zip")));
        assert!(has_epub_mime(Some("application/epub+zip; charset=binary")));
        assert!(!has_epub_mime(Some("application/pdf")));
        assert!(!has_epub_mime(None));
    }

    #[test]
    fn either_signal_admits() {
        assert!(admit(&request("book.epub", None)).is_ok());
        assert!(admit(&request("book.epub", Some("application/octet-stream"))).is_ok());
        assert!(admit(&request("book", Some(EPUB_MIME))).is_ok());
    }

    #[test]
    fn neither_signal_rejects() {
        let err = admit(&request("notes.txt", Some("text/plain"))).unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedDocument { .. }));

        let err = admit(&request("scan.pdf", None)).unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedDocument { .. }));
    }
}
