//! User-facing texts.
//!
//! The bot speaks Hebrew. All strings live here so the workflow code never
//! embeds reply text inline and a translation only touches this file.

use crate::error::FailureKind;

/// Reply to `/start` and `/help`.
pub const GREETING: &str = "שלום! שלח לי קובץ epub ואמיר אותו ל-PDF!";

/// Reply to plain text and to attachments that are not EPUB files.
pub const SEND_EPUB_HINT: &str = "שלח לי קובץ .epub ואמיר אותו ל-PDF";

/// Reply when the converter could not process the upload.
pub const CONVERSION_FAILED: &str = "שגיאה! אנא ספק קובץ epub תקין";

/// Reply for transport and other unexpected failures.
pub const TRY_AGAIN_LATER: &str = "משהו השתבש בעיבוד הקובץ. אנא נסה שוב בעוד מספר דקות";

/// Caption attached to every converted document.
pub const CAPTION: &str = "הנה ה-PDF שלך!";

/// Appended to the caption when the thumbnail could not be prepared.
pub const CAPTION_NO_THUMBNAIL: &str = "(ללא תמונה ממוזערת)";

/// Status line sent while the converter runs.
pub fn processing(file_name: &str) -> String {
    format!("מעבד... {file_name}")
}

/// Caption for the outgoing document.
pub fn caption(has_thumbnail: bool) -> String {
    if has_thumbnail {
        CAPTION.to_string()
    } else {
        format!("{CAPTION}\n{CAPTION_NO_THUMBNAIL}")
    }
}

/// The single reply sent for a failed request.
pub fn failure_reply(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Validation => SEND_EPUB_HINT,
        FailureKind::Conversion => CONVERSION_FAILED,
        FailureKind::Transport => TRY_AGAIN_LATER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_caption_mentions_missing_thumbnail() {
        assert_eq!(caption(true), CAPTION);
        let degraded = caption(false);
        assert!(degraded.starts_with(CAPTION));
        assert!(degraded.contains(CAPTION_NO_THUMBNAIL));
    }

    #[test]
    fn each_failure_kind_has_distinct_reply() {
        let a = failure_reply(FailureKind::Validation);
        let b = failure_reply(FailureKind::Conversion);
        let c = failure_reply(FailureKind::Transport);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn processing_includes_file_name() {
        assert!(processing("book.epub").ends_with("book.epub"));
    }
}
