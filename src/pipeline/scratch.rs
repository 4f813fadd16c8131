//! Per-request scratch storage.
//!
//! ## Why a directory per request?
//!
//! Two users may upload `book.epub` at the same time, and the dispatcher
//! runs their handlers concurrently. Each request therefore gets its own
//! directory, created atomically by [`tempfile`] with a random suffix, and
//! both the staged EPUB and the converter's PDF live inside it. The file
//! name itself still carries the `tmp_` marker, the message id and the
//! sender's file name so a stray artifact can be traced back to its chat.
//!
//! Declared names are only a hint: the stem is cut to
//! [`MAX_STAGED_STEM_BYTES`] so the staged name stays well below the 255-byte
//! file name limit even for long Hebrew titles (two bytes per letter).
//!
//! The directory is a [`TempDir`]: [`ScratchSpace::release`] removes it and
//! logs any failure, and if a handler unwinds before reaching `release` the
//! `Drop` impl removes it anyway.

use crate::error::RelayError;
use crate::pipeline::admission::{has_epub_extension, EPUB_EXTENSION};
use crate::request::ConversionRequest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Marker prefixed to every scratch directory and staged file.
pub const TEMP_MARKER: &str = "tmp_";

/// Byte budget for the declared stem inside a staged file name.
pub const MAX_STAGED_STEM_BYTES: usize = 120;

/// Input and output artifacts of one request.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl ScratchSpace {
    /// Create a fresh directory under `root` for `request`.
    ///
    /// `root` is created if it does not exist yet.
    pub async fn create(root: &Path, request: &ConversionRequest) -> Result<Self, RelayError> {
        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| RelayError::Scratch {
                path: root.to_path_buf(),
                source: e,
            })?;

        let dir = tempfile::Builder::new()
            .prefix(TEMP_MARKER)
            .tempdir_in(root)
            .map_err(|e| RelayError::Scratch {
                path: root.to_path_buf(),
                source: e,
            })?;

        let input = dir
            .path()
            .join(staged_file_name(request.message_id, &request.file_name));
        let output = input.with_extension("pdf");

        debug!("Scratch space ready: {}", dir.path().display());
        Ok(Self { dir, input, output })
    }

    /// Where the downloaded EPUB is written.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Where the converter writes the PDF.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Directory holding both artifacts.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove both artifacts. Failures are logged, never returned.
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed scratch space {}", path.display()),
            Err(e) => warn!("Failed to remove scratch space {}: {}", path.display(), e),
        }
    }
}

/// Name of the staged input file: `tmp_<message id>_<file name>.epub`.
///
/// Only the last path component of the declared name is used, its stem is
/// cut to [`MAX_STAGED_STEM_BYTES`] on a character boundary, and the `.epub`
/// extension is forced because the converter picks its input format from it.
pub fn staged_file_name(message_id: i32, declared_name: &str) -> String {
    let last = Path::new(declared_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let last = if last.is_empty() { "book" } else { last };

    let (stem, extension) = if has_epub_extension(last) {
        // The extension is ASCII, so this split is on a char boundary.
        last.split_at(last.len() - EPUB_EXTENSION.len() - 1)
    } else {
        (last, "")
    };
    let stem = truncate_on_char_boundary(stem, MAX_STAGED_STEM_BYTES);

    if extension.is_empty() {
        format!("{TEMP_MARKER}{message_id}_{stem}.{EPUB_EXTENSION}")
    } else {
        format!("{TEMP_MARKER}{message_id}_{stem}{extension}")
    }
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message_id: i32, file_name: &str) -> ConversionRequest {
        ConversionRequest {
            chat_id: 7,
            message_id,
            file_id: "f".into(),
            file_name: file_name.into(),
            mime_type: None,
        }
    }

    #[test]
    fn staged_name_carries_marker_and_message_id() {
        assert_eq!(staged_file_name(12, "book.epub"), "tmp_12_book.epub");
        assert_eq!(staged_file_name(12, "Book.EPUB"), "tmp_12_Book.EPUB");
        assert_eq!(staged_file_name(3, "book"), "tmp_3_book.epub");
    }

    #[test]
    fn long_multibyte_stem_is_cut_on_a_char_boundary() {
        let title = "ספר ארוך מאוד ".repeat(12);
        let declared = format!("{title}.epub");
        assert!(declared.len() > 255);

        let staged = staged_file_name(77, &declared);
        assert!(staged.starts_with("tmp_77_"));
        assert!(staged.ends_with(".epub"));
        assert!(staged.len() <= "tmp_77_".len() + MAX_STAGED_STEM_BYTES + ".epub".len());
    }

    #[tokio::test]
    async fn long_hebrew_name_can_be_staged_and_written() {
        let root = tempfile::tempdir().unwrap();
        let declared = format!("{}.epub", "א".repeat(140));
        let scratch = ScratchSpace::create(root.path(), &request(8, &declared))
            .await
            .unwrap();

        std::fs::write(scratch.input(), b"epub").expect("staged name fits the file system");
        std::fs::write(scratch.output(), b"%PDF").expect("output name fits too");
    }

    #[test]
    fn staged_name_drops_path_components() {
        assert_eq!(staged_file_name(1, "../../etc/passwd"), "tmp_1_passwd.epub");
        assert_eq!(staged_file_name(1, "dir/My Book.epub"), "tmp_1_My Book.epub");
        assert_eq!(staged_file_name(1, ""), "tmp_1_book.epub");
        assert_eq!(staged_file_name(1, ".."), "tmp_1_book.epub");
    }

    #[tokio::test]
    async fn output_is_sibling_pdf() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(root.path(), &request(5, "My Book.epub"))
            .await
            .unwrap();
        assert_eq!(scratch.input().parent(), Some(scratch.dir()));
        assert_eq!(
            scratch.output().file_name().and_then(|n| n.to_str()),
            Some("tmp_5_My Book.pdf")
        );
    }

    #[tokio::test]
    async fn same_file_name_gets_distinct_directories() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchSpace::create(root.path(), &request(1, "book.epub"))
            .await
            .unwrap();
        let b = ScratchSpace::create(root.path(), &request(1, "book.epub"))
            .await
            .unwrap();
        assert_ne!(a.input(), b.input());
        assert_ne!(a.output(), b.output());
    }

    #[tokio::test]
    async fn release_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create(&root.path().join("files"), &request(9, "a.epub"))
            .await
            .unwrap();
        std::fs::write(scratch.input(), b"epub").unwrap();
        std::fs::write(scratch.output(), b"%PDF").unwrap();
        let dir = scratch.dir().to_path_buf();

        scratch.release();

        assert!(!dir.exists());
        let leftovers = std::fs::read_dir(root.path().join("files")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn drop_also_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = {
            let scratch = ScratchSpace::create(root.path(), &request(2, "a.epub"))
                .await
                .unwrap();
            std::fs::write(scratch.input(), b"epub").unwrap();
            scratch.dir().to_path_buf()
        };
        assert!(!dir.exists());
    }
}
