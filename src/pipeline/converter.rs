//! EPUB → PDF conversion through an external converter.
//!
//! The default backend shells out to calibre's `ebook-convert`, which picks
//! input and output formats from the file extensions. calibre renders PDF
//! through QtWebEngine, whose Chromium sandbox cannot start inside most
//! containers, hence `QTWEBENGINE_CHROMIUM_FLAGS=--no-sandbox`.
//!
//! A converter exit code of zero is not trusted on its own:
//! [`verify_output`] checks that a non-empty file starting with the `%PDF`
//! magic bytes was actually written.

use crate::config::RelayConfig;
use crate::error::RelayError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Longest converter stderr excerpt kept in an error.
const STDERR_EXCERPT_CHARS: usize = 500;

/// Something that turns the EPUB at `input` into a PDF at `output`.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Convert `input` into `output`.
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), RelayError>;
}

/// calibre's `ebook-convert` run as a child process.
#[derive(Debug, Clone)]
pub struct EbookConvert {
    program: String,
    timeout: Duration,
}

impl EbookConvert {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.converter_program.clone(),
            Duration::from_secs(config.converter_timeout_secs),
        )
    }
}

#[async_trait]
impl Converter for EbookConvert {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), RelayError> {
        let started = Instant::now();
        debug!("Running {} {} {}", self.program, input.display(), output.display());

        let child = Command::new(&self.program)
            .arg(input)
            .arg(output)
            .env("QTWEBENGINE_CHROMIUM_FLAGS", "--no-sandbox")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RelayError::ConverterSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        // On timeout the future owning `child` is dropped, which kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RelayError::ConverterTimeout {
                input: input.to_path_buf(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| RelayError::Internal(format!("Failed to wait for converter: {e}")))?;

        if !result.status.success() {
            return Err(RelayError::ConverterFailed {
                status: result.status.to_string(),
                stderr: stderr_excerpt(&result.stderr),
            });
        }

        info!(
            "{} finished in {}ms",
            self.program,
            started.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Check that `path` holds a non-empty PDF and return its size in bytes.
pub async fn verify_output(path: &Path) -> Result<u64, RelayError> {
    let missing = |detail: String| RelayError::MissingOutput {
        path: path.to_path_buf(),
        detail,
    };

    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| missing(e.to_string()))?;
    if meta.len() == 0 {
        return Err(missing("file is empty".into()));
    }

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| missing(e.to_string()))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .await
        .map_err(|e| missing(e.to_string()))?;
    if &magic != b"%PDF" {
        return Err(missing(format!("unexpected leading bytes {magic:?}")));
    }

    Ok(meta.len())
}

/// Last few hundred characters of the converter's stderr, lossily decoded.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        text.to_string()
    } else {
        let tail: String = text.chars().skip(count - STDERR_EXCERPT_CHARS).collect();
        format!("\u{2026}{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_excerpt_keeps_the_tail() {
        let long = "x".repeat(STDERR_EXCERPT_CHARS) + "THE END";
        let excerpt = stderr_excerpt(long.as_bytes());
        assert!(excerpt.ends_with("THE END"));
        assert!(excerpt.starts_with('\u{2026}'));
        assert_eq!(excerpt.chars().count(), STDERR_EXCERPT_CHARS + 1);

        assert_eq!(stderr_excerpt(b"  short\n"), "short");
    }

    #[tokio::test]
    async fn verify_accepts_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        tokio::fs::write(&path, b"%PDF-1.7\n%%EOF\n").await.unwrap();
        assert_eq!(verify_output(&path).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn verify_rejects_missing_empty_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.pdf");
        assert!(matches!(
            verify_output(&missing).await,
            Err(RelayError::MissingOutput { .. })
        ));

        let empty = dir.path().join("empty.pdf");
        tokio::fs::write(&empty, b"").await.unwrap();
        let err = verify_output(&empty).await.unwrap_err();
        assert!(err.to_string().contains("empty"), "got: {err}");

        let html = dir.path().join("page.pdf");
        tokio::fs::write(&html, b"<html></html>").await.unwrap();
        assert!(matches!(
            verify_output(&html).await,
            Err(RelayError::MissingOutput { .. })
        ));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = EbookConvert::new(
            "/nonexistent/ebook-convert-for-tests",
            Duration::from_secs(5),
        );
        let err = converter
            .convert(&dir.path().join("in.epub"), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ConverterSpawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let converter = EbookConvert::new("false", Duration::from_secs(5));
        let err = converter
            .convert(&dir.path().join("in.epub"), &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ConverterFailed { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_converter_is_killed_after_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        // `sh <input> <output>` runs the staged input as a script.
        let input = dir.path().join("in.epub");
        tokio::fs::write(&input, b"exec sleep 30\n").await.unwrap();
        let converter = EbookConvert::new("sh", Duration::from_secs(1));

        let started = Instant::now();
        let err = converter
            .convert(&input, &dir.path().join("out.pdf"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, RelayError::ConverterTimeout { secs: 1, .. }),
            "got: {err}"
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "returned after {elapsed:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_without_output_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let converter = EbookConvert::new("true", Duration::from_secs(5));
        converter
            .convert(&dir.path().join("in.epub"), &output)
            .await
            .expect("`true` exits zero");
        assert!(verify_output(&output).await.is_err());
    }
}
