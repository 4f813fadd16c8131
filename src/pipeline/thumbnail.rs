//! Branding thumbnail: shrink the fixed cover image for document uploads.
//!
//! Telegram only shows a document thumbnail if it is a JPEG no larger than
//! 320 px on either side and under 200 kB, so the source image is resized
//! into a bounded box (aspect ratio kept) and re-encoded as JPEG on every
//! request. Decoding runs in `spawn_blocking` because `image` is CPU-bound.

use crate::config::RelayConfig;
use crate::error::RelayError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upper bound Telegram accepts for a thumbnail.
pub const MAX_THUMBNAIL_BYTES: usize = 200 * 1024;

/// The fixed image attached to every outgoing document.
#[derive(Debug, Clone)]
pub struct ThumbnailSource {
    path: PathBuf,
    max_edge: u32,
}

impl ThumbnailSource {
    pub fn new(path: impl Into<PathBuf>, max_edge: u32) -> Self {
        Self {
            path: path.into(),
            max_edge,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.thumbnail_path.clone(), config.thumbnail_max_edge)
    }

    /// Read, resize and JPEG-encode the source image.
    pub async fn prepare(&self) -> Result<Vec<u8>, RelayError> {
        let path = self.path.clone();
        let max_edge = self.max_edge;

        tokio::task::spawn_blocking(move || prepare_blocking(&path, max_edge))
            .await
            .map_err(|e| RelayError::Internal(format!("Thumbnail task panicked: {e}")))?
    }
}

fn prepare_blocking(path: &Path, max_edge: u32) -> Result<Vec<u8>, RelayError> {
    let failed = |detail: String| RelayError::Thumbnail {
        path: path.to_path_buf(),
        detail,
    };

    let source = image::open(path).map_err(|e| failed(e.to_string()))?;
    let resized = if source.width() > max_edge || source.height() > max_edge {
        source.thumbnail(max_edge, max_edge)
    } else {
        source
    };

    // The JPEG encoder has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| failed(e.to_string()))?;

    if buf.len() > MAX_THUMBNAIL_BYTES {
        return Err(failed(format!(
            "encoded thumbnail is {} bytes, limit is {MAX_THUMBNAIL_BYTES}",
            buf.len()
        )));
    }

    debug!(
        "Thumbnail {}x{} → {} bytes JPEG",
        rgb.width(),
        rgb.height(),
        buf.len()
    );
    Ok(buf)
}
