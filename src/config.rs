//! Configuration for the conversion relay.
//!
//! Every knob lives in [`RelayConfig`], built through its
//! [`RelayConfigBuilder`]. The builder is the single place where startup
//! configuration is validated: the bot token must be present and the public
//! webhook URL must use `https`, because Telegram refuses to deliver updates
//! to plain-HTTP endpoints.

use crate::error::RelayError;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Path under the public base URL where Telegram posts updates.
pub const WEBHOOK_PATH: &str = "webhook";

/// Telegram rejects document thumbnails larger than 320 px on either side.
pub const MAX_THUMBNAIL_EDGE: u32 = 320;

/// Runtime configuration for the relay.
///
/// # Example
/// ```rust
/// use oldtown_epub2pdf::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .bot_token("123:abc")
///     .public_url("https://bot.example.com")
///     .port(8443)
///     .build()
///     .unwrap();
/// assert_eq!(config.webhook_url().as_str(), "https://bot.example.com/webhook");
/// ```
#[derive(Clone)]
pub struct RelayConfig {
    /// Bot API token issued by @BotFather.
    pub bot_token: String,

    /// Public base URL the platform can reach; always `https`.
    pub public_url: Url,

    /// Local listening port for the webhook server. Default: 8080.
    pub port: u16,

    /// Directory holding per-request scratch folders. Default: `files`.
    pub scratch_dir: PathBuf,

    /// Fixed branding image attached as the document thumbnail.
    pub thumbnail_path: PathBuf,

    /// Bounding box edge for the thumbnail, in pixels. Default: 320.
    pub thumbnail_max_edge: u32,

    /// Converter executable. Default: `ebook-convert` (calibre).
    pub converter_program: String,

    /// Hard limit for one converter run. Default: 300 seconds.
    pub converter_timeout_secs: u64,

    /// Branding suffix appended to output file names. Default: `OldTown`.
    pub output_suffix: String,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"<redacted>")
            .field("public_url", &self.public_url.as_str())
            .field("port", &self.port)
            .field("scratch_dir", &self.scratch_dir)
            .field("thumbnail_path", &self.thumbnail_path)
            .field("thumbnail_max_edge", &self.thumbnail_max_edge)
            .field("converter_program", &self.converter_program)
            .field("converter_timeout_secs", &self.converter_timeout_secs)
            .field("output_suffix", &self.output_suffix)
            .finish()
    }
}

impl RelayConfig {
    /// Create a new builder pre-filled with defaults.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder::default()
    }

    /// Full URL registered with the platform: `<public_url>/webhook`.
    pub fn webhook_url(&self) -> Url {
        let mut url = self.public_url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{WEBHOOK_PATH}"));
        url
    }
}

/// Builder for [`RelayConfig`].
///
/// Required values are kept as raw strings until [`build`](Self::build) so
/// that a missing or malformed environment variable is reported as one
/// [`RelayError::InvalidConfig`] instead of a panic at the call site.
#[derive(Debug)]
pub struct RelayConfigBuilder {
    bot_token: Option<String>,
    public_url: Option<String>,
    port: u16,
    scratch_dir: PathBuf,
    thumbnail_path: PathBuf,
    thumbnail_max_edge: u32,
    converter_program: String,
    converter_timeout_secs: u64,
    output_suffix: String,
}

impl Default for RelayConfigBuilder {
    fn default() -> Self {
        Self {
            bot_token: None,
            public_url: None,
            port: 8080,
            scratch_dir: PathBuf::from("files"),
            thumbnail_path: PathBuf::from("assets/thumbnail.jpg"),
            thumbnail_max_edge: MAX_THUMBNAIL_EDGE,
            converter_program: "ebook-convert".to_string(),
            converter_timeout_secs: 300,
            output_suffix: "OldTown".to_string(),
        }
    }
}

impl RelayConfigBuilder {
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    pub fn public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn thumbnail_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.thumbnail_path = path.into();
        self
    }

    pub fn thumbnail_max_edge(mut self, px: u32) -> Self {
        self.thumbnail_max_edge = px;
        self
    }

    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.converter_program = program.into();
        self
    }

    pub fn converter_timeout_secs(mut self, secs: u64) -> Self {
        self.converter_timeout_secs = secs;
        self
    }

    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RelayConfig, RelayError> {
        let bot_token = match self.bot_token {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                return Err(RelayError::InvalidConfig(
                    "TELEGRAM_BOT_TOKEN is not set".into(),
                ))
            }
        };

        let raw_url = self
            .public_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| RelayError::InvalidConfig("WEBHOOK_URL is not set".into()))?;
        let public_url = Url::parse(raw_url.trim()).map_err(|e| {
            RelayError::InvalidConfig(format!("WEBHOOK_URL '{raw_url}' is not a valid URL: {e}"))
        })?;
        if public_url.scheme() != "https" {
            return Err(RelayError::InvalidConfig(format!(
                "WEBHOOK_URL must start with https://, got '{raw_url}'"
            )));
        }

        if self.thumbnail_max_edge == 0 || self.thumbnail_max_edge > MAX_THUMBNAIL_EDGE {
            return Err(RelayError::InvalidConfig(format!(
                "Thumbnail edge must be 1–{MAX_THUMBNAIL_EDGE}, got {}",
                self.thumbnail_max_edge
            )));
        }
        if self.converter_timeout_secs == 0 {
            return Err(RelayError::InvalidConfig(
                "Converter timeout must be ≥ 1 second".into(),
            ));
        }
        if self.converter_program.trim().is_empty() {
            return Err(RelayError::InvalidConfig(
                "Converter program must not be empty".into(),
            ));
        }

        Ok(RelayConfig {
            bot_token,
            public_url,
            port: self.port,
            scratch_dir: self.scratch_dir,
            thumbnail_path: self.thumbnail_path,
            thumbnail_max_edge: self.thumbnail_max_edge,
            converter_program: self.converter_program,
            converter_timeout_secs: self.converter_timeout_secs,
            output_suffix: self.output_suffix,
        })
    }
}
