//! Webhook server binary for oldtown-epub2pdf.
//!
//! A thin shim over the library crate: maps flags and environment variables
//! to `RelayConfig`, registers the webhook and runs teloxide's dispatcher.

use anyhow::{Context, Result};
use clap::Parser;
use oldtown_epub2pdf::{
    dispatch, Command, EbookConvert, Relay, RelayConfig, TelegramTransport,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Minimal deployment behind an HTTPS reverse proxy
  TELEGRAM_BOT_TOKEN=123:abc WEBHOOK_URL=https://bot.example.com epub2pdf-bot

  # Custom port, scratch directory and cover image
  epub2pdf-bot --port 8443 --scratch-dir /var/tmp/epub2pdf --thumbnail cover.jpg

ENVIRONMENT VARIABLES:
  TELEGRAM_BOT_TOKEN   Bot API token (required)
  WEBHOOK_URL          Public https:// base URL; updates arrive at <URL>/webhook (required)
  PORT                 Listening port (default 8080)
  EBOOK_CONVERT_BIN    Converter executable (default ebook-convert, from calibre)
  RUST_LOG             Log filter, e.g. "info,oldtown_epub2pdf=debug"
"#;

/// Telegram bot that converts EPUB uploads to branded PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "epub2pdf-bot",
    version,
    about = "Telegram bot that converts EPUB uploads to branded PDFs",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Telegram Bot API token.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Public https:// base URL Telegram posts updates to.
    #[arg(long, env = "WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Port the webhook server listens on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Directory for per-request scratch files.
    #[arg(long, env = "SCRATCH_DIR", default_value = "files")]
    scratch_dir: PathBuf,

    /// Fixed cover image attached as document thumbnail.
    #[arg(long, env = "THUMBNAIL_PATH", default_value = "assets/thumbnail.jpg")]
    thumbnail: PathBuf,

    /// Thumbnail bounding box edge in pixels (1–320).
    #[arg(long, env = "THUMBNAIL_MAX_EDGE", default_value_t = 320,
          value_parser = clap::value_parser!(u32).range(1..=320))]
    thumbnail_max_edge: u32,

    /// Converter executable.
    #[arg(long, env = "EBOOK_CONVERT_BIN", default_value = "ebook-convert")]
    converter: String,

    /// Converter timeout in seconds.
    #[arg(long, env = "CONVERT_TIMEOUT", default_value_t = 300)]
    convert_timeout: u64,

    /// Branding suffix appended to output file names.
    #[arg(long, env = "OUTPUT_SUFFIX", default_value = "OldTown")]
    suffix: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EPUB2PDF_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Validate configuration ───────────────────────────────────────────
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };
    info!("Starting with {:?}", config);

    tokio::fs::create_dir_all(&config.scratch_dir)
        .await
        .with_context(|| format!("Failed to create scratch directory {:?}", config.scratch_dir))?;
    if !config.thumbnail_path.exists() {
        warn!(
            "Thumbnail {} not found; documents will be sent without one",
            config.thumbnail_path.display()
        );
    }

    // ── Wire the relay ───────────────────────────────────────────────────
    let bot = Bot::new(config.bot_token.clone());
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register command menu: {}", e);
    }

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let webhook_url = config.webhook_url();
    let listener = webhooks::axum(bot.clone(), webhooks::Options::new(address, webhook_url.clone()))
        .await
        .context("Failed to register webhook")?;
    info!("Listening on {} for {}", address, webhook_url);

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let converter = Arc::new(EbookConvert::from_config(&config));
    let relay = Arc::new(Relay::new(config, transport, converter));

    // ── Dispatch ─────────────────────────────────────────────────────────
    Dispatcher::builder(bot, dispatch::schema())
        .dependencies(dptree::deps![relay])
        .default_handler(|update| async move {
            debug!("Unhandled update {:?}", update.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error from webhook listener"),
        )
        .await;

    info!("Dispatcher stopped");
    Ok(())
}

/// Map CLI args to `RelayConfig`.
fn build_config(cli: &Cli) -> Result<RelayConfig> {
    let mut builder = RelayConfig::builder()
        .port(cli.port)
        .scratch_dir(cli.scratch_dir.clone())
        .thumbnail_path(cli.thumbnail.clone())
        .thumbnail_max_edge(cli.thumbnail_max_edge)
        .converter_program(cli.converter.clone())
        .converter_timeout_secs(cli.convert_timeout)
        .output_suffix(cli.suffix.clone());

    if let Some(ref token) = cli.token {
        builder = builder.bot_token(token.clone());
    }
    if let Some(ref url) = cli.webhook_url {
        builder = builder.public_url(url.clone());
    }

    builder.build().context("Invalid configuration")
}
