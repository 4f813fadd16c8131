//! # oldtown-epub2pdf
//!
//! A Telegram bot that turns EPUB uploads into branded PDF documents.
//!
//! A user sends an `.epub` file to the bot; the bot downloads it into a
//! per-request scratch directory, runs calibre's `ebook-convert` on it,
//! attaches a fixed cover thumbnail and sends the PDF back to the same chat
//! as `<Book_Name>_OldTown.pdf`. Scratch files are removed on every path.
//!
//! ## Workflow
//!
//! ```text
//! webhook update
//!  │
//!  ├─ dispatch   /start, /help → greeting; document → relay; text → hint
//!  └─ relay
//!      ├─ 1. Admit     MIME type or .epub extension
//!      ├─ 2. Stage     download into files/tmp_XXXX/tmp_<msg>_<name>.epub
//!      ├─ 3. Convert   ebook-convert in.epub out.pdf (with timeout)
//!      ├─ 4. Thumbnail resize fixed cover to ≤320 px JPEG (non-fatal)
//!      ├─ 5. Name      "My Book_Test.epub" → "My_Book_Test_OldTown.pdf"
//!      ├─ 6. Upload    document + caption (+ thumbnail)
//!      └─ 7. Release   scratch directory removed
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `epub2pdf-bot` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod pipeline;
pub mod relay;
pub mod request;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RelayConfig, RelayConfigBuilder};
pub use dispatch::Command;
pub use error::{FailureKind, RelayError};
pub use pipeline::converter::{Converter, EbookConvert};
pub use pipeline::thumbnail::ThumbnailSource;
pub use relay::Relay;
pub use request::{ConversionRequest, Delivery};
pub use transport::{ChatTransport, OutgoingDocument, TelegramTransport};
