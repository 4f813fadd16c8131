//! Stages of the EPUB-to-PDF conversion workflow.
//!
//! Each submodule implements exactly one step so it can be tested on its
//! own; [`crate::relay::Relay`] strings them together.
//!
//! ## Data Flow
//!
//! ```text
//! admission ──▶ scratch ──▶ converter ──▶ thumbnail ──▶ naming
//! (MIME/ext)   (temp dir)   (ebook-convert) (resize)    (output name)
//! ```
//!
//! 1. [`admission`]: the only input check (declared MIME type or extension)
//! 2. [`scratch`]: per-request directory that is removed on every exit path
//! 3. [`converter`]: run the external converter and verify its output
//! 4. [`thumbnail`]: shrink the fixed branding image; failure is non-fatal
//! 5. [`naming`]: derive the branded output file name

pub mod admission;
pub mod converter;
pub mod naming;
pub mod scratch;
pub mod thumbnail;
