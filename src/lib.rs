//! # imagebot
//!
//! The image side of a chat bot: fetch an image by URL, transform it in
//! memory, hand back encoded bytes for a reply attachment.
//!
//! # Architecture: One-Shot Pipelines
//!
//! Every command is an independent request. Nothing is cached, nothing is
//! written to a shared temp directory, and no state outlives the request:
//!
//! ```text
//! URL ──fetch──▶ bytes ──decode──▶ PixelBuffer ──transform──▶ PixelBuffer ──encode──▶ bytes
//! ```
//!
//! Transforms take `&PixelBuffer` and return a new buffer, so each stage is
//! a pure function that unit tests can exercise without network or disk.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Codec, fit-policy resize, filters, bitmap text, compositing, and the [`ImagePipeline`](imaging::ImagePipeline) facade |
//! | [`card`] | Reply card: template + circular avatar + name, time and wrapped body on a fixed layout |
//! | [`fetch`] | `reqwest`-backed [`ByteSource`](imaging::ByteSource) with a size cap; local paths read from disk |
//! | [`config`] | Layered `imagebot.toml` loading, validation, and stock config generation |
//! | [`output`] | CLI output formatting: info report and saved-file lines |
//!
//! # Design Decisions
//!
//! ## Degrade, Don't Throw
//!
//! Each pipeline operation has a `try_*` form returning the error kind and a
//! plain form returning `Option`. The bot only ever shows one generic
//! failure message, so the plain form logs the error and yields `None`.
//! The reply card goes one step further: a broken template or avatar is
//! replaced by a placeholder and the card still renders.
//!
//! ## Closed Option Sets
//!
//! Filters, fit policies and output formats are enums. Strings from the
//! outside world are parsed once at the boundary; past that point, an
//! unsupported value cannot exist.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate; glyphs come from
//! `font8x8`. No system libraries, no font files to ship.

pub mod card;
pub mod config;
pub mod fetch;
pub mod imaging;
pub mod output;
