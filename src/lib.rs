//! # fb2epub
//!
//! Converts FictionBook 2 books into EPUB files made of size-bounded XHTML
//! documents.
//!
//! ## Features
//!
//! - Reads FB2 files in UTF-8 or legacy encodings (windows-1251 and others)
//! - Paginates long sections into documents below a configurable size,
//!   splitting oversized containers between their children
//! - Keeps every internal link working across the split documents
//! - Renders notes as embedded footnotes or as linked notes with back-links
//! - Writes EPUB 3 with an EPUB 2 table of contents
//!
//! ## Quick Start
//!
//! ```no_run
//! use fb2epub::{ConversionConfig, convert_file};
//!
//! let diagnostics = convert_file("book.fb2", "book.epub", &ConversionConfig::default())?;
//! for diagnostic in diagnostics {
//!     eprintln!("warning: {diagnostic}");
//! }
//! # Ok::<(), fb2epub::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! FB2 bytes ──► fb2::FictionBook ──► convert::Converter ──► export::EpubExporter
//!                                    │ build: flow + ids + links
//!                                    └ remap: anchors → file#id
//! ```

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod fb2;
pub mod flow;
pub mod ir;
pub mod refs;
pub mod structure;
pub mod util;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub use config::{ConversionConfig, NoteStrategy, SizeMetric};
pub use convert::{Conversion, Converter};
pub use diagnostics::Diagnostic;
pub use error::{Error, Result};
pub use export::{EpubExporter, Exporter};
pub use fb2::{FictionBook, read_fb2};

/// Read an FB2 file, convert it and write an EPUB.
///
/// Returns the non-fatal diagnostics of the conversion.
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<Diagnostic>> {
    let book = read_fb2(input)?;
    let conversion = Converter::new()
        .with_config(config.clone())
        .convert(&book)?;

    let mut writer = BufWriter::new(File::create(output)?);
    EpubExporter::new().export(&conversion, &mut writer)?;
    writer.flush()?;
    Ok(conversion.diagnostics)
}
