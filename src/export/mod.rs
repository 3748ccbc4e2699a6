//! Writing conversions to disk formats.
//!
//! Provides the `Exporter` trait, the EPUB exporter and the XHTML renderer
//! it is built on.
//!
//! # Architecture
//!
//! The `Exporter` trait uses a builder pattern:
//! - `new()` creates an exporter with default configuration
//! - `with_config()` allows customization
//! - `export()` writes to any `Write + Seek` destination
//!
//! # Example
//!
//! ```no_run
//! use fb2epub::convert::Converter;
//! use fb2epub::export::{EpubExporter, Exporter};
//! use fb2epub::fb2::read_fb2;
//! use std::io::Cursor;
//!
//! let book = read_fb2("input.fb2")?;
//! let conversion = Converter::new().convert(&book)?;
//! let mut buffer = Cursor::new(Vec::new());
//! EpubExporter::new().export(&conversion, &mut buffer)?;
//! # Ok::<(), fb2epub::error::Error>(())
//! ```

use std::io::{Seek, Write};

use crate::convert::Conversion;
use crate::error::Result;

mod epub;
mod xhtml;

pub use epub::{EpubConfig, EpubExporter};
pub use xhtml::{STYLESHEET, STYLESHEET_FILE, escape_xml, render_document, write_node};

/// Trait for exporting conversions to specific formats.
///
/// Exporters use a builder pattern where configuration is held in the struct,
/// and the `export` method writes to any `Write + Seek` destination.
pub trait Exporter {
    /// Export the conversion to the provided writer.
    ///
    /// The writer can be:
    /// - `std::fs::File` for disk output
    /// - `std::io::Cursor<Vec<u8>>` for seekable in-memory output
    /// - Any other type implementing `Write + Seek`
    fn export<W: Write + Seek>(&self, conversion: &Conversion, writer: &mut W) -> Result<()>;
}
