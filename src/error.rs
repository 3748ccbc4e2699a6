//! Error types for conversion.
//!
//! These abort a conversion. Consistency problems that only affect one
//! link or unit are [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.

use thiserror::Error;

/// Errors that can occur while reading an FB2 book or writing an EPUB.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid FB2: {0}")]
    InvalidFb2(String),

    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "cli")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
