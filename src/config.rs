//! Conversion settings.

use std::path::Path;

use crate::error::{Error, Result};
use crate::ir::{Estimator, MarkupEstimator, TextEstimator};
pub use crate::refs::NoteStrategy;

/// Default upper bound for one output document, in estimated bytes.
///
/// Older readers refuse XHTML files above ~260 KB.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 245_760;

/// Which estimate the document size budget applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum SizeMetric {
    /// Serialized XHTML, markup included.
    #[default]
    Markup,
    /// Character data only.
    Text,
}

impl SizeMetric {
    /// The estimator implementing this metric.
    pub fn estimator(self) -> &'static dyn Estimator {
        match self {
            SizeMetric::Markup => &MarkupEstimator,
            SizeMetric::Text => &TextEstimator,
        }
    }
}

/// Settings for one conversion.
///
/// # Example
///
/// ```
/// use fb2epub::config::{ConversionConfig, NoteStrategy};
///
/// let config = ConversionConfig::default()
///     .with_max_document_size(64 * 1024)
///     .with_notes(NoteStrategy::BackLinks);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct ConversionConfig {
    /// Upper bound (exclusive) for the estimated size of one document.
    pub max_document_size: usize,
    /// Rendering of references into note bodies.
    pub notes: NoteStrategy,
    /// Mark the first paragraph of each section with the `drop` class.
    pub capital_drop: bool,
    /// Emit a page with the FB2 document and publish information.
    pub include_fb2_info: bool,
    /// Leave out the about and license pages.
    pub skip_about_page: bool,
    pub size_metric: SizeMetric,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            notes: NoteStrategy::default(),
            capital_drop: false,
            include_fb2_info: false,
            skip_about_page: false,
            size_metric: SizeMetric::default(),
        }
    }
}

impl ConversionConfig {
    pub fn with_max_document_size(mut self, size: usize) -> Self {
        self.max_document_size = size;
        self
    }

    pub fn with_notes(mut self, notes: NoteStrategy) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_capital_drop(mut self, enabled: bool) -> Self {
        self.capital_drop = enabled;
        self
    }

    pub fn with_fb2_info(mut self, enabled: bool) -> Self {
        self.include_fb2_info = enabled;
        self
    }

    pub fn with_skip_about_page(mut self, skip: bool) -> Self {
        self.skip_about_page = skip;
        self
    }

    pub fn with_size_metric(mut self, metric: SizeMetric) -> Self {
        self.size_metric = metric;
        self
    }

    /// Reject settings no conversion can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_document_size == 0 {
            return Err(Error::InvalidConfig(
                "max_document_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from a JSON file. Missing fields keep their defaults.
    #[cfg(feature = "cli")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let config: Self = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(feature = "cli"))]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        Err(Error::InvalidConfig(format!(
            "cannot load {}: built without JSON support",
            path.as_ref().display()
        )))
    }
}
