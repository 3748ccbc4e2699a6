//! Non-fatal consistency errors.
//!
//! Nothing in here aborts a conversion. Each problem is recorded, logged at
//! warn level, and handed back to the caller with the finished book.

use thiserror::Error;

/// A consistency problem found while converting a book.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("identifier `{id}` is already registered, later registration rejected")]
    IdCollision { id: String },

    #[error("link target `{id}` does not exist ({anchors} anchor(s) left unlinked)")]
    UnknownTarget { id: String, anchors: usize },

    #[error("link target `{id}` is not contained in any document")]
    TargetDocumentNotFound { id: String },

    #[error("link target `{id}` has no enclosing block container")]
    TargetContainerNotFound { id: String },

    #[error("anchor referencing `{id}` is not contained in any document")]
    AnchorDocumentNotFound { id: String },

    #[error("dropped a {size}-byte unit that cannot fit a {max_size}-byte document")]
    OversizeDropped { size: usize, max_size: usize },

    #[error("image `{href}` is referenced but has no binary data")]
    MissingImage { href: String },

    #[error("binary `{id}` could not be decoded: {reason}")]
    InvalidBinary { id: String, reason: String },
}

/// Collector for diagnostics of one conversion.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a diagnostic.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(Diagnostic::IdCollision { id: "a".into() });
        diagnostics.record(Diagnostic::MissingImage { href: "b".into() });

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            diagnostics.entries()[0],
            Diagnostic::IdCollision { .. }
        ));
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::OversizeDropped {
            size: 300,
            max_size: 100,
        };
        assert_eq!(
            d.to_string(),
            "dropped a 300-byte unit that cannot fit a 100-byte document"
        );
    }
}
