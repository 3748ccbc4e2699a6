//! Link classification and the link table.
//!
//! Book links come in two shapes:
//! - **Internal**: fragment references (`#note1`, `section3.xhtml#p12`)
//! - **External**: absolute URLs (`https://...`, `mailto:...`)
//!
//! Internal anchors are created with the [`PENDING_HREF`] placeholder and
//! collected in a [`LinkTable`]. Their final href depends on which document
//! the target ends up in, so it is only written after pagination.

use std::collections::HashMap;

use super::registry::normalize_id;
use crate::ir::NodeId;

/// Placeholder href of an internal anchor whose target is not yet resolved.
pub const PENDING_HREF: &str = "#";

/// A parsed link, either internal or external.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    /// External URL (http://, https://, mailto:, etc.)
    External(String),

    /// Internal link to an element id. The file part, if any, is dropped:
    /// source books are single files.
    Internal(String),

    /// Unresolved/unknown link format.
    /// Stored for debugging but not actionable.
    Unknown(String),
}

impl Link {
    /// Check if this is an external link.
    pub fn is_external(&self) -> bool {
        matches!(self, Link::External(_))
    }

    /// Check if this is an internal link.
    pub fn is_internal(&self) -> bool {
        matches!(self, Link::Internal(_))
    }

    /// Get the URL if this is an external link.
    pub fn as_external(&self) -> Option<&str> {
        match self {
            Link::External(url) => Some(url),
            _ => None,
        }
    }

    /// Get the target id if this is an internal link.
    pub fn as_internal(&self) -> Option<&str> {
        match self {
            Link::Internal(id) => Some(id),
            _ => None,
        }
    }

    /// Parse a raw href string into a Link.
    ///
    /// This handles:
    /// - External URLs (http://, https://, ftp://, mailto:, tel:)
    /// - Fragment ids (#footnote-1)
    /// - Relative paths with a fragment (book.fb2#section-5)
    pub fn parse(href: &str) -> Link {
        let href = href.trim();

        if href.starts_with("http://")
            || href.starts_with("https://")
            || href.starts_with("ftp://")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return Link::External(href.to_string());
        }

        if let Some(fragment) = href.strip_prefix('#') {
            if fragment.is_empty() {
                return Link::Unknown(href.to_string());
            }
            return Link::Internal(fragment.to_string());
        }

        if let Some((_, fragment)) = href.split_once('#')
            && !fragment.is_empty()
        {
            return Link::Internal(fragment.to_string());
        }

        Link::Unknown(href.to_string())
    }
}

/// All anchors referencing one target id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// Normalized target identifier.
    pub target: String,
    /// Anchor nodes in discovery order.
    pub anchors: Vec<NodeId>,
}

/// Target id → referencing anchors.
///
/// Entries keep the order in which their targets were first referenced, so
/// remapping is reproducible across runs.
#[derive(Debug, Default, Clone)]
pub struct LinkTable {
    entries: Vec<LinkEntry>,
    index: HashMap<String, usize>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `anchor` references `target`.
    ///
    /// The target need not be registered yet. Returns false (and records
    /// nothing) when the target is blank.
    pub fn add(&mut self, target: &str, anchor: NodeId) -> bool {
        let Some(target) = normalize_id(target) else {
            return false;
        };

        match self.index.get(&target) {
            Some(&i) => {
                let anchors = &mut self.entries[i].anchors;
                if !anchors.contains(&anchor) {
                    anchors.push(anchor);
                }
            }
            None => {
                self.index.insert(target.clone(), self.entries.len());
                self.entries.push(LinkEntry {
                    target,
                    anchors: vec![anchor],
                });
            }
        }
        true
    }

    /// Anchors referencing `target`, in discovery order.
    pub fn anchors(&self, target: &str) -> &[NodeId] {
        self.index
            .get(target)
            .map(|&i| self.entries[i].anchors.as_slice())
            .unwrap_or_default()
    }

    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LinkEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a LinkTable {
    type Item = &'a LinkEntry;
    type IntoIter = std::slice::Iter<'a, LinkEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
