//! Second pass: rewriting anchors once every document exists.
//!
//! For each link table entry the target is resolved to its document and
//! nearest block, then:
//! - targets outside notes documents get a direct reference, `#id` within
//!   the same document and `file#id` across documents;
//! - targets inside notes documents follow the [`NoteStrategy`].

use super::links::{LinkEntry, LinkTable, PENDING_HREF};
use super::registry::IdRegistry;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{Arena, Kind, NodeId};
use crate::structure::{DocumentId, DocumentKind, Structure};

/// Class of synthesized back-link anchors.
pub const BACK_LINK_CLASS: &str = "note_anchor";

/// How references into notes documents are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum NoteStrategy {
    /// Embed the note body in each referencing document and tag the anchor
    /// as a note reference.
    #[default]
    Footnotes,
    /// Link to the notes document and add a link back after the note.
    BackLinks,
}

/// Rewrites anchor hrefs from the link table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Remapper {
    strategy: NoteStrategy,
}

/// Where an entry's target ended up.
struct ResolvedTarget<'a> {
    id: &'a str,
    node: NodeId,
    block: NodeId,
    document: DocumentId,
}

impl Remapper {
    pub fn new(strategy: NoteStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> NoteStrategy {
        self.strategy
    }

    /// Resolve every entry of `links`. Problems are recorded, never fatal.
    pub fn remap(
        &self,
        arena: &mut Arena,
        structure: &mut Structure,
        registry: &IdRegistry,
        links: &LinkTable,
        diagnostics: &mut Diagnostics,
    ) {
        for entry in links {
            let Some(target) = resolve_target(arena, structure, registry, entry, diagnostics)
            else {
                continue;
            };

            let in_notes = structure
                .get(target.document)
                .is_some_and(|d| d.kind == DocumentKind::Notes);
            match (in_notes, self.strategy) {
                (false, _) => direct(arena, structure, &target, &entry.anchors, diagnostics),
                (true, NoteStrategy::Footnotes) => {
                    footnotes(arena, structure, &target, &entry.anchors, diagnostics)
                }
                (true, NoteStrategy::BackLinks) => {
                    back_links(arena, structure, &target, &entry.anchors, diagnostics)
                }
            }
        }
        log::debug!("remapped {} link target(s)", links.len());
    }
}

fn resolve_target<'a>(
    arena: &mut Arena,
    structure: &Structure,
    registry: &IdRegistry,
    entry: &'a LinkEntry,
    diagnostics: &mut Diagnostics,
) -> Option<ResolvedTarget<'a>> {
    let id = entry.target.as_str();
    let Some(node) = registry.get(id) else {
        // Leave no dangling placeholders behind.
        for &anchor in &entry.anchors {
            if arena.semantics.href(anchor) == Some(PENDING_HREF) {
                arena.semantics.clear_href(anchor);
            }
        }
        diagnostics.record(Diagnostic::UnknownTarget {
            id: id.to_string(),
            anchors: entry.anchors.len(),
        });
        return None;
    };

    let Some(document) = structure.document_of(arena, node) else {
        diagnostics.record(Diagnostic::TargetDocumentNotFound { id: id.to_string() });
        return None;
    };

    let Some(block) = arena.nearest_block(node) else {
        diagnostics.record(Diagnostic::TargetContainerNotFound { id: id.to_string() });
        return None;
    };

    Some(ResolvedTarget {
        id,
        node,
        block,
        document,
    })
}

/// `#id` within one document, `file#id` across documents.
fn reference(structure: &Structure, from: DocumentId, to: DocumentId, id: &str) -> String {
    if from == to {
        format!("#{id}")
    } else {
        format!("{}#{id}", structure.file_name(to))
    }
}

fn anchor_document(
    arena: &Arena,
    structure: &Structure,
    anchor: NodeId,
    target: &ResolvedTarget<'_>,
    diagnostics: &mut Diagnostics,
) -> Option<DocumentId> {
    let document = structure.document_of(arena, anchor);
    if document.is_none() {
        diagnostics.record(Diagnostic::AnchorDocumentNotFound {
            id: target.id.to_string(),
        });
    }
    document
}

fn direct(
    arena: &mut Arena,
    structure: &Structure,
    target: &ResolvedTarget<'_>,
    anchors: &[NodeId],
    diagnostics: &mut Diagnostics,
) {
    for &anchor in anchors {
        let Some(document) = anchor_document(arena, structure, anchor, target, diagnostics) else {
            continue;
        };
        let href = reference(structure, document, target.document, target.id);
        arena.semantics.set_href(anchor, &href);
    }
}

fn footnotes(
    arena: &mut Arena,
    structure: &mut Structure,
    target: &ResolvedTarget<'_>,
    anchors: &[NodeId],
    diagnostics: &mut Diagnostics,
) {
    let mut embedded = false;
    for &anchor in anchors {
        let Some(document) = anchor_document(arena, structure, anchor, target, diagnostics) else {
            continue;
        };
        // The note body is rendered inside the anchor's own document.
        arena.semantics.set_href(anchor, &format!("#{}", target.id));
        arena.semantics.set_epub_type(anchor, "noteref");
        if let Some(doc) = structure.get_mut(document) {
            doc.add_footnote(target.id, target.block);
            embedded = true;
        }
    }

    // The embedded copies now hold the id.
    if embedded {
        arena.semantics.clear_id(target.node);
    }
}

fn back_links(
    arena: &mut Arena,
    structure: &Structure,
    target: &ResolvedTarget<'_>,
    anchors: &[NodeId],
    diagnostics: &mut Diagnostics,
) {
    let numbered = anchors.len() > 1;
    let mut counter = 0;

    for &anchor in anchors {
        let Some(document) = anchor_document(arena, structure, anchor, target, diagnostics) else {
            continue;
        };
        let href = reference(structure, document, target.document, target.id);
        arena.semantics.set_href(anchor, &href);

        counter += 1;
        let Some(anchor_id) = arena.semantics.id(anchor).map(str::to_string) else {
            log::debug!("anchor {anchor:?} has no id, no back-link for `{}`", target.id);
            continue;
        };

        let label = if numbered {
            format!("(<< back {counter})")
        } else {
            "(<< back)".to_string()
        };
        let back_href = reference(structure, target.document, document, &anchor_id);

        let line = arena.alloc(Kind::EmptyLine);
        arena.append_child(target.block, line);
        let back = arena.alloc(Kind::Anchor);
        arena.semantics.set_class(back, BACK_LINK_CLASS);
        arena.semantics.set_href(back, &back_href);
        let text = arena.alloc_text(&label);
        arena.append_child(back, text);
        arena.append_child(target.block, back);
    }
}
