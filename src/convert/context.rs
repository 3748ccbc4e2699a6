//! Mutable state shared by the element converters.

use super::images::ImageStore;
use crate::config::ConversionConfig;
use crate::diagnostics::Diagnostics;
use crate::fb2::FictionBook;
use crate::ir::{Arena, Estimator, Kind, NodeId};
use crate::refs::{IdRegistry, LinkTable, NoteStrategy};
use crate::structure::{Document, DocumentId, DocumentKind, Structure};

/// Everything the first pass builds.
pub(crate) struct Context<'a> {
    pub config: &'a ConversionConfig,
    pub book: &'a FictionBook,
    pub estimator: &'static dyn Estimator,
    pub arena: Arena,
    pub structure: Structure,
    pub registry: IdRegistry,
    pub links: LinkTable,
    pub images: ImageStore,
    pub diagnostics: Diagnostics,
}

impl<'a> Context<'a> {
    pub fn new(book: &'a FictionBook, config: &'a ConversionConfig) -> Self {
        let mut diagnostics = Diagnostics::new();
        let images = ImageStore::from_binaries(&book.binaries, &mut diagnostics);
        let mut registry = IdRegistry::new();
        registry.reserve(book.ids.iter().map(String::as_str));
        Self {
            config,
            book,
            estimator: config.size_metric.estimator(),
            arena: Arena::new(),
            structure: Structure::new(),
            registry,
            links: LinkTable::new(),
            images,
            diagnostics,
        }
    }

    /// Allocate a detached element.
    pub fn element(&mut self, kind: Kind) -> NodeId {
        self.arena.alloc(kind)
    }

    /// Allocate an element with a class.
    pub fn element_with_class(&mut self, kind: Kind, class: &str) -> NodeId {
        let node = self.arena.alloc(kind);
        self.arena.semantics.set_class(node, class);
        node
    }

    /// Append a text node to `parent`. Empty text is skipped.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if text.is_empty() {
            return;
        }
        let node = self.arena.alloc_text(text);
        self.arena.append_child(parent, node);
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.arena.append_child(parent, child);
    }

    /// Register a source id for `node`. Collisions are recorded.
    pub fn register_id(&mut self, node: NodeId, id: Option<&str>) {
        let Some(id) = id else {
            return;
        };
        if let Err(diagnostic) = self.registry.register(&mut self.arena, node, id) {
            self.diagnostics.record(diagnostic);
        }
    }

    pub fn set_lang(&mut self, node: NodeId, lang: Option<&str>) {
        if let Some(lang) = lang {
            self.arena.semantics.set_lang(node, lang);
        }
    }

    /// Record an internal anchor pointing at `target`.
    ///
    /// Anchors get their own id under the back-link strategy so that the
    /// note can point back at them.
    pub fn register_anchor(&mut self, anchor: NodeId, target: &str) {
        if !self.links.add(target, anchor) {
            return;
        }
        if self.config.notes == NoteStrategy::BackLinks {
            self.registry.assign(&mut self.arena, anchor, "lnk");
        }
    }

    /// Add a document for an already built root.
    pub fn add_document(&mut self, kind: DocumentKind, root: NodeId) -> DocumentId {
        self.structure.add(Document::new(kind, root))
    }

    /// Add a document carrying a navigation entry.
    pub fn add_document_with_nav(
        &mut self,
        kind: DocumentKind,
        root: NodeId,
        title: &str,
        level: usize,
    ) -> DocumentId {
        let document = Document::new(kind, root);
        let document = if title.is_empty() {
            document
        } else {
            document.with_nav(title, level)
        };
        self.structure.add(document)
    }
}
