//! Catalogue of output documents.
//!
//! Every document of the converted book (flowed text, notes, and the
//! generated cover/title/info pages) is a root container in the shared
//! [`Arena`]. [`Structure`] keeps them in reading order and answers which
//! document a node belongs to.

use std::collections::HashMap;

use crate::ir::{Arena, NodeId};

/// Handle of a document in a [`Structure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl DocumentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a document holds. Decides file naming and how links into it are
/// resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Cover,
    TitlePage,
    Annotation,
    /// Flowed main body text.
    Text,
    /// Flowed note bodies. Links into these follow the note strategy.
    Notes,
    /// FB2 document/publish information page.
    Info,
    About,
    License,
}

impl DocumentKind {
    /// File name stem, and whether documents of this kind are numbered.
    fn file_stem(self) -> (&'static str, bool) {
        match self {
            DocumentKind::Cover => ("cover", false),
            DocumentKind::TitlePage => ("title", false),
            DocumentKind::Annotation => ("annotation", false),
            DocumentKind::Text => ("section", true),
            DocumentKind::Notes => ("notes", true),
            DocumentKind::Info => ("fb2info", false),
            DocumentKind::About => ("about", false),
            DocumentKind::License => ("license", false),
        }
    }

    /// Whether the document belongs in the reading order (spine, linear).
    pub fn is_linear(self) -> bool {
        !matches!(self, DocumentKind::Notes)
    }
}

/// Navigation entry of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub title: String,
    /// Nesting depth, 1 for top-level sections.
    pub level: usize,
}

/// A note body embedded at the end of the document that references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedNote<'a> {
    pub id: &'a str,
    pub content: NodeId,
}

/// One output document.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    /// Root container; its children are the document's top-level units.
    pub root: NodeId,
    pub nav: Option<NavEntry>,
    file_name: Option<String>,
    footnotes: Vec<(String, NodeId)>,
}

impl Document {
    pub fn new(kind: DocumentKind, root: NodeId) -> Self {
        Self {
            kind,
            root,
            nav: None,
            file_name: None,
            footnotes: Vec::new(),
        }
    }

    /// Attach a navigation entry.
    pub fn with_nav(mut self, title: impl Into<String>, level: usize) -> Self {
        self.nav = Some(NavEntry {
            title: title.into(),
            level,
        });
        self
    }

    /// Assigned file name, once [`Structure::assign_file_names`] has run.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Embed the note body `content` under `id`. Each id is embedded once.
    pub fn add_footnote(&mut self, id: &str, content: NodeId) -> bool {
        if self.footnotes.iter().any(|(existing, _)| existing == id) {
            return false;
        }
        self.footnotes.push((id.to_string(), content));
        true
    }

    /// Embedded notes in the order they were first referenced.
    pub fn footnotes(&self) -> impl Iterator<Item = EmbeddedNote<'_>> {
        self.footnotes.iter().map(|(id, content)| EmbeddedNote {
            id,
            content: *content,
        })
    }

    pub fn has_footnotes(&self) -> bool {
        !self.footnotes.is_empty()
    }
}

/// Ordered collection of all documents plus the root → document index.
#[derive(Debug, Default, Clone)]
pub struct Structure {
    documents: Vec<Document>,
    by_root: HashMap<NodeId, DocumentId>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document; the index is extended immediately.
    pub fn add(&mut self, document: Document) -> DocumentId {
        let id = DocumentId(self.documents.len() as u32);
        self.by_root.insert(document.root, id);
        self.documents.push(document);
        id
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.index())
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id.index())
    }

    /// Document whose root is `root`.
    pub fn by_root(&self, root: NodeId) -> Option<DocumentId> {
        self.by_root.get(&root).copied()
    }

    /// Document containing `node`, found by walking parent handles.
    pub fn document_of(&self, arena: &Arena, node: NodeId) -> Option<DocumentId> {
        self.by_root(arena.top(node))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in reading order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// (id, document) pairs in reading order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, d)| (DocumentId(i as u32), d))
    }

    /// Give every document a stable file name.
    ///
    /// Numbered kinds count from 1 (`section1.xhtml`, `notes1.xhtml`);
    /// singleton kinds get a suffix only when they repeat.
    pub fn assign_file_names(&mut self) {
        let mut counters: HashMap<DocumentKind, usize> = HashMap::new();
        for document in &mut self.documents {
            let (stem, numbered) = document.kind.file_stem();
            let count = counters.entry(document.kind).or_insert(0);
            *count += 1;
            let name = if numbered || *count > 1 {
                format!("{stem}{count}.xhtml")
            } else {
                format!("{stem}.xhtml")
            };
            document.file_name = Some(name);
        }
    }

    /// File name of a document, or an empty string before naming.
    pub fn file_name(&self, id: DocumentId) -> &str {
        self.get(id).and_then(|d| d.file_name()).unwrap_or_default()
    }
}
