//! Markup arena for output documents.
//!
//! Every markup node of the converted book lives in one [`Arena`] and is
//! addressed by a [`NodeId`] handle:
//! - Nodes with a [`Kind`] (paragraph, heading, anchor, image, ...)
//! - Sparse attributes (id, class, href, src) in a [`SemanticMap`]
//! - Global text buffer with range references
//! - Explicit parent handles, so upward walks are index hops
//!
//! Documents are just root containers in the same arena, which lets the
//! link remapper mutate any node by handle after pagination.
//!
//! # Example
//!
//! ```
//! use fb2epub::ir::{Arena, Kind};
//!
//! let mut arena = Arena::new();
//! let para = arena.alloc(Kind::Paragraph);
//! let text = arena.alloc_text("Hello");
//! arena.append_child(para, text);
//! assert_eq!(arena.text_content(para), "Hello");
//! ```

mod node;
mod semantic;
pub mod size;

pub use node::{Kind, Node, NodeId, TextRange};
pub use semantic::SemanticMap;
pub use size::{Estimator, MarkupEstimator, TextEstimator};

/// Arena holding all markup nodes of a conversion.
///
/// The tree uses a parent-pointer / first-child / next-sibling
/// representation; `last_child` keeps appends O(1).
#[derive(Debug, Clone, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    /// Sparse attributes (id, class, href, src, ...).
    pub semantics: SemanticMap,
    /// Global text buffer (text nodes reference ranges into this).
    text: String,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Kind of a node, if it exists.
    pub fn kind(&self, id: NodeId) -> Option<Kind> {
        self.node(id).map(|n| n.kind)
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a new node and return its ID.
    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocate a detached node of the given kind.
    pub fn alloc(&mut self, kind: Kind) -> NodeId {
        self.alloc_node(Node::new(kind))
    }

    /// Allocate a detached text node holding `text`.
    pub fn alloc_text(&mut self, text: &str) -> NodeId {
        let range = self.append_text(text);
        self.alloc_node(Node::text(range))
    }

    /// Append text to the global buffer and return the range.
    pub fn append_text(&mut self, text: &str) -> TextRange {
        let start = self.text.len() as u32;
        self.text.push_str(text);
        TextRange::new(start, text.len() as u32)
    }

    /// Get text from a range.
    pub fn text(&self, range: TextRange) -> &str {
        &self.text[range.start as usize..range.end() as usize]
    }

    /// Append a detached child node to a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let Some(previous_last) = self.node(parent).map(|p| p.last_child) else {
            return;
        };

        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
            child_node.next_sibling = None;
        }

        match previous_last {
            Some(last) => {
                if let Some(last_node) = self.node_mut(last) {
                    last_node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.node_mut(parent) {
                    parent_node.first_child = Some(child);
                }
            }
        }

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.last_child = Some(child);
        }
    }

    /// Detach and return all children of a node, in order.
    ///
    /// The returned nodes have no parent and may be appended elsewhere.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children: Vec<NodeId> = self.children(parent).collect();
        for &child in &children {
            if let Some(node) = self.node_mut(child) {
                node.parent = None;
                node.next_sibling = None;
            }
        }
        if let Some(node) = self.node_mut(parent) {
            node.first_child = None;
            node.last_child = None;
        }
        children
    }

    /// Whether a node has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.first_child.is_some())
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Walk parent handles up to the topmost ancestor (the node itself if detached).
    pub fn top(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Nearest block-level node, starting with the node itself.
    pub fn nearest_block(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id)?;
            if node.kind.is_block() {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            arena: self,
            current: self.node(parent).and_then(|n| n.first_child),
        }
    }

    /// Iterate over a subtree in depth-first order, starting at `start`.
    pub fn iter_dfs(&self, start: NodeId) -> DfsIter<'_> {
        DfsIter {
            arena: self,
            stack: vec![start],
        }
    }

    /// Concatenated character data of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node_id in self.iter_dfs(id) {
            if let Some(node) = self.node(node_id)
                && node.kind == Kind::Text
            {
                out.push_str(self.text(node.text));
            }
        }
        out
    }
}

/// Iterator over children of a node.
pub struct ChildIter<'a> {
    arena: &'a Arena,
    current: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.arena.node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Depth-first iterator over a subtree.
pub struct DfsIter<'a> {
    arena: &'a Arena,
    stack: Vec<NodeId>,
}

impl Iterator for DfsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse order so they're visited left-to-right
        let mut children: Vec<NodeId> = self.arena.children(current).collect();
        children.reverse();
        self.stack.extend(children);

        Some(current)
    }
}
