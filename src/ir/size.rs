//! Serialized size estimation.
//!
//! Pagination decisions are taken on estimates, never on real serialized
//! output. An estimator must be deterministic and monotonic: appending a
//! child to a container never decreases the container's estimate.

use super::{Arena, Kind, NodeId};

/// Estimates the serialized byte size of a markup subtree.
pub trait Estimator {
    /// Estimated size of `node` including all of its descendants.
    fn estimate(&self, arena: &Arena, node: NodeId) -> usize;

    /// Estimated size of `node` without its children (tags and attributes only).
    fn shell(&self, arena: &Arena, node: NodeId) -> usize;

    /// Sum of the estimates of several nodes.
    fn estimate_all(&self, arena: &Arena, nodes: &[NodeId]) -> usize {
        nodes.iter().map(|&n| self.estimate(arena, n)).sum()
    }
}

/// Approximates the XHTML written by the exporter.
///
/// Counts start and end tags, attributes (` name="value"`), escaped
/// character data and one newline after every block element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupEstimator;

impl Estimator for MarkupEstimator {
    fn estimate(&self, arena: &Arena, node: NodeId) -> usize {
        let Some(n) = arena.node(node) else {
            return 0;
        };
        if n.kind == Kind::Text {
            return escaped_len(arena.text(n.text));
        }
        let children: usize = arena.children(node).map(|c| self.estimate(arena, c)).sum();
        self.shell(arena, node) + children
    }

    fn shell(&self, arena: &Arena, node: NodeId) -> usize {
        let Some(n) = arena.node(node) else {
            return 0;
        };
        if n.kind == Kind::Text {
            return 0;
        }

        let tag = n.kind.tag().len();
        let mut size = attributes_size(arena, node);
        size += if n.kind.is_void() {
            // <tag attrs/>
            tag + 3
        } else {
            // <tag attrs></tag>
            2 * tag + 5
        };
        if n.kind.is_block() {
            size += 1;
        }
        size
    }
}

/// Counts only escaped character data; markup is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEstimator;

impl Estimator for TextEstimator {
    fn estimate(&self, arena: &Arena, node: NodeId) -> usize {
        arena
            .iter_dfs(node)
            .filter_map(|id| arena.node(id))
            .filter(|n| n.kind == Kind::Text)
            .map(|n| escaped_len(arena.text(n.text)))
            .sum()
    }

    fn shell(&self, _arena: &Arena, _node: NodeId) -> usize {
        0
    }
}

fn attributes_size(arena: &Arena, node: NodeId) -> usize {
    let mut size: usize = arena
        .semantics
        .attributes(node)
        .map(|(name, value)| name.len() + escaped_len(value) + 4)
        .sum();
    // Numeric attributes serialize as ` rowspan="N"` / ` colspan="N"`.
    for span in [
        arena.semantics.row_span(node),
        arena.semantics.col_span(node),
    ]
    .into_iter()
    .flatten()
    {
        size += "rowspan".len() + span.to_string().len() + 4;
    }
    size
}

/// Length of `s` after XML escaping.
pub(crate) fn escaped_len(s: &str) -> usize {
    s.bytes()
        .map(|b| match b {
            b'&' => 5,
            b'<' | b'>' => 4,
            b'"' => 6,
            b'\'' => 5,
            _ => 1,
        })
        .sum()
}
