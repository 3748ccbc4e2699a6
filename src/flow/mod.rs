//! Pagination of flowed content into size-bounded documents.
//!
//! A [`Flow`] takes the markup units of one structural unit (a section) in
//! reading order and packs them into document roots:
//!
//! 1. **Overflow**: when `current + unit >= max_size` the open document is
//!    closed and a new root inheriting class and language is opened.
//! 2. **Fit**: a unit smaller than `max_size` is appended.
//! 3. **Oversize**: a unit of `max_size` or more is split if it is a
//!    container ([`split_container`]) and dropped otherwise.
//!
//! Units are never reordered and no document is closed empty, so the id on
//! the first root (the section id) always survives.

mod split;

pub use split::split_container;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{Arena, Estimator, Kind, NodeId};

/// Packs units into document roots for one structural unit.
pub struct Flow<'e> {
    estimator: &'e dyn Estimator,
    max_size: usize,
    current: NodeId,
    current_size: usize,
    closed: Vec<NodeId>,
}

impl<'e> Flow<'e> {
    /// Start a flow whose first document is `root`.
    ///
    /// `root` carries the section's class, language and id. Later documents
    /// inherit class and language only.
    pub fn new(root: NodeId, max_size: usize, estimator: &'e dyn Estimator) -> Self {
        Self {
            estimator,
            max_size,
            current: root,
            current_size: 0,
            closed: Vec::new(),
        }
    }

    /// Root of the document currently open.
    pub fn current_root(&self) -> NodeId {
        self.current
    }

    /// Sum of the estimates of the units in the open document.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Add one unit, splitting or dropping it when it cannot fit a document.
    pub fn push(&mut self, arena: &mut Arena, unit: NodeId, diagnostics: &mut Diagnostics) {
        let size = self.estimator.estimate(arena, unit);
        if size < self.max_size {
            self.place(arena, unit, size);
            return;
        }

        // A container whose own markup reaches the limit has no room for any child.
        let splittable = arena.kind(unit).is_some_and(Kind::is_splittable)
            && self.estimator.shell(arena, unit) < self.max_size;
        if !splittable {
            diagnostics.record(Diagnostic::OversizeDropped {
                size,
                max_size: self.max_size,
            });
            return;
        }

        log::debug!("unit {unit:?} of {size} bytes exceeds {}, splitting", self.max_size);
        let pieces = split_container(
            arena,
            self.estimator,
            unit,
            self.current_size,
            self.max_size,
            diagnostics,
        );
        for piece in pieces {
            let piece_size = self.estimator.estimate(arena, piece);
            self.place(arena, piece, piece_size);
        }
    }

    /// Add several units in order.
    pub fn extend(
        &mut self,
        arena: &mut Arena,
        units: impl IntoIterator<Item = NodeId>,
        diagnostics: &mut Diagnostics,
    ) {
        for unit in units {
            self.push(arena, unit, diagnostics);
        }
    }

    fn place(&mut self, arena: &mut Arena, unit: NodeId, size: usize) {
        if self.current_size + size >= self.max_size {
            self.flush(arena);
        }
        arena.append_child(self.current, unit);
        self.current_size += size;
    }

    /// Close the open document and start a new one.
    ///
    /// Does nothing while the open document has no children.
    pub fn flush(&mut self, arena: &mut Arena) {
        if !arena.has_children(self.current) {
            return;
        }
        let next = arena.alloc(Kind::Container);
        arena.semantics.inherit_presentation(self.current, next);
        self.closed.push(self.current);
        self.current = next;
        self.current_size = 0;
    }

    /// Close the last document and return all document roots in order.
    ///
    /// The last root is kept if it has children or carries an id, so a
    /// section without flowed content still provides its link target.
    pub fn finish(mut self, arena: &Arena) -> Vec<NodeId> {
        if arena.has_children(self.current) || arena.semantics.id(self.current).is_some() {
            self.closed.push(self.current);
        }
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MarkupEstimator, TextEstimator};

    fn paragraph(arena: &mut Arena, size: usize) -> NodeId {
        let p = arena.alloc(Kind::Paragraph);
        let t = arena.alloc_text(&"x".repeat(size));
        arena.append_child(p, t);
        p
    }

    fn sizes(arena: &Arena, roots: &[NodeId]) -> Vec<usize> {
        roots
            .iter()
            .map(|&r| TextEstimator.estimate(arena, r))
            .collect()
    }

    #[test]
    fn test_overflow_flushes_before_unit() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        let mut flow = Flow::new(root, 100, &TextEstimator);

        for _ in 0..3 {
            let p = paragraph(&mut arena, 40);
            flow.push(&mut arena, p, &mut diagnostics);
        }
        let roots = flow.finish(&arena);

        assert_eq!(sizes(&arena, &roots), [80, 40]);
        assert_eq!(roots[0], root);
    }

    #[test]
    fn test_exact_fill_counts_as_overflow() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        let mut flow = Flow::new(root, 100, &TextEstimator);

        for size in [50, 50] {
            let p = paragraph(&mut arena, size);
            flow.push(&mut arena, p, &mut diagnostics);
        }
        assert_eq!(sizes(&arena, &flow.finish(&arena)), [50, 50]);
    }

    #[test]
    fn test_successors_inherit_presentation() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        arena.semantics.set_id(root, "sec1");
        arena.semantics.set_class(root, "section2");
        arena.semantics.set_lang(root, "ru");
        let mut flow = Flow::new(root, 100, &TextEstimator);

        for _ in 0..2 {
            let p = paragraph(&mut arena, 60);
            flow.push(&mut arena, p, &mut diagnostics);
        }
        let roots = flow.finish(&arena);

        assert_eq!(roots.len(), 2);
        assert_eq!(arena.semantics.id(roots[1]), None);
        assert_eq!(arena.semantics.class(roots[1]), Some("section2"));
        assert_eq!(arena.semantics.lang(roots[1]), Some("ru"));
    }

    #[test]
    fn test_oversize_leaf_is_dropped() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        let mut flow = Flow::new(root, 100, &TextEstimator);

        let small = paragraph(&mut arena, 10);
        let huge = paragraph(&mut arena, 100);
        flow.push(&mut arena, small, &mut diagnostics);
        flow.push(&mut arena, huge, &mut diagnostics);
        let roots = flow.finish(&arena);

        assert_eq!(sizes(&arena, &roots), [10]);
        assert_eq!(arena.parent(huge), None);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_oversize_container_is_split() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        let mut flow = Flow::new(root, 100, &TextEstimator);

        let cite = arena.alloc(Kind::Container);
        arena.semantics.set_id(cite, "c1");
        for _ in 0..5 {
            let p = paragraph(&mut arena, 50);
            arena.append_child(cite, p);
        }
        flow.push(&mut arena, cite, &mut diagnostics);
        let roots = flow.finish(&arena);

        assert_eq!(sizes(&arena, &roots), [50, 50, 50, 50, 50]);
        // The original container keeps its id in the first document.
        assert_eq!(arena.children(roots[0]).next(), Some(cite));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_container_with_oversized_shell_is_dropped() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        let mut flow = Flow::new(root, 30, &MarkupEstimator);

        let poem = arena.alloc(Kind::Container);
        arena.semantics.set_id(poem, "verse_with_long_id");
        arena.semantics.set_class(poem, "poem");
        let verse = arena.alloc(Kind::Paragraph);
        let text = arena.alloc_text("abcde");
        arena.append_child(verse, text);
        arena.append_child(poem, verse);
        assert!(MarkupEstimator.shell(&arena, poem) >= 30);

        flow.push(&mut arena, poem, &mut diagnostics);

        assert!(flow.finish(&arena).is_empty());
        assert!(matches!(
            diagnostics.entries(),
            [Diagnostic::OversizeDropped { max_size: 30, .. }]
        ));
    }

    #[test]
    fn test_empty_root_kept_only_with_id() {
        let mut arena = Arena::new();

        let anonymous = arena.alloc(Kind::Container);
        let flow = Flow::new(anonymous, 100, &TextEstimator);
        assert!(flow.finish(&arena).is_empty());

        let identified = arena.alloc(Kind::Container);
        arena.semantics.set_id(identified, "empty_section");
        let flow = Flow::new(identified, 100, &TextEstimator);
        assert_eq!(flow.finish(&arena), vec![identified]);
    }

    #[test]
    fn test_flush_keeps_empty_root_open() {
        let mut arena = Arena::new();
        let mut diagnostics = Diagnostics::new();
        let root = arena.alloc(Kind::Container);
        arena.semantics.set_id(root, "s");
        let mut flow = Flow::new(root, 100, &TextEstimator);

        flow.flush(&mut arena);
        assert_eq!(flow.current_root(), root);

        let p = paragraph(&mut arena, 99);
        flow.push(&mut arena, p, &mut diagnostics);
        assert_eq!(flow.finish(&arena), vec![root]);
    }
}
