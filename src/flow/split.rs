//! Splitting of oversized containers.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::ir::{Arena, Estimator, Kind, NodeId};

/// Distribute the immediate children of `container` over several pieces.
///
/// `current_size` is the fill of the document the first piece is headed
/// for. The container itself becomes the first piece, so its id and every
/// registry entry pointing at it stay valid; later pieces are fresh
/// containers with the same class and language but no id. Every returned
/// piece estimates below `max_size` on its own.
///
/// A child that cannot fit even an otherwise empty piece is dropped and
/// reported. The first piece is returned empty only when it carries an id.
pub fn split_container(
    arena: &mut Arena,
    estimator: &dyn Estimator,
    container: NodeId,
    current_size: usize,
    max_size: usize,
    diagnostics: &mut Diagnostics,
) -> Vec<NodeId> {
    // Shell of the first piece; later pieces have no id so this bounds them too.
    let overhead = estimator.shell(arena, container);
    let children = arena.take_children(container);

    let mut pieces = vec![container];
    let mut piece = container;
    let mut running = current_size + overhead;

    for child in children {
        let size = estimator.estimate(arena, child);
        if overhead + size >= max_size {
            diagnostics.record(Diagnostic::OversizeDropped { size, max_size });
            continue;
        }

        if running + size >= max_size {
            if arena.has_children(piece) {
                piece = arena.alloc(Kind::Container);
                arena.semantics.inherit_presentation(container, piece);
                pieces.push(piece);
            }
            // The piece opens a document of its own.
            running = overhead;
        }

        arena.append_child(piece, child);
        running += size;
    }

    if !arena.has_children(container) && arena.semantics.id(container).is_none() {
        pieces.remove(0);
    }

    log::debug!(
        "split container {:?} into {} piece(s)",
        container,
        pieces.len()
    );
    pieces
}
