//! Cross-reference bookkeeping.
//!
//! During conversion every link target is recorded in the [`IdRegistry`]
//! and every internal anchor in the [`LinkTable`]. Once pagination has
//! decided where each node lives, the [`Remapper`] rewrites the anchors.

pub mod links;
pub mod registry;
pub mod remap;

pub use links::{Link, LinkEntry, LinkTable, PENDING_HREF};
pub use registry::{IdRegistry, normalize_id};
pub use remap::{BACK_LINK_CLASS, NoteStrategy, Remapper};
