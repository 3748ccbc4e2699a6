//! Identifier registry.
//!
//! Every node that can be a link target gets a book-wide unique id. Ids
//! from the source are normalized into valid XML ids; anchors get generated
//! ids so back-links can point at them. Source ids always win over
//! generated ones.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::Diagnostic;
use crate::ir::{Arena, NodeId};

/// Maps identifiers to the node carrying them.
///
/// The mapping is a lookup handle only; nodes are owned by the arena.
#[derive(Debug, Default, Clone)]
pub struct IdRegistry {
    ids: HashMap<String, NodeId>,
    /// Source ids known up front; never handed out by [`assign`](Self::assign).
    reserved: HashSet<String>,
    /// Ids handed out by [`assign`](Self::assign).
    generated: HashSet<String>,
    counter: usize,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve source identifiers that will be registered later.
    pub fn reserve<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.reserved.extend(ids.into_iter().filter_map(normalize_id));
    }

    /// Register a source identifier for `node` and set it as the node's id.
    ///
    /// Returns the normalized id, or None when `id` is blank. A second
    /// registration of a source id already owned by another node is
    /// rejected; the first owner is kept. A generated id in the way is moved
    /// to a fresh one.
    pub fn register(
        &mut self,
        arena: &mut Arena,
        node: NodeId,
        id: &str,
    ) -> Result<Option<String>, Diagnostic> {
        let Some(id) = normalize_id(id) else {
            return Ok(None);
        };

        match self.ids.get(&id) {
            Some(&owner) if owner == node => return Ok(Some(id)),
            Some(&owner) if self.generated.contains(&id) => {
                self.generated.remove(&id);
                self.ids.remove(&id);
                let moved = self.assign(arena, owner, &generated_prefix(&id));
                log::debug!("generated id {id} moved to {moved}");
            }
            Some(_) => return Err(Diagnostic::IdCollision { id }),
            None => {}
        }

        arena.semantics.set_id(node, &id);
        self.ids.insert(id.clone(), node);
        Ok(Some(id))
    }

    /// Generate a fresh identifier with `prefix` and register it for `node`.
    pub fn assign(&mut self, arena: &mut Arena, node: NodeId, prefix: &str) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{prefix}{}", self.counter);
            if !self.ids.contains_key(&candidate) && !self.reserved.contains(&candidate) {
                arena.semantics.set_id(node, &candidate);
                self.ids.insert(candidate.clone(), node);
                self.generated.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Node registered under `id`.
    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate all (id, node) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.ids.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Prefix of a generated id: everything before the trailing counter.
fn generated_prefix(id: &str) -> String {
    id.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()
}

/// Normalize a raw identifier (or `#fragment`) into a valid XML id.
///
/// Characters outside `[A-Za-z0-9_.-]` become `_`; ids that do not start
/// with a letter or underscore get an `id_` prefix. Empty input yields None.
pub fn normalize_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('#').unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    let mut id: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.insert_str(0, "id_");
    }
    Some(id)
}
