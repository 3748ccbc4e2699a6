//! Sparse attributes for markup nodes.
//!
//! Most nodes don't have an id, href, or src. Using HashMaps is more
//! memory-efficient than `Option<String>` on every Node.
//!
//! String values are stored in a single contiguous buffer, with TextRange
//! references into that buffer. Overwriting a value appends the new string
//! and repoints the range; the old bytes stay in the buffer.

use std::collections::HashMap;

use super::node::{NodeId, TextRange};

/// Sparse map for node attributes.
#[derive(Debug, Default, Clone)]
pub struct SemanticMap {
    /// Contiguous buffer for all string attribute values.
    buffer: String,
    id: HashMap<NodeId, TextRange>,
    class: HashMap<NodeId, TextRange>,
    lang: HashMap<NodeId, TextRange>,
    href: HashMap<NodeId, TextRange>,
    src: HashMap<NodeId, TextRange>,
    alt: HashMap<NodeId, TextRange>,
    title: HashMap<NodeId, TextRange>,
    /// epub:type attribute (noteref, footnote).
    epub_type: HashMap<NodeId, TextRange>,
    /// align attribute (table cells and rows).
    align: HashMap<NodeId, TextRange>,
    row_span: HashMap<NodeId, u32>,
    col_span: HashMap<NodeId, u32>,
}

macro_rules! string_attr {
    ($field:ident, $set:ident, $doc:literal) => {
        #[doc = concat!("Set the ", $doc, " for a node. Empty values are ignored.")]
        pub fn $set(&mut self, node: NodeId, value: &str) {
            if !value.is_empty() {
                let range = self.append(value);
                self.$field.insert(node, range);
            }
        }

        #[doc = concat!("Get the ", $doc, " for a node.")]
        pub fn $field(&self, node: NodeId) -> Option<&str> {
            self.$field.get(&node).map(|r| self.get_str(*r))
        }
    };
}

impl SemanticMap {
    /// Create a new empty semantic map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string to the buffer and return its TextRange.
    fn append(&mut self, s: &str) -> TextRange {
        let start = self.buffer.len() as u32;
        self.buffer.push_str(s);
        TextRange::new(start, s.len() as u32)
    }

    /// Get a string slice from a TextRange.
    fn get_str(&self, range: TextRange) -> &str {
        &self.buffer[range.start as usize..range.end() as usize]
    }

    string_attr!(id, set_id, "id");
    string_attr!(class, set_class, "class");
    string_attr!(lang, set_lang, "language");
    string_attr!(href, set_href, "href");
    string_attr!(src, set_src, "image source");
    string_attr!(alt, set_alt, "alt text");
    string_attr!(title, set_title, "title");
    string_attr!(epub_type, set_epub_type, "epub:type");
    string_attr!(align, set_align, "alignment");

    /// Remove the id of a node.
    pub fn clear_id(&mut self, node: NodeId) -> Option<String> {
        let range = self.id.remove(&node)?;
        Some(self.get_str(range).to_string())
    }

    /// Remove the href of a node.
    pub fn clear_href(&mut self, node: NodeId) {
        self.href.remove(&node);
    }

    // --- rowspan / colspan ---

    pub fn set_row_span(&mut self, node: NodeId, span: u32) {
        if span > 1 {
            self.row_span.insert(node, span);
        }
    }

    pub fn row_span(&self, node: NodeId) -> Option<u32> {
        self.row_span.get(&node).copied()
    }

    pub fn set_col_span(&mut self, node: NodeId, span: u32) {
        if span > 1 {
            self.col_span.insert(node, span);
        }
    }

    pub fn col_span(&self, node: NodeId) -> Option<u32> {
        self.col_span.get(&node).copied()
    }

    /// Copy the presentation attributes (class, language) from one node to another.
    pub fn inherit_presentation(&mut self, from: NodeId, to: NodeId) {
        if let Some(range) = self.class.get(&from).copied() {
            self.class.insert(to, range);
        }
        if let Some(range) = self.lang.get(&from).copied() {
            self.lang.insert(to, range);
        }
    }

    /// Iterate the string attributes of a node in serialization order.
    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("id", &self.id),
            ("class", &self.class),
            ("href", &self.href),
            ("src", &self.src),
            ("alt", &self.alt),
            ("title", &self.title),
            ("align", &self.align),
            ("epub:type", &self.epub_type),
            ("xml:lang", &self.lang),
        ]
        .into_iter()
        .filter_map(move |(name, map)| map.get(&node).map(|r| (name, self.get_str(*r))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut semantics = SemanticMap::new();
        let node = NodeId(3);

        semantics.set_href(node, "#note1");
        semantics.set_class(node, "note_link");

        assert_eq!(semantics.href(node), Some("#note1"));
        assert_eq!(semantics.class(node), Some("note_link"));
        assert_eq!(semantics.src(node), None);
    }

    #[test]
    fn test_overwrite_and_clear() {
        let mut semantics = SemanticMap::new();
        let node = NodeId(1);

        semantics.set_href(node, "#");
        semantics.set_href(node, "section2.xhtml#p1");
        assert_eq!(semantics.href(node), Some("section2.xhtml#p1"));

        semantics.set_id(node, "p1");
        assert_eq!(semantics.clear_id(node).as_deref(), Some("p1"));
        assert_eq!(semantics.id(node), None);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut semantics = SemanticMap::new();
        semantics.set_alt(NodeId(0), "");
        semantics.set_col_span(NodeId(0), 1);
        assert_eq!(semantics.alt(NodeId(0)), None);
        assert_eq!(semantics.col_span(NodeId(0)), None);
    }

    #[test]
    fn test_inherit_presentation() {
        let mut semantics = SemanticMap::new();
        semantics.set_class(NodeId(0), "section1");
        semantics.set_lang(NodeId(0), "ru");
        semantics.set_id(NodeId(0), "s1");

        semantics.inherit_presentation(NodeId(0), NodeId(1));

        assert_eq!(semantics.class(NodeId(1)), Some("section1"));
        assert_eq!(semantics.lang(NodeId(1)), Some("ru"));
        assert_eq!(semantics.id(NodeId(1)), None);
    }

    #[test]
    fn test_attribute_order() {
        let mut semantics = SemanticMap::new();
        let node = NodeId(2);
        semantics.set_lang(node, "en");
        semantics.set_id(node, "a");
        semantics.set_href(node, "#b");

        let names: Vec<_> = semantics.attributes(node).map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "href", "xml:lang"]);
    }
}
