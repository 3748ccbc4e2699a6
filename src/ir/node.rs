//! Markup node types and kinds.

/// Unique identifier for a node within an [`Arena`](super::Arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Index into the arena's node vector.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a markup node.
///
/// One variant per output element. Attributes (id, class, href, ...) live
/// in the arena's [`SemanticMap`](super::SemanticMap), so the kind alone
/// decides what a node may contain and how it serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    /// Leaf character data. References a range in the arena's text buffer.
    #[default]
    Text,
    /// Generic block container (`<div>`). The only splittable kind.
    Container,
    /// Paragraph (`<p>`).
    Paragraph,
    /// Headings with level 1-6.
    Heading(u8),
    /// Generic inline container (`<span>`).
    Inline,
    Strong,
    Emphasis,
    Strikethrough,
    Subscript,
    Superscript,
    Code,
    /// Hyperlink (`<a>`). href in SemanticMap.
    Anchor,
    /// Raster image (`<img>`). src/alt in SemanticMap.
    Image,
    /// Line break between blocks (`<br>`).
    EmptyLine,
    Table,
    TableRow,
    TableCell,
    TableHeaderCell,
}

impl Kind {
    /// XHTML tag name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Text | Kind::Inline => "span",
            Kind::Container => "div",
            Kind::Paragraph => "p",
            Kind::Heading(1) => "h1",
            Kind::Heading(2) => "h2",
            Kind::Heading(3) => "h3",
            Kind::Heading(4) => "h4",
            Kind::Heading(5) => "h5",
            Kind::Heading(_) => "h6",
            Kind::Strong => "strong",
            Kind::Emphasis => "em",
            Kind::Strikethrough => "del",
            Kind::Subscript => "sub",
            Kind::Superscript => "sup",
            Kind::Code => "code",
            Kind::Anchor => "a",
            Kind::Image => "img",
            Kind::EmptyLine => "br",
            Kind::Table => "table",
            Kind::TableRow => "tr",
            Kind::TableCell => "td",
            Kind::TableHeaderCell => "th",
        }
    }

    /// Block-level kinds. Back-links are attached to the nearest block.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Kind::Container
                | Kind::Paragraph
                | Kind::Heading(_)
                | Kind::Table
                | Kind::TableRow
                | Kind::TableCell
                | Kind::TableHeaderCell
        )
    }

    /// Self-closing kinds (`<img/>`, `<br/>`).
    pub fn is_void(self) -> bool {
        matches!(self, Kind::Image | Kind::EmptyLine)
    }

    /// Whether an oversized node of this kind may be split across documents.
    pub fn is_splittable(self) -> bool {
        self == Kind::Container
    }

    /// Whether the kind may own child nodes.
    pub fn accepts_children(self) -> bool {
        !self.is_void() && self != Kind::Text
    }
}

/// Range into the arena's text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    /// Byte offset into the buffer.
    pub start: u32,
    /// Length in bytes.
    pub len: u32,
}

impl TextRange {
    /// Create a new text range.
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Check if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the end offset.
    pub fn end(&self) -> u32 {
        self.start + self.len
    }
}

/// A node in the markup arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Kind,
    /// Owning node (None for document roots and detached nodes).
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Text content range (only for Text nodes).
    pub text: TextRange,
}

impl Node {
    /// Create a new detached node.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            text: TextRange::default(),
        }
    }

    /// Create a text node with the given range.
    pub fn text(range: TextRange) -> Self {
        Self {
            text: range,
            ..Self::new(Kind::Text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_tags_clamp_to_h6() {
        assert_eq!(Kind::Heading(1).tag(), "h1");
        assert_eq!(Kind::Heading(6).tag(), "h6");
        assert_eq!(Kind::Heading(9).tag(), "h6");
    }

    #[test]
    fn test_only_containers_split() {
        assert!(Kind::Container.is_splittable());
        assert!(!Kind::Paragraph.is_splittable());
        assert!(!Kind::Table.is_splittable());
    }

    #[test]
    fn test_void_kinds_have_no_children() {
        assert!(!Kind::Image.accepts_children());
        assert!(!Kind::EmptyLine.accepts_children());
        assert!(!Kind::Text.accepts_children());
        assert!(Kind::Anchor.accepts_children());
    }
}
