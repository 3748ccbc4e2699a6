//! XHTML serialization of documents.
//!
//! The markup written here is what [`MarkupEstimator`] approximates: start
//! and end tags, attributes in [`SemanticMap::attributes`] order, escaped
//! character data, and a newline after every block element.
//!
//! [`MarkupEstimator`]: crate::ir::MarkupEstimator
//! [`SemanticMap::attributes`]: crate::ir::SemanticMap::attributes

use crate::convert::Conversion;
use crate::ir::{Arena, Kind, NodeId};
use crate::structure::{Document, DocumentId};

/// Stylesheet shared by all documents.
pub const STYLESHEET: &str = include_str!("style.css");

/// File name of [`STYLESHEET`] inside the content directory.
pub const STYLESHEET_FILE: &str = "style.css";

/// Render one document as a complete XHTML file.
///
/// Notes embedded by the footnote strategy follow the body content as
/// `<aside epub:type="footnote">` elements.
pub fn render_document(conversion: &Conversion, id: DocumentId) -> Option<String> {
    let document = conversion.structure.get(id)?;
    let arena = &conversion.arena;
    let title = document
        .nav
        .as_ref()
        .map(|n| n.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(&conversion.metadata.title);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" xml:lang=\"{0}\" lang=\"{0}\">\n",
        escape_xml(&conversion.metadata.language)
    ));
    out.push_str("<head>\n");
    out.push_str(&format!("  <title>{}</title>\n", escape_xml(title)));
    out.push_str(&format!(
        "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{STYLESHEET_FILE}\"/>\n"
    ));
    out.push_str("</head>\n<body>\n");
    write_node(arena, document.root, &mut out);
    write_footnotes(arena, document, &mut out);
    out.push_str("</body>\n</html>\n");
    Some(out)
}

fn write_footnotes(arena: &Arena, document: &Document, out: &mut String) {
    for note in document.footnotes() {
        out.push_str(&format!(
            "<aside epub:type=\"footnote\" id=\"{}\" class=\"footnote\">\n",
            escape_xml(note.id)
        ));
        // A note container contributes its content, not another wrapper.
        if arena.kind(note.content) == Some(Kind::Container) {
            for child in arena.children(note.content) {
                write_node(arena, child, out);
            }
        } else {
            write_node(arena, note.content, out);
        }
        out.push_str("</aside>\n");
    }
}

/// Serialize a subtree.
pub fn write_node(arena: &Arena, node: NodeId, out: &mut String) {
    let Some(n) = arena.node(node) else {
        return;
    };
    if n.kind == Kind::Text {
        push_escaped(out, arena.text(n.text));
        return;
    }

    let tag = n.kind.tag();
    out.push('<');
    out.push_str(tag);
    for (name, value) in arena.semantics.attributes(node) {
        write_attribute(out, name, value);
    }
    if let Some(span) = arena.semantics.row_span(node) {
        write_attribute(out, "rowspan", &span.to_string());
    }
    if let Some(span) = arena.semantics.col_span(node) {
        write_attribute(out, "colspan", &span.to_string());
    }

    if n.kind.is_void() {
        out.push_str("/>");
    } else {
        out.push('>');
        for child in arena.children(node) {
            write_node(arena, child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    if n.kind.is_block() {
        out.push('\n');
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(&mut result, s);
    result
}
