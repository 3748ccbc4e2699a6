//! FictionBook 2 content model and reader.
//!
//! The model mirrors the FB2 schema closely: a [`Description`] header, one
//! main [`Body`], optional note bodies, and base64 [`Binary`] attachments.
//! It carries no output concerns; the converter turns it into markup.
//!
//! # Example
//!
//! ```
//! use fb2epub::fb2::FictionBook;
//!
//! let xml = br#"<FictionBook><description><title-info>
//!   <book-title>Sample</book-title></title-info></description>
//!   <body><section><p>Hello</p></section></body></FictionBook>"#;
//! let book = FictionBook::from_bytes(xml)?;
//! assert_eq!(book.description.title_info.book_title, "Sample");
//! assert_eq!(book.main_body().map(|b| b.sections.len()), Some(1));
//! # Ok::<(), fb2epub::error::Error>(())
//! ```

mod parser;

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Result;

/// A parsed FB2 book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FictionBook {
    pub description: Description,
    /// All bodies in document order. The first one without a notes name is
    /// the main text.
    pub bodies: Vec<Body>,
    pub binaries: Vec<Binary>,
    /// Every `id` attribute outside the binaries, in document order.
    pub ids: Vec<String>,
}

impl FictionBook {
    /// Parse an FB2 document, detecting its encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        parser::parse(bytes)
    }

    /// The main text body.
    pub fn main_body(&self) -> Option<&Body> {
        self.bodies.iter().find(|b| !b.is_notes())
    }

    /// Bodies holding notes or comments, in document order.
    pub fn notes_bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|b| b.is_notes())
    }

    /// Binary with the given id (with or without a leading `#`).
    pub fn binary(&self, id: &str) -> Option<&Binary> {
        let id = id.strip_prefix('#').unwrap_or(id);
        self.binaries.iter().find(|b| b.id == id)
    }

    /// Language of the book, from title-info.
    pub fn lang(&self) -> Option<&str> {
        self.description.title_info.lang.as_deref()
    }
}

/// Read and parse an FB2 file.
pub fn read_fb2(path: impl AsRef<Path>) -> Result<FictionBook> {
    let bytes = std::fs::read(path.as_ref())?;
    FictionBook::from_bytes(&bytes)
}

// ============================================================================
// Description
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
    pub title_info: TitleInfo,
    pub document_info: Option<DocumentInfo>,
    pub publish_info: Option<PublishInfo>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleInfo {
    pub genres: Vec<String>,
    pub authors: Vec<Author>,
    pub book_title: String,
    pub annotation: Option<Annotation>,
    pub keywords: Option<String>,
    pub date: Option<String>,
    /// Image hrefs of the cover page.
    pub coverpage: Vec<String>,
    pub lang: Option<String>,
    pub src_lang: Option<String>,
    pub translators: Vec<Author>,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
}

impl Author {
    /// "First Middle Last", falling back to the nickname.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return self.nickname.clone().unwrap_or_default();
        }
        parts.join(" ")
    }

    /// "Last, First" for sorting, when a last name exists.
    pub fn file_as(&self) -> Option<String> {
        let last = self.last_name.as_deref().filter(|l| !l.is_empty())?;
        Some(match self.first_name.as_deref() {
            Some(first) if !first.is_empty() => format!("{last}, {first}"),
            _ => last.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub authors: Vec<Author>,
    pub program_used: Option<String>,
    pub date: Option<String>,
    pub src_urls: Vec<String>,
    pub src_ocr: Option<String>,
    pub id: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishInfo {
    pub book_name: Option<String>,
    pub publisher: Option<String>,
    pub city: Option<String>,
    pub year: Option<String>,
    pub isbn: Option<String>,
}

// ============================================================================
// Bodies and sections
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// `notes`, `comments`, or None for the main body.
    pub name: Option<String>,
    pub lang: Option<String>,
    pub image: Option<Image>,
    pub title: Option<Title>,
    pub epigraphs: Vec<Epigraph>,
    pub sections: Vec<Section>,
}

impl Body {
    pub fn is_notes(&self) -> bool {
        matches!(self.name.as_deref(), Some("notes" | "comments"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub title: Option<Title>,
    pub epigraphs: Vec<Epigraph>,
    /// Images between the epigraphs and the annotation.
    pub images: Vec<Image>,
    pub annotation: Option<Annotation>,
    pub content: Vec<FlowItem>,
    pub sections: Vec<Section>,
}

/// Block-level content of sections, epigraphs, annotations and citations.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowItem {
    Paragraph(Paragraph),
    Subtitle(Paragraph),
    EmptyLine,
    Poem(Poem),
    Cite(Cite),
    Table(Table),
    Image(Image),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Title {
    pub lines: Vec<TitleLine>,
}

impl Title {
    /// Plain text of the title, lines joined by a space.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .filter_map(|line| match line {
                TitleLine::Paragraph(p) => Some(p.text()),
                TitleLine::EmptyLine => None,
            })
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TitleLine {
    Paragraph(Paragraph),
    EmptyLine,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Epigraph {
    pub id: Option<String>,
    pub content: Vec<FlowItem>,
    pub text_authors: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub content: Vec<FlowItem>,
}

impl Annotation {
    /// Plain text of the annotation paragraphs, one per line.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                FlowItem::Paragraph(p) | FlowItem::Subtitle(p) => Some(p.text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poem {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub title: Option<Title>,
    pub epigraphs: Vec<Epigraph>,
    pub stanzas: Vec<Stanza>,
    pub text_authors: Vec<Paragraph>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stanza {
    pub title: Option<Title>,
    pub subtitle: Option<Paragraph>,
    pub verses: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cite {
    pub id: Option<String>,
    pub lang: Option<String>,
    pub content: Vec<FlowItem>,
    pub text_authors: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub id: Option<String>,
    pub style: Option<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub align: Option<String>,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    /// `<th>` rather than `<td>`.
    pub header: bool,
    pub id: Option<String>,
    pub colspan: u32,
    pub rowspan: u32,
    pub align: Option<String>,
    pub content: Vec<Inline>,
}

// ============================================================================
// Inline content
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub id: Option<String>,
    pub style: Option<String>,
    pub lang: Option<String>,
    pub content: Vec<Inline>,
}

impl Paragraph {
    /// Paragraph holding a single run of text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Inline::Text(text.into())],
            ..Self::default()
        }
    }

    /// Concatenated text of the paragraph.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.content {
            inline.collect_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Sub(Vec<Inline>),
    Sup(Vec<Inline>),
    Code(Vec<Inline>),
    /// Named style (`<style name="...">`).
    Style {
        name: Option<String>,
        content: Vec<Inline>,
    },
    Link {
        href: String,
        /// `type` attribute; `note` marks note references.
        kind: Option<String>,
        content: Vec<Inline>,
    },
    Image(Image),
}

impl Inline {
    fn collect_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(c)
            | Inline::Emphasis(c)
            | Inline::Strikethrough(c)
            | Inline::Sub(c)
            | Inline::Sup(c)
            | Inline::Code(c)
            | Inline::Style { content: c, .. }
            | Inline::Link { content: c, .. } => {
                for inline in c {
                    inline.collect_text(out);
                }
            }
            Inline::Image(_) => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub id: Option<String>,
    /// Reference to a binary, usually `#id`.
    pub href: String,
    pub alt: Option<String>,
    pub title: Option<String>,
}

// ============================================================================
// Binaries
// ============================================================================

/// A base64 attachment (`<binary>`), decoded on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary {
    pub id: String,
    pub content_type: String,
    /// Base64 payload as found in the file, whitespace included.
    pub base64: String,
}

impl Binary {
    /// Decode the payload.
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        let compact: String = self
            .base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_names() {
        let author = Author {
            first_name: Some("Лев".into()),
            last_name: Some("Толстой".into()),
            ..Author::default()
        };
        assert_eq!(author.display_name(), "Лев Толстой");
        assert_eq!(author.file_as().as_deref(), Some("Толстой, Лев"));

        let nick = Author {
            nickname: Some("anon".into()),
            ..Author::default()
        };
        assert_eq!(nick.display_name(), "anon");
        assert_eq!(nick.file_as(), None);
    }

    #[test]
    fn test_paragraph_text_flattens_inlines() {
        let p = Paragraph {
            content: vec![
                Inline::Text("a ".into()),
                Inline::Strong(vec![Inline::Emphasis(vec![Inline::Text("b".into())])]),
                Inline::Link {
                    href: "#n1".into(),
                    kind: Some("note".into()),
                    content: vec![Inline::Text("[1]".into())],
                },
            ],
            ..Paragraph::default()
        };
        assert_eq!(p.text(), "a b[1]");
    }

    #[test]
    fn test_binary_decode_ignores_whitespace() {
        let binary = Binary {
            id: "b".into(),
            content_type: "image/png".into(),
            base64: "aGVs\n  bG8=\n".into(),
        };
        assert_eq!(binary.decode().unwrap(), b"hello");
    }

    #[test]
    fn test_body_classification() {
        let book = FictionBook {
            bodies: vec![
                Body {
                    name: Some("notes".into()),
                    ..Body::default()
                },
                Body::default(),
            ],
            ..FictionBook::default()
        };
        assert!(book.main_body().is_some_and(|b| b.name.is_none()));
        assert_eq!(book.notes_bodies().count(), 1);
    }
}
