//! FB2 to markup documents.
//!
//! Conversion runs in two passes over one [`Arena`]:
//!
//! 1. **Build**: pages and bodies are converted into markup, flowed into
//!    size-bounded documents, and every id and internal link is recorded.
//! 2. **Remap**: once all documents exist and have file names, the
//!    [`Remapper`] rewrites the pending anchors.
//!
//! # Example
//!
//! ```
//! use fb2epub::convert::Converter;
//! use fb2epub::fb2::FictionBook;
//!
//! let fb2 = br#"<?xml version="1.0" encoding="utf-8"?>
//! <FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
//!   <description><title-info><book-title>Tiny</book-title></title-info></description>
//!   <body><section id="s1"><p>Hello</p></section></body>
//! </FictionBook>"#;
//!
//! let book = FictionBook::from_bytes(fb2)?;
//! let conversion = Converter::new().convert(&book)?;
//! assert!(!conversion.structure.is_empty());
//! # Ok::<(), fb2epub::error::Error>(())
//! ```

mod context;
mod elements;
pub mod images;
mod pages;
mod sections;

pub use elements::EXTERNAL_LINK_CLASS;
pub use images::{IMAGE_DIR, ImageStore, StoredImage};

use context::Context;

use crate::config::ConversionConfig;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::fb2::FictionBook;
use crate::ir::Arena;
use crate::refs::Remapper;
use crate::structure::Structure;

/// Result of a conversion: documents, images and book metadata.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub arena: Arena,
    /// Documents in reading order, with file names assigned.
    pub structure: Structure,
    pub images: ImageStore,
    pub metadata: BookMetadata,
    /// Non-fatal problems found along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// Package metadata collected from the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<Contributor>,
    pub translators: Vec<Contributor>,
    pub language: String,
    /// Document id, or a `urn:sha1:` derived from title and authors.
    pub identifier: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub series: Option<Series>,
    pub subjects: Vec<String>,
    /// Image path of the cover, relative to the content directory.
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub file_as: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub index: Option<String>,
}

impl BookMetadata {
    fn from_book(book: &FictionBook) -> Self {
        let description = &book.description;
        let info = &description.title_info;
        let contributors = |authors: &[crate::fb2::Author]| {
            authors
                .iter()
                .map(|a| Contributor {
                    name: a.display_name(),
                    file_as: a.file_as(),
                })
                .filter(|c| !c.name.is_empty())
                .collect::<Vec<_>>()
        };
        let authors = contributors(&info.authors);

        let identifier = description
            .document_info
            .as_ref()
            .and_then(|d| d.id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derived_identifier(&info.book_title, &authors));

        Self {
            title: info.book_title.trim().to_string(),
            translators: contributors(&info.translators),
            authors,
            language: info
                .lang
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| "en".to_string()),
            identifier,
            description: info
                .annotation
                .as_ref()
                .map(|a| a.text())
                .filter(|t| !t.trim().is_empty()),
            publisher: description
                .publish_info
                .as_ref()
                .and_then(|p| p.publisher.clone()),
            date: info
                .date
                .as_deref()
                .map(crate::util::truncate_to_date)
                .filter(|d| !d.trim().is_empty()),
            series: info.sequences.first().map(|s| Series {
                name: s.name.clone(),
                index: s.number.clone(),
            }),
            subjects: info.genres.clone(),
            cover_image: None,
        }
    }
}

fn derived_identifier(title: &str, authors: &[Contributor]) -> String {
    let mut hasher = sha1_smol::Sha1::new();
    hasher.update(title.as_bytes());
    for author in authors {
        hasher.update(b"\n");
        hasher.update(author.name.as_bytes());
    }
    format!("urn:sha1:{}", hasher.digest())
}

/// Converts parsed books according to a [`ConversionConfig`].
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ConversionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Run both passes. Fails only on unusable input or settings.
    pub fn convert(&self, book: &FictionBook) -> Result<Conversion> {
        self.config.validate()?;
        let main = book
            .main_body()
            .ok_or_else(|| Error::MissingElement("body".into()))?;

        let mut ctx = Context::new(book, &self.config);

        ctx.title_page();
        let cover = ctx.cover_page();
        ctx.annotation_page();
        ctx.main_body(main);
        for body in book.notes_bodies() {
            ctx.notes_body(body);
        }
        if self.config.include_fb2_info {
            ctx.info_page();
        }
        if !self.config.skip_about_page {
            ctx.about_pages();
        }
        log::info!(
            "built {} documents, {} ids, {} link targets",
            ctx.structure.len(),
            ctx.registry.len(),
            ctx.links.len()
        );

        ctx.structure.assign_file_names();
        Remapper::new(self.config.notes).remap(
            &mut ctx.arena,
            &mut ctx.structure,
            &ctx.registry,
            &ctx.links,
            &mut ctx.diagnostics,
        );

        let mut metadata = BookMetadata::from_book(book);
        metadata.cover_image = cover
            .and_then(|href| ctx.images.get(&href))
            .map(|image| image.path());

        if !ctx.diagnostics.is_empty() {
            log::info!("conversion finished with {} diagnostic(s)", ctx.diagnostics.len());
        }
        Ok(Conversion {
            arena: ctx.arena,
            structure: ctx.structure,
            images: ctx.images,
            metadata,
            diagnostics: ctx.diagnostics.into_vec(),
        })
    }
}

/// Convert `book` with `config`.
pub fn convert(book: &FictionBook, config: &ConversionConfig) -> Result<Conversion> {
    Converter::new().with_config(config.clone()).convert(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoteStrategy;
    use crate::fb2::{Body, FlowItem, Inline, Paragraph, Section};
    use crate::structure::DocumentKind;

    fn linked_book() -> FictionBook {
        let mut book = FictionBook::default();
        book.description.title_info.book_title = "Linked".into();
        let reference = Paragraph {
            content: vec![
                Inline::Text("See".into()),
                Inline::Link {
                    href: "#n1".into(),
                    kind: Some("note".into()),
                    content: vec![Inline::Text("1".into())],
                },
            ],
            ..Paragraph::default()
        };
        book.bodies.push(Body {
            sections: vec![Section {
                id: Some("s1".into()),
                content: vec![FlowItem::Paragraph(reference)],
                ..Section::default()
            }],
            ..Body::default()
        });
        book.bodies.push(Body {
            name: Some("notes".into()),
            sections: vec![Section {
                id: Some("n1".into()),
                content: vec![FlowItem::Paragraph(Paragraph::from_text("A note."))],
                ..Section::default()
            }],
            ..Body::default()
        });
        book
    }

    #[test]
    fn test_missing_body_is_fatal() {
        let book = FictionBook::default();
        assert!(matches!(
            Converter::new().convert(&book),
            Err(Error::MissingElement(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let book = linked_book();
        let config = ConversionConfig::default().with_max_document_size(0);
        assert!(matches!(
            convert(&book, &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_document_order() {
        let book = linked_book();
        let conversion = Converter::new().convert(&book).unwrap();
        let kinds: Vec<_> = conversion
            .structure
            .documents()
            .iter()
            .map(|d| d.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                DocumentKind::TitlePage,
                DocumentKind::Text,
                DocumentKind::Notes,
                DocumentKind::About,
                DocumentKind::License,
            ]
        );
    }

    #[test]
    fn test_back_link_strategy() {
        let book = linked_book();
        let config = ConversionConfig::default()
            .with_notes(NoteStrategy::BackLinks)
            .with_skip_about_page(true);
        let conversion = convert(&book, &config).unwrap();
        let arena = &conversion.arena;

        let anchor = arena
            .iter_dfs(conversion.structure.documents()[1].root)
            .find(|&n| arena.semantics.href(n).is_some())
            .unwrap();
        assert_eq!(arena.semantics.href(anchor), Some("notes1.xhtml#n1"));
        let notes = conversion.structure.documents()[2].root;
        assert!(arena.text_content(notes).contains("(<< back)"));
        assert!(conversion.diagnostics.is_empty());
    }

    #[test]
    fn test_footnote_strategy() {
        let book = linked_book();
        let conversion = Converter::new().convert(&book).unwrap();
        let text = &conversion.structure.documents()[1];
        let embedded: Vec<_> = text.footnotes().map(|n| n.id).collect();
        assert_eq!(embedded, ["n1"]);
    }

    #[test]
    fn test_identifier_fallback_is_stable() {
        let book = linked_book();
        let first = BookMetadata::from_book(&book);
        let second = BookMetadata::from_book(&book);
        assert!(first.identifier.starts_with("urn:sha1:"));
        assert_eq!(first.identifier, second.identifier);
        assert_eq!(first.language, "en");
    }
}
