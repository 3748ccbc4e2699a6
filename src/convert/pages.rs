//! Generated pages: title, cover, annotation, FB2 info, about and license.
//!
//! Pages are single documents; they are not paginated.

use super::context::Context;
use super::elements::heading;
use crate::fb2::{Author, DocumentInfo, PublishInfo};
use crate::ir::{Kind, NodeId};
use crate::structure::DocumentKind;

const ABOUT_TEXT: &[&str] = &[
    "This book was converted from FictionBook (FB2) format by fb2epub.",
    "(This book might contain copyrighted material; the authors of the converter bear no responsibility for its usage.)",
];

const LICENSE_TEXT: &[&str] = &[
    "The converter is free software, distributed under the terms of the MIT license.",
    "The license of the converter does not apply to the converted book. The book remains under the terms set by its rights holders.",
];

impl Context<'_> {
    /// Title page: book title, authors, translators and series. Skipped when
    /// the description has none of them.
    pub fn title_page(&mut self) {
        let book = self.book;
        let info = &book.description.title_info;
        let root = self.element_with_class(Kind::Container, "titlepage");
        self.set_lang(root, info.lang.as_deref());

        if !info.book_title.is_empty() {
            let node = self.text_block(heading(2), "title", &info.book_title);
            self.append(root, node);
        }
        for author in &info.authors {
            let node = self.text_block(Kind::Paragraph, "author", &author.display_name());
            self.append(root, node);
        }
        if !info.translators.is_empty() {
            let names = joined_names(&info.translators);
            let text = format!("Translated by {names}");
            let node = self.text_block(Kind::Paragraph, "translator", &text);
            self.append(root, node);
        }
        for sequence in &info.sequences {
            let text = match &sequence.number {
                Some(number) => format!("{} #{number}", sequence.name),
                None => sequence.name.clone(),
            };
            let node = self.text_block(Kind::Paragraph, "sequence", &text);
            self.append(root, node);
        }

        if self.arena.has_children(root) {
            self.add_document_with_nav(DocumentKind::TitlePage, root, &info.book_title, 1);
        }
    }

    /// Cover page from the first cover image. Returns the image href used.
    pub fn cover_page(&mut self) -> Option<String> {
        let href = self.book.description.title_info.coverpage.first()?.clone();
        let src = self.images.use_image(&href, &mut self.diagnostics)?;

        let root = self.element_with_class(Kind::Container, "coverpage");
        let img = self.element(Kind::Image);
        self.arena.semantics.set_src(img, &src);
        self.arena.semantics.set_alt(img, "Cover");
        self.append(root, img);
        self.add_document_with_nav(DocumentKind::Cover, root, "Cover", 1);
        Some(href)
    }

    /// Annotation page from the title-info annotation.
    pub fn annotation_page(&mut self) {
        let book = self.book;
        let Some(annotation) = &book.description.title_info.annotation else {
            return;
        };
        let root = self.element_with_class(Kind::Container, "annotation_page");
        self.set_lang(root, book.lang());
        let node = self.annotation(annotation, 1);
        self.append(root, node);
        self.add_document_with_nav(DocumentKind::Annotation, root, "Annotation", 1);
    }

    /// Page listing document-info and publish-info.
    pub fn info_page(&mut self) {
        let description = &self.book.description;
        let mut rows = Vec::new();
        if let Some(info) = &description.document_info {
            document_info_rows(info, &mut rows);
        }
        if let Some(info) = &description.publish_info {
            publish_info_rows(info, &mut rows);
        }
        if rows.is_empty() {
            return;
        }

        let root = self.element_with_class(Kind::Container, "fb2info");
        let title = self.text_block(heading(2), "title", "FB2 document info");
        self.append(root, title);
        for (label, value) in rows {
            let node = self.element_with_class(Kind::Paragraph, "info_item");
            let strong = self.element(Kind::Strong);
            self.append_text(strong, label);
            self.append(node, strong);
            self.append_text(node, &format!(" {value}"));
            self.append(root, node);
        }
        self.add_document_with_nav(DocumentKind::Info, root, "FB2 info", 1);
    }

    /// About and license pages.
    pub fn about_pages(&mut self) {
        let about = self.text_page("about", "About", ABOUT_TEXT);
        self.add_document_with_nav(DocumentKind::About, about, "About", 1);

        let license = self.text_page("license", "License", LICENSE_TEXT);
        self.add_document_with_nav(DocumentKind::License, license, "License", 1);
    }

    fn text_page(&mut self, class: &str, title: &str, paragraphs: &[&str]) -> NodeId {
        let root = self.element_with_class(Kind::Container, class);
        let heading = self.text_block(heading(2), "title", title);
        self.append(root, heading);
        for text in paragraphs {
            let p = self.element(Kind::Paragraph);
            self.append_text(p, text);
            self.append(root, p);
        }
        root
    }

    fn text_block(&mut self, kind: Kind, class: &str, text: &str) -> NodeId {
        let node = self.element_with_class(kind, class);
        self.append_text(node, text);
        node
    }
}

fn joined_names(authors: &[Author]) -> String {
    authors
        .iter()
        .map(Author::display_name)
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_row(rows: &mut Vec<(&'static str, String)>, label: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        rows.push((label, value.to_string()));
    }
}

fn document_info_rows(info: &DocumentInfo, rows: &mut Vec<(&'static str, String)>) {
    let authors = joined_names(&info.authors);
    push_row(rows, "Document authors:", Some(&authors));
    push_row(rows, "Program used:", info.program_used.as_deref());
    push_row(rows, "Date:", info.date.as_deref());
    for url in &info.src_urls {
        push_row(rows, "Source URL:", Some(url));
    }
    push_row(rows, "Source OCR:", info.src_ocr.as_deref());
    push_row(rows, "Document id:", info.id.as_deref());
    push_row(rows, "Version:", info.version.as_deref());
}

fn publish_info_rows(info: &PublishInfo, rows: &mut Vec<(&'static str, String)>) {
    push_row(rows, "Book name:", info.book_name.as_deref());
    push_row(rows, "Publisher:", info.publisher.as_deref());
    push_row(rows, "City:", info.city.as_deref());
    push_row(rows, "Year:", info.year.as_deref());
    push_row(rows, "ISBN:", info.isbn.as_deref());
}
