//! Element converters: one FB2 element in, at most one markup node out.
//!
//! Converters build detached nodes; the caller decides where they go
//! (straight into a parent, or through a [`Flow`](crate::flow::Flow)).

use super::context::Context;
use crate::fb2::{
    Annotation, Cite, Epigraph, FlowItem, Image, Inline, Paragraph, Poem, Stanza, Table, Title,
    TitleLine,
};
use crate::ir::{Kind, NodeId};
use crate::refs::{Link, PENDING_HREF};

/// Class of external link anchors.
pub const EXTERNAL_LINK_CLASS: &str = "externalLink";

/// Heading kind for a title level (levels beyond 6 render as `<h6>`).
pub(crate) fn heading(level: usize) -> Kind {
    Kind::Heading(level.clamp(1, 6) as u8)
}

impl Context<'_> {
    /// Convert a paragraph-like element into a `kind` block.
    ///
    /// `drop` marks the first paragraph of a section for a capital drop.
    pub fn paragraph(&mut self, paragraph: &Paragraph, kind: Kind, drop: bool) -> NodeId {
        let node = self.element(kind);
        let drop = drop && !paragraph.text().trim().is_empty();
        match (&paragraph.style, drop) {
            (Some(style), true) => self.arena.semantics.set_class(node, &format!("{style} drop")),
            (Some(style), false) => self.arena.semantics.set_class(node, style),
            (None, true) => self.arena.semantics.set_class(node, "drop"),
            (None, false) => {}
        }
        self.set_lang(node, paragraph.lang.as_deref());
        self.inlines(node, &paragraph.content);
        self.register_id(node, paragraph.id.as_deref());
        node
    }

    fn classed_paragraph(&mut self, paragraph: &Paragraph, class: &str) -> NodeId {
        let node = self.paragraph(paragraph, Kind::Paragraph, false);
        if paragraph.style.is_none() {
            self.arena.semantics.set_class(node, class);
        }
        node
    }

    pub fn inlines(&mut self, parent: NodeId, items: &[Inline]) {
        for item in items {
            self.inline(parent, item);
        }
    }

    fn inline(&mut self, parent: NodeId, item: &Inline) {
        match item {
            Inline::Text(text) => self.append_text(parent, text),
            Inline::Strong(content) => self.wrap(parent, Kind::Strong, content),
            Inline::Emphasis(content) => self.wrap(parent, Kind::Emphasis, content),
            Inline::Strikethrough(content) => self.wrap(parent, Kind::Strikethrough, content),
            Inline::Sub(content) => self.wrap(parent, Kind::Subscript, content),
            Inline::Sup(content) => self.wrap(parent, Kind::Superscript, content),
            Inline::Code(content) => self.wrap(parent, Kind::Code, content),
            Inline::Style { name, content } => {
                let span = self.element(Kind::Inline);
                if let Some(name) = name {
                    self.arena.semantics.set_class(span, name);
                }
                self.inlines(span, content);
                self.append(parent, span);
            }
            Inline::Link {
                href,
                kind,
                content,
            } => self.link(parent, href, kind.as_deref(), content),
            Inline::Image(image) => {
                if let Some(node) = self.image(image) {
                    self.append(parent, node);
                }
            }
        }
    }

    fn wrap(&mut self, parent: NodeId, kind: Kind, content: &[Inline]) {
        let node = self.element(kind);
        self.inlines(node, content);
        self.append(parent, node);
    }

    fn link(&mut self, parent: NodeId, href: &str, kind: Option<&str>, content: &[Inline]) {
        match Link::parse(href) {
            Link::Internal(target) => {
                let anchor = self.element(Kind::Anchor);
                self.arena.semantics.set_href(anchor, PENDING_HREF);
                if kind == Some("note") {
                    self.arena.semantics.set_class(anchor, "note_link");
                }
                self.inlines(anchor, content);
                self.append(parent, anchor);
                self.register_anchor(anchor, &target);
            }
            Link::External(url) => {
                let anchor = self.element_with_class(Kind::Anchor, EXTERNAL_LINK_CLASS);
                self.arena.semantics.set_href(anchor, &url);
                self.inlines(anchor, content);
                self.append(parent, anchor);
            }
            Link::Unknown(raw) => {
                log::debug!("dropping unusable link target `{raw}`");
                self.inlines(parent, content);
            }
        }
    }

    /// Convert an image reference. Images without binary data are skipped.
    pub fn image(&mut self, image: &Image) -> Option<NodeId> {
        let src = self.images.use_image(&image.href, &mut self.diagnostics)?;
        let node = self.element(Kind::Image);
        self.arena.semantics.set_src(node, &src);
        let alt = image.alt.as_deref().unwrap_or_default();
        self.arena.semantics.set_alt(node, alt);
        if let Some(title) = &image.title {
            self.arena.semantics.set_title(node, title);
        }
        self.register_id(node, image.id.as_deref());
        Some(node)
    }

    /// Image wrapped in a classed container, so it can be centered.
    pub fn image_block(&mut self, image: &Image, class: &str) -> Option<NodeId> {
        let node = self.image(image)?;
        let block = self.element_with_class(Kind::Container, class);
        self.append(block, node);
        Some(block)
    }

    /// Convert a title into a `title<level>` container of headings.
    pub fn title(&mut self, title: &Title, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, &format!("title{level}"));
        for line in &title.lines {
            let node = match line {
                TitleLine::Paragraph(p) => self.paragraph(p, heading(level), false),
                TitleLine::EmptyLine => self.element(Kind::EmptyLine),
            };
            self.append(block, node);
        }
        block
    }

    pub fn epigraph(&mut self, epigraph: &Epigraph, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "epigraph");
        self.register_id(block, epigraph.id.as_deref());
        self.flow_items_into(block, &epigraph.content, level);
        for author in &epigraph.text_authors {
            let node = self.classed_paragraph(author, "epigraph_author");
            self.append(block, node);
        }
        block
    }

    pub fn annotation(&mut self, annotation: &Annotation, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "annotation");
        self.set_lang(block, annotation.lang.as_deref());
        self.register_id(block, annotation.id.as_deref());
        self.flow_items_into(block, &annotation.content, level);
        block
    }

    pub fn poem(&mut self, poem: &Poem, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "poem");
        self.set_lang(block, poem.lang.as_deref());
        self.register_id(block, poem.id.as_deref());

        if let Some(title) = &poem.title {
            let node = self.title(title, level);
            self.append(block, node);
        }
        for epigraph in &poem.epigraphs {
            let node = self.epigraph(epigraph, level);
            self.append(block, node);
        }
        for stanza in &poem.stanzas {
            let node = self.stanza(stanza, level);
            self.append(block, node);
        }
        for author in &poem.text_authors {
            let node = self.classed_paragraph(author, "text_author");
            self.append(block, node);
        }
        if let Some(date) = &poem.date {
            let node = self.element_with_class(Kind::Paragraph, "poem_date");
            self.append_text(node, date);
            self.append(block, node);
        }
        block
    }

    fn stanza(&mut self, stanza: &Stanza, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "stanza");
        if let Some(title) = &stanza.title {
            let node = self.title(title, level + 1);
            self.append(block, node);
        }
        if let Some(subtitle) = &stanza.subtitle {
            let node = self.classed_paragraph(subtitle, "poem_subtitle");
            self.append(block, node);
        }
        for verse in &stanza.verses {
            let node = self.classed_paragraph(verse, "v");
            self.append(block, node);
        }
        block
    }

    pub fn cite(&mut self, cite: &Cite, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "citation");
        self.set_lang(block, cite.lang.as_deref());
        self.register_id(block, cite.id.as_deref());
        self.flow_items_into(block, &cite.content, level);
        for author in &cite.text_authors {
            let node = self.classed_paragraph(author, "text_author");
            self.append(block, node);
        }
        block
    }

    pub fn table(&mut self, table: &Table) -> NodeId {
        let node = self.element(Kind::Table);
        if let Some(style) = &table.style {
            self.arena.semantics.set_class(node, style);
        }
        self.register_id(node, table.id.as_deref());

        for row in &table.rows {
            let tr = self.element(Kind::TableRow);
            if let Some(align) = &row.align {
                self.arena.semantics.set_align(tr, align);
            }
            for cell in &row.cells {
                let kind = if cell.header {
                    Kind::TableHeaderCell
                } else {
                    Kind::TableCell
                };
                let td = self.element(kind);
                self.arena.semantics.set_col_span(td, cell.colspan);
                self.arena.semantics.set_row_span(td, cell.rowspan);
                if let Some(align) = &cell.align {
                    self.arena.semantics.set_align(td, align);
                }
                self.inlines(td, &cell.content);
                self.register_id(td, cell.id.as_deref());
                self.append(tr, td);
            }
            self.append(node, tr);
        }
        node
    }

    /// Convert one block-level item. `drop` applies to paragraphs only.
    pub fn flow_item(&mut self, item: &FlowItem, level: usize, drop: bool) -> Option<NodeId> {
        Some(match item {
            FlowItem::Paragraph(p) => self.paragraph(p, Kind::Paragraph, drop),
            FlowItem::Subtitle(p) => self.classed_paragraph(p, "subtitle"),
            FlowItem::EmptyLine => self.element(Kind::EmptyLine),
            FlowItem::Poem(poem) => self.poem(poem, level),
            FlowItem::Cite(cite) => self.cite(cite, level),
            FlowItem::Table(table) => self.table(table),
            FlowItem::Image(image) => return self.image_block(image, "normal_image"),
        })
    }

    fn flow_items_into(&mut self, parent: NodeId, items: &[FlowItem], level: usize) {
        for item in items {
            if let Some(node) = self.flow_item(item, level, false) {
                self.append(parent, node);
            }
        }
    }
}
