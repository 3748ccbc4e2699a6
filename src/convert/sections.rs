//! Bodies and sections: building units and flowing them into documents.
//!
//! The main body gets one [`Flow`] per section, so every section starts a
//! new document. Notes bodies are flowed as a whole, one unit per note.

use super::context::Context;
use crate::fb2::{Body, FlowItem, Section};
use crate::flow::Flow;
use crate::ir::{Kind, NodeId};
use crate::structure::DocumentKind;

impl Context<'_> {
    /// Convert the main body into text documents.
    pub fn main_body(&mut self, body: &Body) {
        let header = self.body_header(body);
        if !header.is_empty() {
            let root = self.element_with_class(Kind::Container, "section0");
            self.set_lang(root, body.lang.as_deref());
            let title = body.title.as_ref().map(|t| t.text()).unwrap_or_default();
            self.flow_units(root, header, DocumentKind::Text, &title, 1);
        }

        for section in &body.sections {
            self.section(section, 1);
        }
    }

    /// Body image, title and epigraphs.
    fn body_header(&mut self, body: &Body) -> Vec<NodeId> {
        let mut units = Vec::new();
        if let Some(image) = &body.image
            && let Some(node) = self.image_block(image, "section_image")
        {
            units.push(node);
        }
        if let Some(title) = &body.title {
            units.push(self.title(title, 1));
        }
        for epigraph in &body.epigraphs {
            units.push(self.epigraph(epigraph, 1));
        }
        units
    }

    fn section(&mut self, section: &Section, level: usize) {
        log::debug!(
            "section {:?} at level {level}, {} subsection(s)",
            section.id,
            section.sections.len()
        );
        let root = self.element_with_class(Kind::Container, &format!("section{level}"));
        self.set_lang(root, section.lang.as_deref());
        self.register_id(root, section.id.as_deref());

        let units = self.section_units(section, level);
        let title = section.title.as_ref().map(|t| t.text()).unwrap_or_default();
        self.flow_units(root, units, DocumentKind::Text, &title, level);

        for subsection in &section.sections {
            self.section(subsection, level + 1);
        }
    }

    /// Units of one section in reading order. Content is only converted for
    /// sections without subsections.
    fn section_units(&mut self, section: &Section, level: usize) -> Vec<NodeId> {
        let mut units = Vec::new();
        if let Some(title) = &section.title {
            units.push(self.title(title, level + 1));
        }
        for epigraph in &section.epigraphs {
            units.push(self.epigraph(epigraph, level + 1));
        }
        for image in &section.images {
            units.extend(self.image_block(image, "section_image"));
        }
        if let Some(annotation) = &section.annotation {
            units.push(self.annotation(annotation, level + 1));
        }
        if section.sections.is_empty() {
            let mut drop = self.config.capital_drop;
            for item in &section.content {
                let first_paragraph = drop && matches!(item, FlowItem::Paragraph(_));
                units.extend(self.flow_item(item, level + 1, first_paragraph));
                if first_paragraph {
                    drop = false;
                }
            }
        }
        units
    }

    /// Flow `units` starting at `root` and record the resulting documents.
    /// Only the first document carries the navigation entry.
    fn flow_units(
        &mut self,
        root: NodeId,
        units: Vec<NodeId>,
        kind: DocumentKind,
        title: &str,
        level: usize,
    ) {
        let mut flow = Flow::new(root, self.config.max_document_size, self.estimator);
        flow.extend(&mut self.arena, units, &mut self.diagnostics);
        let roots = flow.finish(&self.arena);
        if roots.len() > 1 {
            log::debug!("`{title}` split into {} documents", roots.len());
        }

        for (i, root) in roots.into_iter().enumerate() {
            if i == 0 {
                self.add_document_with_nav(kind, root, title, level);
            } else {
                self.add_document(kind, root);
            }
        }
    }

    /// Convert a notes or comments body into notes documents.
    pub fn notes_body(&mut self, body: &Body) {
        let root = self.element_with_class(Kind::Container, "notes");
        self.set_lang(root, body.lang.as_deref());

        let mut units = self.body_header(body);
        for section in &body.sections {
            units.push(self.note(section, 1));
        }
        let title = body.title.as_ref().map(|t| t.text()).unwrap_or_default();
        self.flow_units(root, units, DocumentKind::Notes, &title, 1);
    }

    /// One note as a single container, nested notes included.
    fn note(&mut self, section: &Section, level: usize) -> NodeId {
        let block = self.element_with_class(Kind::Container, "note_section");
        self.set_lang(block, section.lang.as_deref());
        self.register_id(block, section.id.as_deref());
        for unit in self.section_units(section, level) {
            self.append(block, unit);
        }
        for subsection in &section.sections {
            let nested = self.note(subsection, level + 1);
            self.append(block, nested);
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::fb2::{FictionBook, Paragraph, Title, TitleLine};
    use crate::ir::Estimator;

    fn section(id: &str, title: &str, paragraphs: &[&str]) -> Section {
        Section {
            id: Some(id.into()),
            title: Some(Title {
                lines: vec![TitleLine::Paragraph(Paragraph::from_text(title))],
            }),
            content: paragraphs
                .iter()
                .map(|p| FlowItem::Paragraph(Paragraph::from_text(*p)))
                .collect(),
            ..Section::default()
        }
    }

    #[test]
    fn test_each_section_starts_a_document() {
        let book = FictionBook::default();
        let config = ConversionConfig::default();
        let mut ctx = Context::new(&book, &config);
        let body = Body {
            sections: vec![
                section("s1", "One", &["a", "b"]),
                section("s2", "Two", &["c"]),
            ],
            ..Body::default()
        };

        ctx.main_body(&body);

        assert_eq!(ctx.structure.len(), 2);
        let first = &ctx.structure.documents()[0];
        assert_eq!(ctx.arena.semantics.id(first.root), Some("s1"));
        assert_eq!(ctx.arena.semantics.class(first.root), Some("section1"));
        assert_eq!(first.nav.as_ref().map(|n| n.title.as_str()), Some("One"));
    }

    #[test]
    fn test_nested_sections_skip_parent_content() {
        let book = FictionBook::default();
        let config = ConversionConfig::default();
        let mut ctx = Context::new(&book, &config);
        let mut parent = section("part", "Part", &["ignored"]);
        parent.sections.push(section("ch", "Chapter", &["kept"]));
        let body = Body {
            sections: vec![parent],
            ..Body::default()
        };

        ctx.main_body(&body);

        let docs = ctx.structure.documents();
        assert_eq!(docs.len(), 2);
        assert!(!ctx.arena.text_content(docs[0].root).contains("ignored"));
        assert_eq!(ctx.arena.semantics.class(docs[1].root), Some("section2"));
        assert_eq!(docs[1].nav.as_ref().map(|n| n.level), Some(2));
    }

    #[test]
    fn test_capital_drop_marks_first_paragraph() {
        let book = FictionBook::default();
        let config = ConversionConfig::default().with_capital_drop(true);
        let mut ctx = Context::new(&book, &config);
        let body = Body {
            sections: vec![section("s", "T", &["first", "second"])],
            ..Body::default()
        };

        ctx.main_body(&body);

        let root = ctx.structure.documents()[0].root;
        let classes: Vec<_> = ctx
            .arena
            .children(root)
            .filter(|&c| ctx.arena.kind(c) == Some(Kind::Paragraph))
            .map(|c| ctx.arena.semantics.class(c))
            .collect();
        assert_eq!(classes, [Some("drop"), None]);
    }

    #[test]
    fn test_long_section_is_paginated() {
        let book = FictionBook::default();
        let config = ConversionConfig::default().with_max_document_size(200);
        let mut ctx = Context::new(&book, &config);
        let text = "x".repeat(60);
        let paragraphs: Vec<&str> = (0..10).map(|_| text.as_str()).collect();
        let body = Body {
            sections: vec![section("s", "T", &paragraphs)],
            ..Body::default()
        };

        ctx.main_body(&body);

        let docs = ctx.structure.documents();
        assert!(docs.len() > 1);
        assert!(docs[0].nav.is_some());
        assert!(docs[1..].iter().all(|d| d.nav.is_none()));
        for doc in docs {
            assert!(ctx.estimator.estimate(&ctx.arena, doc.root) < 200 + 40);
            assert_eq!(ctx.arena.semantics.class(doc.root), Some("section1"));
        }
    }

    #[test]
    fn test_notes_are_units() {
        let book = FictionBook::default();
        let config = ConversionConfig::default();
        let mut ctx = Context::new(&book, &config);
        let body = Body {
            name: Some("notes".into()),
            sections: vec![section("n1", "1", &["note one"]), section("n2", "2", &["two"])],
            ..Body::default()
        };

        ctx.notes_body(&body);

        assert_eq!(ctx.structure.len(), 1);
        let doc = &ctx.structure.documents()[0];
        assert_eq!(doc.kind, DocumentKind::Notes);
        let note = ctx.registry.get("n1").unwrap();
        assert_eq!(ctx.arena.parent(note), Some(doc.root));
        assert_eq!(ctx.arena.semantics.class(note), Some("note_section"));
    }
}
