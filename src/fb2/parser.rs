//! FB2 XML reader.
//!
//! The document is first read into a small element tree (quick-xml event
//! loop), then mapped onto the model. FB2 files are small enough that the
//! intermediate tree costs nothing noticeable, and the mapping code can
//! look at siblings freely.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::*;
use crate::error::{Error, Result};
use crate::util::{decode_text, extract_xml_encoding, strip_bom};

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

#[derive(Debug)]
enum XmlNode {
    Element(Element),
    Text(String),
}

impl Element {
    /// Attribute by local name (`l:href` and `xlink:href` both match `href`).
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn owned_attr(&self, name: &str) -> Option<String> {
        self.attr(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Trimmed text of the whole subtree, or None when blank.
    fn text(&self) -> Option<String> {
        let mut out = String::new();
        self.collect_text(&mut out);
        let trimmed = out.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }

    fn collect_ids(&self, out: &mut Vec<String>) {
        if let Some(id) = self.owned_attr("id") {
            out.push(id);
        }
        for child in self.elements() {
            child.collect_ids(out);
        }
    }

    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(Element::text)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// Parse FB2 bytes into the model.
pub(super) fn parse(bytes: &[u8]) -> Result<FictionBook> {
    let text = decode_text(bytes, extract_xml_encoding(bytes));
    let root = read_tree(strip_bom(&text))?;

    if root.name != "FictionBook" {
        return Err(Error::InvalidFb2(format!(
            "root element is <{}>, expected <FictionBook>",
            root.name
        )));
    }

    let description = root
        .child("description")
        .map(description)
        .unwrap_or_default();
    let bodies = root.children_named("body").map(body).collect();
    let binaries = root.children_named("binary").filter_map(binary).collect();
    let mut ids = Vec::new();
    for el in root.elements().filter(|e| e.name != "binary") {
        el.collect_ids(&mut ids);
    }

    Ok(FictionBook {
        description,
        bodies,
        binaries,
        ids,
    })
}

fn read_tree(content: &str) -> Result<Element> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_element(&e)?),
            Event::Empty(e) => {
                let element = start_element(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => return Ok(element),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(Error::InvalidFb2("unbalanced end tag".into()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => return Ok(element),
                }
            }
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(top) = stack.last_mut()
                    && let Some(resolved) = resolve_entity(&entity)
                {
                    top.push_text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::MissingElement("FictionBook".into()))
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
        let value = unescape(&String::from_utf8_lossy(&attr.value));
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

/// Extract local name from namespaced XML name (e.g., "l:href" -> "href").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Replace entity references in an attribute value.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').and_then(|semi| {
            resolve_entity(&after[..semi]).map(|resolved| (semi, resolved))
        }) {
            Some((semi, resolved)) => {
                out.push_str(&resolved);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Description
// ============================================================================

fn description(el: &Element) -> Description {
    Description {
        title_info: el.child("title-info").map(title_info).unwrap_or_default(),
        document_info: el.child("document-info").map(document_info),
        publish_info: el.child("publish-info").map(publish_info),
    }
}

fn title_info(el: &Element) -> TitleInfo {
    TitleInfo {
        genres: el.children_named("genre").filter_map(Element::text).collect(),
        authors: el.children_named("author").map(author).collect(),
        book_title: el.child_text("book-title").unwrap_or_default(),
        annotation: el.child("annotation").map(annotation),
        keywords: el.child_text("keywords"),
        date: el.child("date").and_then(date),
        coverpage: el
            .child("coverpage")
            .map(|c| {
                c.children_named("image")
                    .filter_map(|i| i.owned_attr("href"))
                    .collect()
            })
            .unwrap_or_default(),
        lang: el.child_text("lang"),
        src_lang: el.child_text("src-lang"),
        translators: el.children_named("translator").map(author).collect(),
        sequences: el.children_named("sequence").filter_map(sequence).collect(),
    }
}

fn author(el: &Element) -> Author {
    Author {
        first_name: el.child_text("first-name"),
        middle_name: el.child_text("middle-name"),
        last_name: el.child_text("last-name"),
        nickname: el.child_text("nickname"),
        email: el.child_text("email"),
    }
}

/// Human-readable date, falling back to the machine `value` attribute.
fn date(el: &Element) -> Option<String> {
    el.text().or_else(|| el.owned_attr("value"))
}

fn sequence(el: &Element) -> Option<Sequence> {
    Some(Sequence {
        name: el.owned_attr("name")?,
        number: el.owned_attr("number"),
    })
}

fn document_info(el: &Element) -> DocumentInfo {
    DocumentInfo {
        authors: el.children_named("author").map(author).collect(),
        program_used: el.child_text("program-used"),
        date: el.child("date").and_then(date),
        src_urls: el.children_named("src-url").filter_map(Element::text).collect(),
        src_ocr: el.child_text("src-ocr"),
        id: el.child_text("id"),
        version: el.child_text("version"),
    }
}

fn publish_info(el: &Element) -> PublishInfo {
    PublishInfo {
        book_name: el.child_text("book-name"),
        publisher: el.child_text("publisher"),
        city: el.child_text("city"),
        year: el.child_text("year"),
        isbn: el.child_text("isbn"),
    }
}

// ============================================================================
// Body
// ============================================================================

fn body(el: &Element) -> Body {
    Body {
        name: el.owned_attr("name"),
        lang: el.owned_attr("lang"),
        image: el.child("image").map(image),
        title: el.child("title").map(title),
        epigraphs: el.children_named("epigraph").map(epigraph).collect(),
        sections: el.children_named("section").map(section).collect(),
    }
}

fn section(el: &Element) -> Section {
    let mut section = Section {
        id: el.owned_attr("id"),
        lang: el.owned_attr("lang"),
        ..Section::default()
    };

    // Images directly after the header belong to the section header.
    let mut in_header = true;
    for child in el.elements() {
        match child.name.as_str() {
            "title" => section.title = Some(title(child)),
            "epigraph" => section.epigraphs.push(epigraph(child)),
            "image" if in_header => section.images.push(image(child)),
            "annotation" => {
                section.annotation = Some(annotation(child));
                in_header = false;
            }
            "section" => {
                section.sections.push(self::section(child));
                in_header = false;
            }
            _ => {
                if let Some(item) = flow_item(child) {
                    section.content.push(item);
                    in_header = false;
                }
            }
        }
    }
    section
}

fn flow_item(el: &Element) -> Option<FlowItem> {
    Some(match el.name.as_str() {
        "p" => FlowItem::Paragraph(paragraph(el)),
        "subtitle" => FlowItem::Subtitle(paragraph(el)),
        "empty-line" => FlowItem::EmptyLine,
        "poem" => FlowItem::Poem(poem(el)),
        "cite" => FlowItem::Cite(cite(el)),
        "table" => FlowItem::Table(table(el)),
        "image" => FlowItem::Image(image(el)),
        _ => return None,
    })
}

fn flow_items(el: &Element) -> Vec<FlowItem> {
    el.elements().filter_map(flow_item).collect()
}

fn title(el: &Element) -> Title {
    Title {
        lines: el
            .elements()
            .filter_map(|child| match child.name.as_str() {
                "p" => Some(TitleLine::Paragraph(paragraph(child))),
                "empty-line" => Some(TitleLine::EmptyLine),
                _ => None,
            })
            .collect(),
    }
}

fn epigraph(el: &Element) -> Epigraph {
    Epigraph {
        id: el.owned_attr("id"),
        content: flow_items(el),
        text_authors: el.children_named("text-author").map(paragraph).collect(),
    }
}

fn annotation(el: &Element) -> Annotation {
    Annotation {
        id: el.owned_attr("id"),
        lang: el.owned_attr("lang"),
        content: flow_items(el),
    }
}

fn poem(el: &Element) -> Poem {
    Poem {
        id: el.owned_attr("id"),
        lang: el.owned_attr("lang"),
        title: el.child("title").map(title),
        epigraphs: el.children_named("epigraph").map(epigraph).collect(),
        stanzas: el.children_named("stanza").map(stanza).collect(),
        text_authors: el.children_named("text-author").map(paragraph).collect(),
        date: el.child("date").and_then(date),
    }
}

fn stanza(el: &Element) -> Stanza {
    Stanza {
        title: el.child("title").map(title),
        subtitle: el.child("subtitle").map(paragraph),
        verses: el.children_named("v").map(paragraph).collect(),
    }
}

fn cite(el: &Element) -> Cite {
    Cite {
        id: el.owned_attr("id"),
        lang: el.owned_attr("lang"),
        content: flow_items(el),
        text_authors: el.children_named("text-author").map(paragraph).collect(),
    }
}

fn table(el: &Element) -> Table {
    Table {
        id: el.owned_attr("id"),
        style: el.owned_attr("style"),
        rows: el
            .children_named("tr")
            .map(|tr| TableRow {
                align: tr.owned_attr("align"),
                cells: tr
                    .elements()
                    .filter(|c| c.name == "td" || c.name == "th")
                    .map(table_cell)
                    .collect(),
            })
            .collect(),
    }
}

fn table_cell(el: &Element) -> TableCell {
    let span = |name: &str| {
        el.attr(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1)
    };
    TableCell {
        header: el.name == "th",
        id: el.owned_attr("id"),
        colspan: span("colspan"),
        rowspan: span("rowspan"),
        align: el.owned_attr("align"),
        content: inlines(el),
    }
}

fn image(el: &Element) -> Image {
    Image {
        id: el.owned_attr("id"),
        href: el.owned_attr("href").unwrap_or_default(),
        alt: el.owned_attr("alt"),
        title: el.owned_attr("title"),
    }
}

fn binary(el: &Element) -> Option<Binary> {
    Some(Binary {
        id: el.owned_attr("id")?,
        content_type: el.owned_attr("content-type").unwrap_or_default(),
        base64: el.text().unwrap_or_default(),
    })
}

// ============================================================================
// Inline content
// ============================================================================

fn paragraph(el: &Element) -> Paragraph {
    Paragraph {
        id: el.owned_attr("id"),
        style: el.owned_attr("style"),
        lang: el.owned_attr("lang"),
        content: inlines(el),
    }
}

fn inlines(el: &Element) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in &el.children {
        match child {
            XmlNode::Text(text) => out.push(Inline::Text(text.clone())),
            XmlNode::Element(e) => inline(e, &mut out),
        }
    }
    out
}

fn inline(el: &Element, out: &mut Vec<Inline>) {
    let item = match el.name.as_str() {
        "strong" => Inline::Strong(inlines(el)),
        "emphasis" => Inline::Emphasis(inlines(el)),
        "strikethrough" => Inline::Strikethrough(inlines(el)),
        "sub" => Inline::Sub(inlines(el)),
        "sup" => Inline::Sup(inlines(el)),
        "code" => Inline::Code(inlines(el)),
        "style" => Inline::Style {
            name: el.owned_attr("name"),
            content: inlines(el),
        },
        "a" => Inline::Link {
            href: el.owned_attr("href").unwrap_or_default(),
            kind: el.owned_attr("type"),
            content: inlines(el),
        },
        "image" => Inline::Image(image(el)),
        // Unknown markup: keep the text.
        _ => {
            out.extend(inlines(el));
            return;
        }
    };
    out.push(item);
}
