//! Link remapping over a whole converted book.

use fb2epub::config::{ConversionConfig, NoteStrategy};
use fb2epub::convert::{Conversion, Converter};
use fb2epub::diagnostics::Diagnostic;
use fb2epub::export::render_document;
use fb2epub::fb2::FictionBook;
use fb2epub::ir::{Kind, NodeId};
use fb2epub::refs::BACK_LINK_CLASS;
use fb2epub::structure::{DocumentId, DocumentKind};

const SAMPLE: &[u8] = include_bytes!("fixtures/sample.fb2");

fn convert(config: ConversionConfig) -> Conversion {
    let book = FictionBook::from_bytes(SAMPLE).unwrap();
    Converter::new().with_config(config).convert(&book).unwrap()
}

/// Document whose root carries `id`.
fn document_with_id(conversion: &Conversion, id: &str) -> DocumentId {
    conversion
        .structure
        .iter()
        .find(|(_, d)| conversion.arena.semantics.id(d.root) == Some(id))
        .map(|(id, _)| id)
        .unwrap()
}

fn notes_document(conversion: &Conversion) -> DocumentId {
    conversion
        .structure
        .iter()
        .find(|(_, d)| d.kind == DocumentKind::Notes)
        .map(|(id, _)| id)
        .unwrap()
}

fn anchors(conversion: &Conversion, document: DocumentId) -> Vec<NodeId> {
    let arena = &conversion.arena;
    let root = conversion.structure.get(document).unwrap().root;
    arena
        .iter_dfs(root)
        .filter(|&n| arena.kind(n) == Some(Kind::Anchor))
        .collect()
}

fn href(conversion: &Conversion, anchor: NodeId) -> Option<&str> {
    conversion.arena.semantics.href(anchor)
}

#[test]
fn test_back_links_point_both_ways() {
    let conversion = convert(
        ConversionConfig::default()
            .with_notes(NoteStrategy::BackLinks)
            .with_skip_about_page(true),
    );
    let arena = &conversion.arena;
    let ch1 = document_with_id(&conversion, "ch1");
    let ch2 = document_with_id(&conversion, "ch2");
    let notes = notes_document(&conversion);
    let ch1_file = conversion.structure.file_name(ch1).to_string();
    let ch2_file = conversion.structure.file_name(ch2).to_string();
    let notes_file = conversion.structure.file_name(notes).to_string();

    let ch1_anchors = anchors(&conversion, ch1);
    assert_eq!(ch1_anchors.len(), 3);
    let note_ref = ch1_anchors[0];
    assert_eq!(
        href(&conversion, note_ref),
        Some(format!("{notes_file}#note1").as_str())
    );
    assert_eq!(
        href(&conversion, ch1_anchors[1]),
        Some(format!("{ch2_file}#ch2").as_str())
    );
    assert_eq!(
        href(&conversion, ch1_anchors[2]),
        Some("https://example.com/voyage")
    );

    let ch2_anchors = anchors(&conversion, ch2);
    let back_links: Vec<_> = anchors(&conversion, notes)
        .into_iter()
        .filter(|&a| arena.semantics.class(a) == Some(BACK_LINK_CLASS))
        .collect();
    let labels: Vec<_> = back_links.iter().map(|&a| arena.text_content(a)).collect();
    assert_eq!(labels, ["(<< back 1)", "(<< back 2)", "(<< back)"]);

    let first_id = arena.semantics.id(note_ref).unwrap();
    let second_id = arena.semantics.id(ch2_anchors[0]).unwrap();
    let third_id = arena.semantics.id(ch2_anchors[1]).unwrap();
    assert_eq!(
        href(&conversion, back_links[0]),
        Some(format!("{ch1_file}#{first_id}").as_str())
    );
    assert_eq!(
        href(&conversion, back_links[1]),
        Some(format!("{ch2_file}#{second_id}").as_str())
    );
    assert_eq!(
        href(&conversion, back_links[2]),
        Some(format!("{ch2_file}#{third_id}").as_str())
    );

    // The back-links live inside the note they belong to.
    let note1 = arena.parent(back_links[0]).unwrap();
    assert_eq!(arena.semantics.id(note1), Some("note1"));
    assert!(conversion.diagnostics.is_empty());
}

#[test]
fn test_footnotes_are_embedded_per_document() {
    let conversion = convert(ConversionConfig::default());
    let arena = &conversion.arena;
    let ch1 = document_with_id(&conversion, "ch1");
    let ch2 = document_with_id(&conversion, "ch2");

    let embedded = |id: DocumentId| -> Vec<String> {
        conversion
            .structure
            .get(id)
            .unwrap()
            .footnotes()
            .map(|n| n.id.to_string())
            .collect()
    };
    assert_eq!(embedded(ch1), ["note1"]);
    assert_eq!(embedded(ch2), ["note1", "note2"]);

    for anchor in anchors(&conversion, ch2) {
        assert!(href(&conversion, anchor).unwrap().starts_with('#'));
        assert_eq!(arena.semantics.epub_type(anchor), Some("noteref"));
    }

    let xhtml = render_document(&conversion, ch2).unwrap();
    assert!(xhtml.contains("<aside epub:type=\"footnote\" id=\"note1\" class=\"footnote\">"));
    assert!(xhtml.contains("The island had no name."));
    // The id now belongs to the asides, not to the notes document.
    let notes = render_document(&conversion, notes_document(&conversion)).unwrap();
    assert!(!notes.contains("id=\"note1\""));
}

#[test]
fn test_unknown_target_leaves_plain_anchor() {
    let fb2 = br##"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns:l="http://www.w3.org/1999/xlink">
  <body>
    <section id="s1"><p>Go <a l:href="#nowhere">there</a>.</p></section>
  </body>
</FictionBook>"##;
    let book = FictionBook::from_bytes(fb2).unwrap();
    let conversion = Converter::new().convert(&book).unwrap();
    let s1 = document_with_id(&conversion, "s1");

    let anchor = anchors(&conversion, s1)[0];
    assert_eq!(href(&conversion, anchor), None);
    assert_eq!(
        conversion.diagnostics,
        [Diagnostic::UnknownTarget {
            id: "nowhere".into(),
            anchors: 1
        }]
    );
    let xhtml = render_document(&conversion, s1).unwrap();
    assert!(xhtml.contains("<a>there</a>"));
}

#[test]
fn test_links_follow_split_sections() {
    let mut fb2 = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns:l="http://www.w3.org/1999/xlink"><body><section id="long">"#,
    );
    for i in 0..40 {
        fb2.push_str(&format!("<p id=\"p{i}\">Paragraph number {i} of a long chapter.</p>"));
    }
    fb2.push_str(r##"</section><section id="end"><p><a l:href="#p39">last</a></p></section></body></FictionBook>"##);

    let book = FictionBook::from_bytes(fb2.as_bytes()).unwrap();
    let config = ConversionConfig::default()
        .with_max_document_size(512)
        .with_skip_about_page(true);
    let conversion = Converter::new().with_config(config).convert(&book).unwrap();

    let text_documents = conversion
        .structure
        .documents()
        .iter()
        .filter(|d| d.kind == DocumentKind::Text)
        .count();
    assert!(text_documents > 3);

    let end = document_with_id(&conversion, "end");
    let anchor = anchors(&conversion, end)[0];
    let target = href(&conversion, anchor).unwrap();
    let (file, fragment) = target.split_once('#').unwrap();
    assert_eq!(fragment, "p39");
    assert_ne!(file, conversion.structure.file_name(end));

    let holder = conversion
        .structure
        .iter()
        .find(|(id, _)| conversion.structure.file_name(*id) == file)
        .map(|(id, _)| id)
        .unwrap();
    let xhtml = render_document(&conversion, holder).unwrap();
    assert!(xhtml.contains("id=\"p39\""));
}

#[test]
fn test_source_id_shaped_like_anchor_id_keeps_its_links() {
    let fb2 = br##"<FictionBook xmlns:l="http://www.w3.org/1999/xlink"><body>
  <section id="a"><p>Back to <a l:href="#a">start</a>, on to <a l:href="#lnk1">next</a>.</p></section>
  <section id="lnk1"><p>Next chapter.</p></section>
</body></FictionBook>"##;
    let book = FictionBook::from_bytes(fb2).unwrap();
    let config = ConversionConfig::default()
        .with_notes(NoteStrategy::BackLinks)
        .with_skip_about_page(true);
    let conversion = Converter::new().with_config(config).convert(&book).unwrap();
    assert!(conversion.diagnostics.is_empty());

    let first = document_with_id(&conversion, "a");
    let next = document_with_id(&conversion, "lnk1");
    let next_file = conversion.structure.file_name(next).to_string();

    let links = anchors(&conversion, first);
    assert_eq!(links.len(), 2);
    for &anchor in &links {
        assert_ne!(conversion.arena.semantics.id(anchor), Some("lnk1"));
    }
    assert_eq!(
        href(&conversion, links[1]),
        Some(format!("{next_file}#lnk1").as_str())
    );
}
