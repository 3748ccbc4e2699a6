//! Reading FB2 files and converting them into documents.

use std::io::Write;

use fb2epub::config::ConversionConfig;
use fb2epub::convert::Converter;
use fb2epub::diagnostics::Diagnostic;
use fb2epub::error::Error;
use fb2epub::fb2::{FictionBook, FlowItem, read_fb2};
use fb2epub::structure::DocumentKind;

const SAMPLE: &[u8] = include_bytes!("fixtures/sample.fb2");

#[test]
fn test_sample_description() {
    let book = FictionBook::from_bytes(SAMPLE).unwrap();
    let info = &book.description.title_info;

    assert_eq!(info.book_title, "The Sample Voyage");
    assert_eq!(info.genres, ["sf", "adventure"]);
    assert_eq!(info.authors[0].display_name(), "Anna Sample");
    assert_eq!(info.authors[0].file_as().as_deref(), Some("Sample, Anna"));
    assert_eq!(info.coverpage, ["#cover.png"]);
    assert_eq!(info.sequences[0].name, "Voyages");
    assert_eq!(book.lang(), Some("en"));

    let document_info = book.description.document_info.as_ref().unwrap();
    assert_eq!(document_info.id.as_deref(), Some("sample-voyage-0001"));
    let publish_info = book.description.publish_info.as_ref().unwrap();
    assert_eq!(publish_info.publisher.as_deref(), Some("Sample House"));
}

#[test]
fn test_sample_bodies() {
    let book = FictionBook::from_bytes(SAMPLE).unwrap();

    let main = book.main_body().unwrap();
    assert_eq!(main.sections.len(), 2);
    assert_eq!(main.epigraphs.len(), 1);
    let ch2 = &main.sections[1];
    assert!(matches!(ch2.content[0], FlowItem::Subtitle(_)));
    assert!(ch2.content.iter().any(|i| matches!(i, FlowItem::Table(_))));
    assert!(ch2.content.iter().any(|i| matches!(i, FlowItem::Image(_))));

    let notes: Vec<_> = book.notes_bodies().collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].sections[1].id.as_deref(), Some("note2"));

    let cover = book.binary("#cover.png").unwrap();
    assert_eq!(cover.content_type, "image/png");
    assert!(cover.decode().unwrap().starts_with(b"\x89PNG"));
}

#[test]
fn test_windows_1251_input() {
    let xml = r#"<?xml version="1.0" encoding="windows-1251"?>
<FictionBook><description><title-info><book-title>Война и мир</book-title></title-info></description>
<body><section><p>Глава первая</p></section></body></FictionBook>"#;
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(xml);

    let book = FictionBook::from_bytes(&bytes).unwrap();
    assert_eq!(book.description.title_info.book_title, "Война и мир");
}

#[test]
fn test_wrong_root_is_rejected() {
    let result = FictionBook::from_bytes(b"<html><body/></html>");
    assert!(matches!(result, Err(Error::InvalidFb2(_))));
}

#[test]
fn test_book_without_body_is_rejected() {
    let book = FictionBook::from_bytes(b"<FictionBook><description/></FictionBook>").unwrap();
    let result = Converter::new().convert(&book);
    assert!(matches!(result, Err(Error::MissingElement(_))));
}

#[test]
fn test_read_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE).unwrap();

    let book = read_fb2(file.path()).unwrap();
    assert_eq!(book.bodies.len(), 2);
}

#[test]
fn test_sample_document_catalogue() {
    let book = FictionBook::from_bytes(SAMPLE).unwrap();
    let config = ConversionConfig::default().with_fb2_info(true);
    let conversion = Converter::new().with_config(config).convert(&book).unwrap();

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
            DocumentKind::Cover,
            DocumentKind::Annotation,
            DocumentKind::Text,
            DocumentKind::Text,
            DocumentKind::Text,
            DocumentKind::Notes,
            DocumentKind::Info,
            DocumentKind::About,
            DocumentKind::License,
        ]
    );
    let names: Vec<_> = conversion
        .structure
        .iter()
        .map(|(id, _)| conversion.structure.file_name(id))
        .collect();
    assert_eq!(names[3..7], ["section1.xhtml", "section2.xhtml", "section3.xhtml", "notes1.xhtml"]);

    assert_eq!(conversion.metadata.identifier, "sample-voyage-0001");
    assert_eq!(conversion.metadata.cover_image.as_deref(), Some("images/cover.png"));
    assert_eq!(conversion.images.used().count(), 1);
    assert!(conversion.diagnostics.is_empty());
}

#[test]
fn test_missing_image_is_a_diagnostic() {
    let fb2 = br##"<FictionBook xmlns:l="http://www.w3.org/1999/xlink">
  <body><section><p>Text</p><image l:href="#gone.jpg"/></section></body>
</FictionBook>"##;
    let book = FictionBook::from_bytes(fb2).unwrap();
    let conversion = Converter::new().convert(&book).unwrap();

    assert_eq!(
        conversion.diagnostics,
        [Diagnostic::MissingImage {
            href: "#gone.jpg".into()
        }]
    );
    assert_eq!(conversion.images.used().count(), 0);
}
