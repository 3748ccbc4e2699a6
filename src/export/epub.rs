//! EPUB exporter.
//!
//! Packages a [`Conversion`] as an EPUB 3 file with an EPUB 2 `toc.ncx`
//! for older readers.

use std::io::{Seek, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::Exporter;
use super::xhtml::{STYLESHEET, STYLESHEET_FILE, escape_xml, render_document};
use crate::convert::{BookMetadata, Conversion};
use crate::error::Result;

/// Configuration for EPUB export.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
    /// `dcterms:modified` timestamp. Derived from the book date when unset.
    pub modified: Option<String>,
}

/// EPUB format exporter.
///
/// # Example
///
/// ```no_run
/// use fb2epub::convert::Converter;
/// use fb2epub::export::{EpubExporter, Exporter};
/// use fb2epub::fb2::read_fb2;
/// use std::fs::File;
///
/// let book = read_fb2("input.fb2")?;
/// let conversion = Converter::new().convert(&book)?;
/// let mut file = File::create("output.epub")?;
/// EpubExporter::new().export(&conversion, &mut file)?;
/// # Ok::<(), fb2epub::error::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EpubExporter {
    config: EpubConfig,
}

impl EpubExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }
}

struct ManifestItem {
    id: String,
    href: String,
    media_type: &'static str,
    properties: Option<&'static str>,
}

struct SpineItem {
    idref: String,
    linear: bool,
}

/// Navigation point with resolved href.
#[derive(Debug, Clone, PartialEq)]
struct NavPoint {
    title: String,
    href: String,
    children: Vec<NavPoint>,
}

impl Exporter for EpubExporter {
    fn export<W: Write + Seek>(&self, conversion: &Conversion, writer: &mut W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        let compression_level = self.config.compression_level.unwrap_or(6);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64));

        // 1. mimetype (must be first, uncompressed)
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        // 2. container.xml
        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        // 3. manifest and spine
        let mut manifest = vec![
            ManifestItem {
                id: "nav".to_string(),
                href: "nav.xhtml".to_string(),
                media_type: "application/xhtml+xml",
                properties: Some("nav"),
            },
            ManifestItem {
                id: "stylesheet".to_string(),
                href: STYLESHEET_FILE.to_string(),
                media_type: "text/css",
                properties: None,
            },
        ];
        let mut spine = Vec::new();
        for (id, document) in conversion.structure.iter() {
            let item_id = format!("doc{}", id.index() + 1);
            manifest.push(ManifestItem {
                id: item_id.clone(),
                href: conversion.structure.file_name(id).to_string(),
                media_type: "application/xhtml+xml",
                properties: None,
            });
            spine.push(SpineItem {
                idref: item_id,
                linear: document.kind.is_linear(),
            });
        }
        let cover = conversion.metadata.cover_image.as_deref();
        for (i, image) in conversion.images.used().enumerate() {
            let properties = (cover == Some(image.path().as_str())).then_some("cover-image");
            manifest.push(ManifestItem {
                id: format!("img{}", i + 1),
                href: image.href(),
                media_type: image.media_type(),
                properties,
            });
        }

        let modified = self
            .config
            .modified
            .clone()
            .unwrap_or_else(|| modified_from(&conversion.metadata));

        // 4. content.opf
        let opf = generate_opf(&conversion.metadata, &modified, &manifest, &spine);
        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(opf.as_bytes())?;

        // 5. navigation
        let nav = nav_points(conversion);
        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(generate_nav(&conversion.metadata, &nav).as_bytes())?;
        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(generate_ncx(&conversion.metadata, &nav).as_bytes())?;

        // 6. stylesheet
        zip.start_file(format!("OEBPS/{STYLESHEET_FILE}"), deflated)?;
        zip.write_all(STYLESHEET.as_bytes())?;

        // 7. documents
        for (id, _) in conversion.structure.iter() {
            let Some(content) = render_document(conversion, id) else {
                continue;
            };
            let path = format!("OEBPS/{}", conversion.structure.file_name(id));
            zip.start_file(path, deflated)?;
            zip.write_all(content.as_bytes())?;
        }

        // 8. images referenced by the documents
        for image in conversion.images.used() {
            zip.start_file(format!("OEBPS/{}", image.path()), deflated)?;
            zip.write_all(&image.data)?;
        }

        zip.finish()?;
        log::info!(
            "wrote EPUB with {} documents and {} images",
            conversion.structure.len(),
            conversion.images.used().count()
        );
        Ok(())
    }
}

/// Container.xml template.
const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

fn modified_from(metadata: &BookMetadata) -> String {
    match metadata.date.as_deref() {
        Some(date) if is_iso_date(date) => format!("{date}T00:00:00Z"),
        _ => "2024-01-01T00:00:00Z".to_string(),
    }
}

fn is_iso_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Generate content.opf from metadata and manifest.
fn generate_opf(
    metadata: &BookMetadata,
    modified: &str,
    manifest: &[ManifestItem],
    spine: &[SpineItem],
) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );

    let title = if metadata.title.is_empty() {
        "Untitled"
    } else {
        &metadata.title
    };
    opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape_xml(title)));

    let mut next_id = 1;
    for author in &metadata.authors {
        let creator_id = format!("creator{next_id}");
        next_id += 1;
        opf.push_str(&format!(
            "    <dc:creator id=\"{creator_id}\">{}</dc:creator>\n",
            escape_xml(&author.name)
        ));
        opf.push_str(&format!(
            "    <meta refines=\"#{creator_id}\" property=\"role\" scheme=\"marc:relators\">aut</meta>\n"
        ));
        if let Some(file_as) = &author.file_as {
            opf.push_str(&format!(
                "    <meta refines=\"#{creator_id}\" property=\"file-as\">{}</meta>\n",
                escape_xml(file_as)
            ));
        }
    }
    for translator in &metadata.translators {
        let contrib_id = format!("contrib{next_id}");
        next_id += 1;
        opf.push_str(&format!(
            "    <dc:contributor id=\"{contrib_id}\">{}</dc:contributor>\n",
            escape_xml(&translator.name)
        ));
        opf.push_str(&format!(
            "    <meta refines=\"#{contrib_id}\" property=\"role\" scheme=\"marc:relators\">trl</meta>\n"
        ));
    }

    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&metadata.language)
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&metadata.identifier)
    ));
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(modified)
    ));

    if let Some(series) = &metadata.series {
        opf.push_str(&format!(
            "    <meta property=\"belongs-to-collection\" id=\"collection{next_id}\">{}</meta>\n",
            escape_xml(&series.name)
        ));
        opf.push_str(&format!(
            "    <meta refines=\"#collection{next_id}\" property=\"collection-type\">series</meta>\n"
        ));
        if let Some(index) = &series.index {
            opf.push_str(&format!(
                "    <meta refines=\"#collection{next_id}\" property=\"group-position\">{}</meta>\n",
                escape_xml(index)
            ));
        }
    }

    if let Some(publisher) = &metadata.publisher {
        opf.push_str(&format!(
            "    <dc:publisher>{}</dc:publisher>\n",
            escape_xml(publisher)
        ));
    }
    if let Some(description) = &metadata.description {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_xml(description)
        ));
    }
    for subject in &metadata.subjects {
        opf.push_str(&format!(
            "    <dc:subject>{}</dc:subject>\n",
            escape_xml(subject)
        ));
    }
    if let Some(date) = &metadata.date {
        opf.push_str(&format!("    <dc:date>{}</dc:date>\n", escape_xml(date)));
    }
    // EPUB 2 readers look for the cover here.
    if let Some(item) = manifest
        .iter()
        .find(|item| item.properties == Some("cover-image"))
    {
        opf.push_str(&format!(
            "    <meta name=\"cover\" content=\"{}\"/>\n",
            escape_xml(&item.id)
        ));
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    for item in manifest {
        let properties = item
            .properties
            .map(|p| format!(" properties=\"{p}\""))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
            escape_xml(&item.id),
            escape_xml(&item.href),
            item.media_type
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    for item in spine {
        let linear = if item.linear { "" } else { " linear=\"no\"" };
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"{linear}/>\n",
            escape_xml(&item.idref)
        ));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// Navigation tree from the documents' nav entries.
fn nav_points(conversion: &Conversion) -> Vec<NavPoint> {
    let flat: Vec<(usize, NavPoint)> = conversion
        .structure
        .iter()
        .filter_map(|(id, document)| {
            let nav = document.nav.as_ref()?;
            Some((
                nav.level,
                NavPoint {
                    title: nav.title.clone(),
                    href: conversion.structure.file_name(id).to_string(),
                    children: Vec::new(),
                },
            ))
        })
        .collect();
    nest(&flat)
}

/// Entries following an entry with a deeper level become its children.
fn nest(flat: &[(usize, NavPoint)]) -> Vec<NavPoint> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < flat.len() {
        let level = flat[i].0;
        let end = flat[i + 1..]
            .iter()
            .position(|(l, _)| *l <= level)
            .map_or(flat.len(), |p| i + 1 + p);
        let mut point = flat[i].1.clone();
        point.children = nest(&flat[i + 1..end]);
        out.push(point);
        i = end;
    }
    out
}

fn depth(points: &[NavPoint]) -> usize {
    points
        .iter()
        .map(|p| 1 + depth(&p.children))
        .max()
        .unwrap_or(0)
}

/// Generate the EPUB 3 navigation document.
fn generate_nav(metadata: &BookMetadata, points: &[NavPoint]) -> String {
    let mut nav = String::new();
    nav.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{0}" lang="{0}">
<head>
  <title>{1}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>{1}</h1>
"#,
        escape_xml(&metadata.language),
        escape_xml(&metadata.title)
    ));
    write_nav_list(&mut nav, points, 2);
    nav.push_str("  </nav>\n</body>\n</html>\n");
    nav
}

fn write_nav_list(nav: &mut String, points: &[NavPoint], indent: usize) {
    if points.is_empty() {
        return;
    }
    let indent_str = "  ".repeat(indent);
    nav.push_str(&format!("{indent_str}<ol>\n"));
    for point in points {
        nav.push_str(&format!(
            "{indent_str}  <li><a href=\"{}\">{}</a>",
            escape_xml(&point.href),
            escape_xml(&point.title)
        ));
        if !point.children.is_empty() {
            nav.push('\n');
            write_nav_list(nav, &point.children, indent + 2);
            nav.push_str(&format!("{indent_str}  "));
        }
        nav.push_str("</li>\n");
    }
    nav.push_str(&format!("{indent_str}</ol>\n"));
}

/// Generate toc.ncx from the navigation tree.
fn generate_ncx(metadata: &BookMetadata, points: &[NavPoint]) -> String {
    let mut ncx = String::new();

    ncx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
"#,
        escape_xml(&metadata.identifier),
        depth(points).max(1),
        escape_xml(&metadata.title)
    ));

    let mut play_order = 1;
    write_nav_points(&mut ncx, points, &mut play_order, 2);

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Recursively write navPoint elements.
fn write_nav_points(ncx: &mut String, points: &[NavPoint], play_order: &mut usize, indent: usize) {
    let indent_str = "  ".repeat(indent);

    for point in points {
        ncx.push_str(&format!(
            "{indent_str}<navPoint id=\"navPoint-{play_order}\" playOrder=\"{play_order}\">\n"
        ));
        ncx.push_str(&format!(
            "{indent_str}  <navLabel><text>{}</text></navLabel>\n",
            escape_xml(&point.title)
        ));
        ncx.push_str(&format!(
            "{indent_str}  <content src=\"{}\"/>\n",
            escape_xml(&point.href)
        ));

        *play_order += 1;

        if !point.children.is_empty() {
            write_nav_points(ncx, &point.children, play_order, indent + 1);
        }

        ncx.push_str(&format!("{indent_str}</navPoint>\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(title: &str) -> NavPoint {
        NavPoint {
            title: title.to_string(),
            href: format!("{title}.xhtml"),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_nest_levels() {
        let flat = vec![
            (1, point("a")),
            (2, point("a1")),
            (3, point("a1x")),
            (2, point("a2")),
            (1, point("b")),
        ];
        let tree = nest(&flat);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].title, "a1x");
        assert!(tree[1].children.is_empty());
        assert_eq!(depth(&tree), 3);
    }

    #[test]
    fn test_nest_starting_deep() {
        let flat = vec![(2, point("deep")), (1, point("top"))];
        let tree = nest(&flat);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_modified_from_date() {
        let metadata = BookMetadata {
            date: Some("2009-05-01".into()),
            ..BookMetadata::default()
        };
        assert_eq!(modified_from(&metadata), "2009-05-01T00:00:00Z");
        let metadata = BookMetadata {
            date: Some("2009".into()),
            ..BookMetadata::default()
        };
        assert_eq!(modified_from(&metadata), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_opf_marks_non_linear_and_cover() {
        let metadata = BookMetadata {
            title: "T & U".into(),
            language: "en".into(),
            identifier: "id1".into(),
            ..BookMetadata::default()
        };
        let manifest = [ManifestItem {
            id: "img1".into(),
            href: "images/c.jpg".into(),
            media_type: "image/jpeg",
            properties: Some("cover-image"),
        }];
        let spine = [
            SpineItem {
                idref: "doc1".into(),
                linear: true,
            },
            SpineItem {
                idref: "doc2".into(),
                linear: false,
            },
        ];
        let opf = generate_opf(&metadata, "2024-01-01T00:00:00Z", &manifest, &spine);

        assert!(opf.contains("<dc:title>T &amp; U</dc:title>"));
        assert!(opf.contains("properties=\"cover-image\""));
        assert!(opf.contains("<meta name=\"cover\" content=\"img1\"/>"));
        assert!(opf.contains("<itemref idref=\"doc1\"/>"));
        assert!(opf.contains("<itemref idref=\"doc2\" linear=\"no\"/>"));
    }
}
