//! Decoded FB2 binaries and their use by the converted book.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::fb2::Binary;
use crate::util::{MediaFormat, detect_media_format};

/// Directory (inside the package content directory) holding images.
pub const IMAGE_DIR: &str = "images";

/// Characters escaped in image `src` attributes.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Binary id from the source.
    pub id: String,
    /// File name inside [`IMAGE_DIR`].
    pub file_name: String,
    pub format: MediaFormat,
    pub data: Vec<u8>,
    used: bool,
}

impl StoredImage {
    pub fn media_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Path relative to the package content directory.
    pub fn path(&self) -> String {
        format!("{IMAGE_DIR}/{}", self.file_name)
    }

    /// [`path`](Self::path), percent-encoded for use in `src` and `href`.
    pub fn href(&self) -> String {
        format!(
            "{IMAGE_DIR}/{}",
            utf8_percent_encode(&self.file_name, PATH_SEGMENT)
        )
    }
}

/// All images of a book, tracking which ones the documents reference.
#[derive(Debug, Default, Clone)]
pub struct ImageStore {
    images: Vec<StoredImage>,
    by_id: HashMap<String, usize>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every binary; undecodable ones are reported and skipped.
    pub fn from_binaries(binaries: &[Binary], diagnostics: &mut Diagnostics) -> Self {
        let mut store = Self::new();
        for binary in binaries {
            match binary.decode() {
                Ok(data) => store.insert(&binary.id, &binary.content_type, data),
                Err(err) => diagnostics.record(Diagnostic::InvalidBinary {
                    id: binary.id.clone(),
                    reason: err.to_string(),
                }),
            }
        }
        store
    }

    /// Add an image. A repeated id keeps the first image.
    pub fn insert(&mut self, id: &str, content_type: &str, data: Vec<u8>) {
        if self.by_id.contains_key(id) {
            return;
        }
        let format = detect_media_format(content_type, &data);
        let file_name = file_name_for(id, format);
        self.by_id.insert(id.to_string(), self.images.len());
        self.images.push(StoredImage {
            id: id.to_string(),
            file_name,
            format,
            data,
            used: false,
        });
    }

    /// Whether `href` (`#id` or `id`) names a decoded image.
    pub fn contains(&self, href: &str) -> bool {
        self.by_id.contains_key(strip_hash(href))
    }

    pub fn get(&self, href: &str) -> Option<&StoredImage> {
        self.by_id.get(strip_hash(href)).map(|&i| &self.images[i])
    }

    /// Mark the image used and return its percent-encoded `src` relative to
    /// the documents. Unknown hrefs are reported and yield None.
    pub fn use_image(&mut self, href: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        let Some(&index) = self.by_id.get(strip_hash(href)) else {
            diagnostics.record(Diagnostic::MissingImage {
                href: href.to_string(),
            });
            return None;
        };
        let image = &mut self.images[index];
        image.used = true;
        Some(image.href())
    }

    /// Images referenced by at least one document, in source order.
    pub fn used(&self) -> impl Iterator<Item = &StoredImage> {
        self.images.iter().filter(|i| i.used)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredImage> {
        self.images.iter()
    }
}

fn strip_hash(href: &str) -> &str {
    let href = href.trim();
    href.strip_prefix('#').unwrap_or(href)
}

/// Keep the binary id as file name; add the format's extension unless the
/// id already ends with a matching one.
fn file_name_for(id: &str, format: MediaFormat) -> String {
    let name: String = id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let lower = name.to_ascii_lowercase();
    let has_extension = match format {
        MediaFormat::Jpeg => lower.ends_with(".jpg") || lower.ends_with(".jpeg"),
        other => lower.ends_with(&format!(".{}", other.extension())),
    };
    if has_extension {
        name
    } else {
        format!("{name}.{}", format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A];

    #[test]
    fn test_file_names() {
        assert_eq!(file_name_for("cover.jpg", MediaFormat::Jpeg), "cover.jpg");
        assert_eq!(file_name_for("pic1", MediaFormat::Png), "pic1.png");
        assert_eq!(file_name_for("a/b", MediaFormat::Gif), "a_b.gif");
    }

    #[test]
    fn test_use_marks_and_encodes() {
        let mut diagnostics = Diagnostics::new();
        let mut store = ImageStore::new();
        store.insert("my pic", "image/png", PNG.to_vec());
        store.insert("unused", "", PNG.to_vec());

        let src = store.use_image("#my pic", &mut diagnostics);
        assert_eq!(src.as_deref(), Some("images/my%20pic.png"));
        let used: Vec<_> = store.used().map(|i| i.id.as_str()).collect();
        assert_eq!(used, ["my pic"]);
        let image = store.get("my pic").unwrap();
        assert_eq!(image.path(), "images/my pic.png");
        assert_eq!(image.href(), "images/my%20pic.png");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_image_is_reported() {
        let mut diagnostics = Diagnostics::new();
        let mut store = ImageStore::new();
        assert_eq!(store.use_image("#nope", &mut diagnostics), None);
        assert_eq!(
            diagnostics.entries(),
            &[Diagnostic::MissingImage {
                href: "#nope".into()
            }]
        );
    }

    #[test]
    fn test_invalid_binary_is_reported() {
        let mut diagnostics = Diagnostics::new();
        let binaries = [Binary {
            id: "bad".into(),
            content_type: "image/png".into(),
            base64: "!!!".into(),
        }];
        let store = ImageStore::from_binaries(&binaries, &mut diagnostics);
        assert!(store.is_empty());
        assert!(matches!(
            diagnostics.entries(),
            [Diagnostic::InvalidBinary { id, .. }] if id == "bad"
        ));
    }
}
