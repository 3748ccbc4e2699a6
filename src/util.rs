//! Encoding, media type, and date helpers.

use std::borrow::Cow;

/// Decode bytes to a string, handling the encodings found in FB2 files.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1251 (the usual encoding of older FB2 books)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
///
/// # Examples
///
/// ```
/// use fb2epub::util::decode_text;
///
/// assert_eq!(decode_text(b"Hello", None), "Hello");
/// // "Привет" in windows-1251
/// let cp1251 = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
/// assert_eq!(decode_text(&cp1251, Some("windows-1251")), "Привет");
/// ```
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1251.decode(bytes);
    result
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` in the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Strip UTF-8 BOM if present.
pub fn strip_bom(data: &str) -> &str {
    data.strip_prefix('\u{feff}').unwrap_or(data)
}

// ============================================================================
// Image Format Detection
// ============================================================================

/// Image formats that may appear as FB2 binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    /// File extension (without dot) used for packaged files.
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Png => "png",
            MediaFormat::Gif => "gif",
            MediaFormat::Svg => "svg",
            MediaFormat::WebP => "webp",
            MediaFormat::Binary => "bin",
        }
    }

    pub fn is_image(self) -> bool {
        self != MediaFormat::Binary
    }
}

/// Detect an image format from a declared content type and/or raw bytes.
///
/// The declared type wins when recognized; FB2 writers often leave it
/// empty or wrong, so magic bytes are the fallback.
pub fn detect_media_format(content_type: &str, data: &[u8]) -> MediaFormat {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => return MediaFormat::Jpeg,
        "image/png" => return MediaFormat::Png,
        "image/gif" => return MediaFormat::Gif,
        "image/svg+xml" => return MediaFormat::Svg,
        "image/webp" => return MediaFormat::WebP,
        _ => {}
    }

    if data.starts_with(&[0xFF, 0xD8]) {
        return MediaFormat::Jpeg;
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return MediaFormat::Png;
    }
    if data.starts_with(b"GIF") {
        return MediaFormat::Gif;
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return MediaFormat::WebP;
    }

    MediaFormat::Binary
}

// ============================================================================
// Date Utilities
// ============================================================================

/// Truncate an ISO date/timestamp to just the date portion (YYYY-MM-DD).
///
/// FB2 `<date value="...">` attributes sometimes carry full timestamps.
pub fn truncate_to_date(s: &str) -> String {
    if let Some(t_pos) = s.find('T') {
        s[..t_pos].to_string()
    } else {
        s.to_string()
    }
}
