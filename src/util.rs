//! Text decoding and filename helpers.

use std::borrow::Cow;

use crate::book::UNKNOWN_AUTHOR;

/// Decode bytes to a string, handling the encodings seen in real ebooks.
///
/// 1. Tries UTF-8 first (BOM handled by encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in old ebooks)
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
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

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Pull the declared encoding out of an XML declaration, if any.
///
/// Looks only at the first line; tolerant of quote style and spacing.
pub fn xml_declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let start = head.find("encoding")?;
    let rest = &head[start + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

/// Strip a UTF-8 BOM (byte order mark) if present.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

/// Derive (title, author) from a filename, for formats or failures that
/// yield no embedded metadata.
///
/// Recognizes `"Title - Author.ext"` and `"Title by Author.ext"`. A name
/// with neither separator yields the whole stem as title and
/// `"Unknown Author"`.
pub fn metadata_from_filename(name: &str) -> (String, String) {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    if let Some((title, author)) = stem.split_once(" - ") {
        let title = title.trim();
        let author = author.trim();
        if !title.is_empty() && !author.is_empty() {
            return (title.to_string(), author.to_string());
        }
    }

    if let Some((title, author)) = stem.split_once(" by ") {
        let title = title.trim();
        let author = author.trim();
        if !title.is_empty() && !author.is_empty() {
            return (title.to_string(), author.to_string());
        }
    }

    (stem.trim().to_string(), UNKNOWN_AUTHOR.to_string())
}
