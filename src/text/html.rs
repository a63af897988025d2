//! HTML reduction and rewriting.
//!
//! This is a best-effort reducer, not a validator: real-world chapter
//! markup is the least well-formed input the pipeline sees, so malformed
//! markup degrades gracefully instead of failing. Nothing here builds a
//! DOM; tags are scanned byte-wise.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use memchr::memchr;

use crate::book::{EpubChapter, EpubImage, EpubMetadata};

/// Reduce chapter markup to plain text.
///
/// Script and style blocks are removed with their content, remaining tags
/// stripped, the basic entities decoded, and whitespace runs collapsed to
/// single spaces.
pub fn extract_text(markup: &str) -> String {
    let without_blocks = remove_element_blocks(markup, &["script", "style"]);
    let stripped = strip_tags(&without_blocks);
    let decoded = decode_entities(&stripped);
    collapse_whitespace(&decoded)
}

/// Remove whole elements (opening tag through closing tag) by name,
/// case-insensitive. An unclosed element swallows the rest of the input,
/// which is the graceful option for truncated markup.
fn remove_element_blocks(markup: &str, names: &[&str]) -> String {
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut pos = 0;

    'outer: while pos < markup.len() {
        for name in names {
            let open = format!("<{name}");
            // The name must end at a tag boundary, so `<script` does not
            // also claim `<scripty>`.
            let boundary = match lower.as_bytes().get(pos + open.len()) {
                Some(&b) => b.is_ascii_whitespace() || b == b'>' || b == b'/',
                None => true,
            };
            if boundary && lower[pos..].starts_with(&open) {
                let close = format!("</{name}");
                let after = match lower[pos..].find(&close) {
                    Some(rel) => {
                        let close_start = pos + rel;
                        match memchr(b'>', lower[close_start..].as_bytes()) {
                            Some(gt) => close_start + gt + 1,
                            None => markup.len(),
                        }
                    }
                    None => markup.len(),
                };
                pos = after;
                continue 'outer;
            }
        }

        let rest = &markup[pos..];
        match memchr(b'<', rest.as_bytes()) {
            Some(0) => {
                out.push('<');
                pos += 1;
            }
            Some(lt) => {
                out.push_str(&rest[..lt]);
                pos += lt;
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

/// Drop everything between `<` and the next `>`. A `<` with no closing `>`
/// drops the remainder.
fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let bytes = markup.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        match memchr(b'<', &bytes[pos..]) {
            Some(lt) => {
                out.push_str(&markup[pos..pos + lt]);
                match memchr(b'>', &bytes[pos + lt..]) {
                    Some(gt) => {
                        // Tags are replaced by a space so adjacent block
                        // elements do not fuse words together.
                        out.push(' ');
                        pos += lt + gt + 1;
                    }
                    None => break,
                }
            }
            None => {
                out.push_str(&markup[pos..]);
                break;
            }
        }
    }

    out
}

/// Decode the basic HTML entities. Anything rarer is left as written.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

/// Rewrite `<img src="...">` references into self-contained data URIs.
///
/// The lookup key is the href literal as written in markup; references
/// with no matching image are left untouched.
pub fn inline_images(markup: &str, images: &HashMap<String, EpubImage>) -> String {
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut pos = 0;

    while let Some((value_start, value_end)) = next_img_src(markup, &lower, pos) {
        let src = &markup[value_start..value_end];
        out.push_str(&markup[pos..value_start]);
        match images.get(src) {
            Some(image) => {
                out.push_str("data:");
                out.push_str(&image.media_type);
                out.push_str(";base64,");
                out.push_str(&BASE64.encode(&image.data));
            }
            None => out.push_str(src),
        }
        pos = value_end;
    }

    out.push_str(&markup[pos..]);
    out
}

/// Image-map keys referenced by the markup, in document order, deduped.
pub fn referenced_images(markup: &str, images: &HashMap<String, EpubImage>) -> Vec<String> {
    let lower = markup.to_ascii_lowercase();
    let mut refs = Vec::new();
    let mut pos = 0;

    while let Some((value_start, value_end)) = next_img_src(markup, &lower, pos) {
        let src = &markup[value_start..value_end];
        if images.contains_key(src) && !refs.iter().any(|r| r == src) {
            refs.push(src.to_string());
        }
        pos = value_end;
    }

    refs
}

/// Find the next `<img ... src="VALUE">` and return the byte range of
/// VALUE. Tolerant of attribute order, spacing, and quote style.
///
/// `lower` is the caller's pre-lowercased copy of `markup`.
fn next_img_src(markup: &str, lower: &str, from: usize) -> Option<(usize, usize)> {
    let mut pos = from;

    while pos < markup.len() {
        let tag_start = pos + lower[pos..].find("<img")?;
        let tag_end = match memchr(b'>', markup[tag_start..].as_bytes()) {
            Some(gt) => tag_start + gt,
            None => markup.len(),
        };

        if let Some(range) = attr_value_range(&lower[tag_start..tag_end], "src") {
            return Some((tag_start + range.0, tag_start + range.1));
        }
        pos = tag_end.max(tag_start + 4);
    }

    None
}

/// Byte range of a quoted attribute value inside a (lowercased) tag slice.
fn attr_value_range(tag: &str, attr: &str) -> Option<(usize, usize)> {
    let bytes = tag.as_bytes();
    let mut search = 0;

    while let Some(rel) = tag[search..].find(attr) {
        let idx = search + rel;
        search = idx + attr.len();

        // Word boundary before the name, so "data-src" never matches "src".
        if idx > 0 && !bytes[idx - 1].is_ascii_whitespace() {
            continue;
        }

        let mut i = idx + attr.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            continue;
        }
        let quote = bytes[i];
        let start = i + 1;
        let end = start + memchr(quote, &bytes[start..])?;
        return Some((start, end));
    }

    None
}

/// Fixed stylesheet wrapped around the assembled styled document.
const DOCUMENT_STYLE: &str = "\
body { font-family: serif; line-height: 1.6; margin: 0 auto; max-width: 40em; padding: 1em; }
h1, h2 { text-align: center; page-break-before: always; }
img { max-width: 100%; height: auto; }
.cover { text-align: center; }
.cover img { max-height: 90vh; }
";

/// Assemble the full styled document: stylesheet, cover section, then each
/// chapter's normalized markup under its resolved title.
pub fn assemble_styled_document(metadata: &EpubMetadata, chapters: &[EpubChapter]) -> String {
    let mut out = String::new();
    out.push_str("<html><head><meta charset=\"utf-8\"/><style>\n");
    out.push_str(DOCUMENT_STYLE);
    out.push_str("</style></head><body>\n");

    out.push_str("<div class=\"cover\">");
    match &metadata.cover {
        Some(data) => {
            out.push_str("<img src=\"data:");
            out.push_str(image_mime_from_magic(data));
            out.push_str(";base64,");
            out.push_str(&BASE64.encode(data));
            out.push_str("\" alt=\"cover\"/>");
        }
        None => {
            out.push_str("<h1>");
            out.push_str(&escape_text(&metadata.title));
            out.push_str("</h1><p>");
            out.push_str(&escape_text(&metadata.author));
            out.push_str("</p>");
        }
    }
    out.push_str("</div>\n");

    for chapter in chapters {
        out.push_str("<section><h2>");
        out.push_str(&escape_text(&chapter.title));
        out.push_str("</h2>\n");
        out.push_str(&chapter.styled_content);
        out.push_str("\n</section>\n");
    }

    out.push_str("</body></html>\n");
    out
}

/// Sniff an image MIME type from magic bytes; JPEG is the safe default for
/// cover art.
fn image_mime_from_magic(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(b"GIF8") {
        "image/gif"
    } else if data.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else {
        "image/jpeg"
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(href: &str, mime: &str, data: &[u8]) -> EpubImage {
        EpubImage {
            id: href.to_string(),
            href: href.to_string(),
            media_type: mime.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn strips_tags_and_collapses() {
        let html = "<p>Hello <b>world</b></p>\n<p>Second   paragraph</p>";
        assert_eq!(extract_text(html), "Hello world Second paragraph");
    }

    #[test]
    fn removes_script_and_style_content() {
        let html = "<style>p { color: red; }</style><p>Kept</p><script>var x = '<gone>';</script>";
        assert_eq!(extract_text(html), "Kept");
    }

    #[test]
    fn longer_tag_names_are_not_mistaken_for_blocks() {
        let html = "<scripty>kept</scripty><p>also</p><styled>too</styled>";
        assert_eq!(extract_text(html), "kept also too");
    }

    #[test]
    fn unclosed_script_swallows_rest() {
        let html = "<p>Kept</p><script>never closed";
        assert_eq!(extract_text(html), "Kept");
    }

    #[test]
    fn decodes_basic_entities() {
        let html = "<p>Fish&nbsp;&amp;&nbsp;Chips &lt;tasty&gt; &quot;so&quot; it&#39;s said</p>";
        assert_eq!(extract_text(html), "Fish & Chips <tasty> \"so\" it's said");
    }

    #[test]
    fn malformed_markup_degrades() {
        let html = "<p>Broken <b text</p> more";
        // A tag with no closing '>' drops the remainder; no panic.
        let _ = extract_text(html);
        assert_eq!(extract_text("plain text, no tags"), "plain text, no tags");
    }

    #[test]
    fn inlines_matching_image() {
        let mut images = HashMap::new();
        images.insert(
            "images/cover.jpg".to_string(),
            image("images/cover.jpg", "image/jpeg", b"JPEGDATA"),
        );

        let html = r#"<img src="images/cover.jpg" alt="c"/> <img src="images/other.jpg"/>"#;
        let rewritten = inline_images(html, &images);

        let expected_uri = format!("data:image/jpeg;base64,{}", BASE64.encode(b"JPEGDATA"));
        assert!(rewritten.contains(&expected_uri));
        // Unmatched reference untouched
        assert!(rewritten.contains(r#"<img src="images/other.jpg"/>"#));
    }

    #[test]
    fn img_src_attribute_order_and_quotes() {
        let mut images = HashMap::new();
        images.insert("a.png".to_string(), image("a.png", "image/png", b"P"));

        let html = "<img alt='x' src='a.png'>";
        let rewritten = inline_images(html, &images);
        assert!(rewritten.contains("data:image/png;base64,"));
    }

    #[test]
    fn referenced_images_deduped_in_order() {
        let mut images = HashMap::new();
        images.insert("a.png".to_string(), image("a.png", "image/png", b"P"));
        images.insert("b.png".to_string(), image("b.png", "image/png", b"P"));

        let html = r#"<img src="b.png"/><img src="a.png"/><img src="b.png"/><img src="c.png"/>"#;
        assert_eq!(referenced_images(html, &images), vec!["b.png", "a.png"]);
    }

    #[test]
    fn styled_document_without_cover_uses_text_block() {
        let metadata = EpubMetadata::new("A & B").with_author("Someone");
        let doc = assemble_styled_document(&metadata, &[]);
        assert!(doc.contains("<h1>A &amp; B</h1>"));
        assert!(doc.contains("<p>Someone</p>"));
        assert!(doc.contains("<style>"));
    }

    #[test]
    fn styled_document_with_cover_embeds_data_uri() {
        let mut metadata = EpubMetadata::new("T");
        metadata.cover = Some(vec![0xFF, 0xD8, 0x01]);
        let doc = assemble_styled_document(&metadata, &[]);
        assert!(doc.contains("data:image/jpeg;base64,"));
    }
}
