//! Table-of-contents parsing (NCX and nav document) and chapter-title
//! resolution.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::book::TocEntry;
use crate::epub::container::local_name;
use crate::epub::package::{PackageData, resolve_entity};

/// Media type identifying the legacy navigation-control document.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Which TOC source a manifest declares, if any.
///
/// At most one source is ever consumed: NCX takes priority over a nav
/// document; neither is non-fatal and yields an empty TOC.
pub enum TocSource {
    Ncx(String),
    Nav(String),
}

/// Pick the TOC resource href from the manifest.
pub fn select_toc_source(package: &PackageData) -> Option<TocSource> {
    for id in &package.manifest_order {
        let item = package.manifest.get(id)?;
        if item.media_type == NCX_MEDIA_TYPE {
            return Some(TocSource::Ncx(item.href.clone()));
        }
    }

    for id in &package.manifest_order {
        let item = package.manifest.get(id)?;
        if id.to_lowercase().contains("nav") && item.media_type.contains("xhtml") {
            return Some(TocSource::Nav(item.href.clone()));
        }
    }

    None
}

/// Parse the legacy navigation-control document into a flat entry list.
///
/// Nesting is flattened; document order assigns `chapter_index`.
pub fn parse_ncx(content: &str) -> Vec<TocEntry> {
    // Raw text events, edge-trimmed at entry creation, so spaces around
    // entity references in labels survive.
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;

    let mut entries = Vec::new();
    let mut in_text = false;
    let mut label: Option<String> = None;
    let mut pending: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => {
                    if let Some(text) = label.take() {
                        pending.push(text);
                    }
                }
                b"text" => {
                    in_text = true;
                    label = Some(String::new());
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src" {
                            let src = String::from_utf8_lossy(&attr.value).into_owned();
                            let title = label
                                .take()
                                .or_else(|| pending.pop())
                                .unwrap_or_default();
                            let index = entries.len();
                            entries.push(TocEntry::new(title.trim(), src, index));
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(text) = label.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text && let Some(text) = label.as_mut() {
                    text.push_str(resolve_entity(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"text" {
                    in_text = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    entries
}

/// Parse a modern navigation document: hyperlink (href, text) pairs in
/// document order.
pub fn parse_nav(content: &str) -> Vec<TocEntry> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;

    let mut entries = Vec::new();
    let mut href: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if local_name(e.name().as_ref()) == b"a" {
                    href = None;
                    text.clear();
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"href" {
                            href = Some(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if href.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if href.is_some() {
                    text.push_str(resolve_entity(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"a"
                    && let Some(href) = href.take()
                {
                    let index = entries.len();
                    entries.push(TocEntry::new(text.trim().to_string(), href, index));
                    text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    entries
}

/// Resolve a chapter title from the TOC, falling back to `"Chapter N"`.
///
/// Both the chapter href and entry hrefs are compared with any `#fragment`
/// suffix stripped. A matched title is rejected when blank or when it is a
/// generic `partN` placeholder.
pub fn resolve_chapter_title(toc: &[TocEntry], chapter_href: &str, index: usize) -> String {
    let chapter_base = strip_fragment(chapter_href);

    for entry in toc {
        if strip_fragment(&entry.href) == chapter_base {
            let title = entry.title.trim();
            if !title.is_empty() && !is_generic_part(title) {
                return title.to_string();
            }
            break;
        }
    }

    format!("Chapter {}", index + 1)
}

fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

/// True for placeholder titles of the shape "part0007".
fn is_generic_part(title: &str) -> bool {
    let lower = title.to_lowercase();
    match lower.strip_prefix("part") {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NCX: &str = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <navMap>
    <navPoint id="p1" playOrder="1">
      <navLabel><text>Introduction</text></navLabel>
      <content src="ch1.html"/>
    </navPoint>
    <navPoint id="p2" playOrder="2">
      <navLabel><text>The Voyage</text></navLabel>
      <content src="ch2.html#start"/>
    </navPoint>
  </navMap>
</ncx>"#;

    #[test]
    fn ncx_entries_in_document_order() {
        let toc = parse_ncx(NCX);
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0], TocEntry::new("Introduction", "ch1.html", 0));
        assert_eq!(toc[1], TocEntry::new("The Voyage", "ch2.html#start", 1));
    }

    #[test]
    fn nav_entries_in_document_order() {
        let nav = r#"<html><body><nav epub:type="toc"><ol>
            <li><a href="ch1.html">One</a></li>
            <li><a href="ch2.html#frag">Two &amp; Three</a></li>
        </ol></nav></body></html>"#;
        let toc = parse_nav(nav);
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0], TocEntry::new("One", "ch1.html", 0));
        assert_eq!(toc[1], TocEntry::new("Two & Three", "ch2.html#frag", 1));
    }

    #[test]
    fn ncx_label_entity_keeps_spacing() {
        let ncx = r#"<ncx><navMap><navPoint>
            <navLabel><text>Crime &amp; Punishment</text></navLabel>
            <content src="ch1.html"/>
        </navPoint></navMap></ncx>"#;
        let toc = parse_ncx(ncx);
        assert_eq!(toc[0].title, "Crime & Punishment");
    }

    #[test]
    fn title_match_ignores_fragment() {
        let toc = vec![TocEntry::new("Intro", "ch1.html#frag", 0)];
        assert_eq!(resolve_chapter_title(&toc, "ch1.html", 0), "Intro");
        assert_eq!(resolve_chapter_title(&toc, "ch1.html#other", 0), "Intro");
    }

    #[test]
    fn unmatched_title_synthesized() {
        let toc = vec![TocEntry::new("Intro", "ch1.html", 0)];
        assert_eq!(resolve_chapter_title(&toc, "ch9.html", 2), "Chapter 3");
    }

    #[test]
    fn generic_part_title_rejected() {
        let toc = vec![
            TocEntry::new("part0004", "ch1.html", 0),
            TocEntry::new("  ", "ch2.html", 1),
            TocEntry::new("Part Two", "ch3.html", 2),
        ];
        assert_eq!(resolve_chapter_title(&toc, "ch1.html", 0), "Chapter 1");
        assert_eq!(resolve_chapter_title(&toc, "ch2.html", 1), "Chapter 2");
        // "Part Two" is not a partN placeholder
        assert_eq!(resolve_chapter_title(&toc, "ch3.html", 2), "Part Two");
    }
}
