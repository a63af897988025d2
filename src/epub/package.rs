//! Package document (OPF) parsing: metadata, manifest, spine, cover.

use std::collections::HashMap;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::book::{EpubMetadata, ManifestItem, SpineItem};
use crate::epub::archive::{self, ArchiveEntries};
use crate::epub::container::local_name;
use crate::epub::resolve_href;
use crate::error::{Error, Result};

/// Parsed package document content.
pub struct PackageData {
    pub metadata: EpubMetadata,
    /// Maps manifest id -> item. A duplicate id overwrites the earlier one.
    pub manifest: HashMap<String, ManifestItem>,
    /// Manifest ids in document order, for deterministic heuristics.
    pub manifest_order: Vec<String>,
    /// Reading order; order of appearance is semantic and preserved exactly.
    pub spine: Vec<SpineItem>,
    /// Manifest id referenced by `<meta name="cover" content="..."/>`.
    pub cover_meta_id: Option<String>,
}

/// Parse the package document into metadata, manifest, and spine.
///
/// Metadata fields take their first occurrence; missing fields keep their
/// documented fallbacks. Attribute order and `dc:` namespacing vary across
/// producers and are both tolerated.
pub fn parse_package(content: &str) -> Result<PackageData> {
    // Text is collected raw and edge-trimmed on element end; trimming each
    // text event would eat the spaces around entity references.
    let mut reader = Reader::from_str(content);
    reader.config_mut().check_end_names = false;

    let mut metadata = EpubMetadata::default();
    let mut manifest: HashMap<String, ManifestItem> = HashMap::new();
    let mut manifest_order: Vec<String> = Vec::new();
    let mut spine: Vec<SpineItem> = Vec::new();
    let mut cover_meta_id: Option<String> = None;

    let mut title_set = false;
    let mut author_set = false;
    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            // Producers write item/itemref/meta as both self-closing and
            // expanded tags; both event shapes carry the same attributes.
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"title" => current_element = Some("title"),
                    b"creator" => current_element = Some("creator"),
                    b"description" => current_element = Some("description"),
                    b"language" => current_element = Some("language"),
                    b"publisher" => current_element = Some("publisher"),
                    b"item" => {
                        current_element = None;
                        if let Some(item) = read_manifest_item(&e)? {
                            if !manifest.contains_key(&item.id) {
                                manifest_order.push(item.id.clone());
                            }
                            manifest.insert(item.id.clone(), item);
                        }
                    }
                    b"itemref" => {
                        current_element = None;
                        if let Some(item) = read_spine_item(&e)? {
                            spine.push(item);
                        }
                    }
                    b"meta" => {
                        current_element = None;
                        if let Some(id) = read_cover_meta(&e)?
                            && cover_meta_id.is_none()
                        {
                            cover_meta_id = Some(id);
                        }
                    }
                    _ => current_element = None,
                }
                buf_text.clear();
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(resolve_entity(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(elem) = current_element.take() {
                    let text = buf_text.trim();
                    if !text.is_empty() {
                        match elem {
                            "title" if !title_set => {
                                metadata.title = text.to_string();
                                title_set = true;
                            }
                            "creator" if !author_set => {
                                metadata.author = text.to_string();
                                author_set = true;
                            }
                            "description" if metadata.description.is_none() => {
                                metadata.description = Some(text.to_string());
                            }
                            "language" if metadata.language.is_none() => {
                                metadata.language = Some(text.to_string());
                            }
                            "publisher" if metadata.publisher.is_none() => {
                                metadata.publisher = Some(text.to_string());
                            }
                            _ => {}
                        }
                    }
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(PackageData {
        metadata,
        manifest,
        manifest_order,
        spine,
        cover_meta_id,
    })
}

fn read_manifest_item(e: &quick_xml::events::BytesStart) -> Result<Option<ManifestItem>> {
    let mut id = String::new();
    let mut href = String::new();
    let mut media_type = String::new();
    let mut title = None;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => id = String::from_utf8(attr.value.to_vec())?,
            b"href" => href = String::from_utf8(attr.value.to_vec())?,
            b"media-type" => media_type = String::from_utf8(attr.value.to_vec())?,
            b"title" => title = Some(String::from_utf8(attr.value.to_vec())?),
            _ => {}
        }
    }

    if id.is_empty() {
        return Ok(None);
    }
    Ok(Some(ManifestItem {
        id,
        href,
        media_type,
        title,
    }))
}

fn read_spine_item(e: &quick_xml::events::BytesStart) -> Result<Option<SpineItem>> {
    let mut idref = String::new();
    let mut linear = true;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"idref" => idref = String::from_utf8(attr.value.to_vec())?,
            b"linear" => linear = attr.value.as_ref() != b"no",
            _ => {}
        }
    }

    if idref.is_empty() {
        return Ok(None);
    }
    Ok(Some(SpineItem { idref, linear }))
}

/// Manifest id referenced by a `<meta name="cover" content="..."/>` entry.
fn read_cover_meta(e: &quick_xml::events::BytesStart) -> Result<Option<String>> {
    let mut is_cover = false;
    let mut content_id = String::new();

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" if attr.value.as_ref() == b"cover" => is_cover = true,
            b"content" => content_id = String::from_utf8(attr.value.to_vec())?,
            _ => {}
        }
    }

    if is_cover && !content_id.is_empty() {
        Ok(Some(content_id))
    } else {
        Ok(None)
    }
}

/// Resolve XML entity references encountered in metadata text.
pub(crate) fn resolve_entity(entity: &str) -> &'static str {
    match entity {
        "apos" | "#39" => "'",
        "quot" => "\"",
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "nbsp" => " ",
        _ => "",
    }
}

/// Conventional cover locations probed when the package declares none.
///
/// The order is tuned to common producer layouts and is contractual; do not
/// reorder.
const COVER_PATH_PROBES: &[&str] = &[
    "cover.jpg",
    "cover.jpeg",
    "cover.png",
    "images/cover.jpg",
    "images/cover.jpeg",
    "images/cover.png",
    "Images/cover.jpg",
    "OEBPS/cover.jpg",
    "OEBPS/images/cover.jpg",
];

/// Locate cover image bytes using the ordered heuristic chain:
///
/// 1. the manifest item referenced by `<meta name="cover">`
/// 2. conventional cover paths in the archive
/// 3. the first image-typed manifest item whose href contains "cover"
///
/// Each stage runs only when the previous one yielded nothing. Entirely
/// best-effort; returns `None` without error when nothing plausible exists.
pub fn resolve_cover(
    entries: &ArchiveEntries,
    opf_dir: &str,
    package: &PackageData,
) -> Option<Vec<u8>> {
    if let Some(id) = &package.cover_meta_id
        && let Some(item) = package.manifest.get(id)
    {
        let path = resolve_href(opf_dir, &item.href);
        if let Some(data) = archive::lookup(entries, &path) {
            debug!("cover: declared manifest item {id} -> {path}");
            return Some(data.to_vec());
        }
    }

    for probe in COVER_PATH_PROBES {
        if let Some(data) = entries.get(*probe) {
            debug!("cover: conventional path {probe}");
            return Some(data.clone());
        }
    }

    for id in &package.manifest_order {
        let Some(item) = package.manifest.get(id) else {
            continue;
        };
        if item.media_type.starts_with("image/") && item.href.to_lowercase().contains("cover") {
            let path = resolve_href(opf_dir, &item.href);
            if let Some(data) = archive::lookup(entries, &path) {
                debug!("cover: href substring match {}", item.href);
                return Some(data.to_vec());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>The Time Machine</dc:title>
    <dc:creator>H. G. Wells</dc:creator>
    <dc:language>en</dc:language>
    <dc:publisher>Heinemann</dc:publisher>
    <meta name="cover" content="cover-img"/>
  </metadata>
  <manifest>
    <item id="ch1" href="ch1.html" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.html" media-type="application/xhtml+xml"/>
    <item id="cover-img" href="images/cover.jpg" media-type="image/jpeg"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch2"/>
    <itemref idref="ch1" linear="no"/>
  </spine>
</package>"#;

    #[test]
    fn parses_metadata() {
        let package = parse_package(OPF).unwrap();
        assert_eq!(package.metadata.title, "The Time Machine");
        assert_eq!(package.metadata.author, "H. G. Wells");
        assert_eq!(package.metadata.language.as_deref(), Some("en"));
        assert_eq!(package.metadata.publisher.as_deref(), Some("Heinemann"));
        assert!(package.metadata.description.is_none());
    }

    #[test]
    fn missing_metadata_falls_back() {
        let package = parse_package("<package><manifest/><spine/></package>").unwrap();
        assert_eq!(package.metadata.title, "Unknown Title");
        assert_eq!(package.metadata.author, "Unknown Author");
    }

    #[test]
    fn first_occurrence_wins() {
        let opf = r#"<package><metadata>
            <dc:title>First</dc:title>
            <dc:title>Second</dc:title>
        </metadata></package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.metadata.title, "First");
    }

    #[test]
    fn parses_manifest_and_spine() {
        let package = parse_package(OPF).unwrap();
        assert_eq!(package.manifest.len(), 4);
        assert_eq!(package.manifest["ch1"].href, "ch1.html");
        assert_eq!(package.manifest["cover-img"].media_type, "image/jpeg");

        // Spine order preserved exactly, linear flag recorded
        assert_eq!(package.spine.len(), 2);
        assert_eq!(package.spine[0].idref, "ch2");
        assert!(package.spine[0].linear);
        assert_eq!(package.spine[1].idref, "ch1");
        assert!(!package.spine[1].linear);
    }

    #[test]
    fn expanded_item_and_itemref_tags_parsed() {
        let opf = r#"<package>
          <metadata><meta name="cover" content="cov"></meta></metadata>
          <manifest>
            <item id="ch1" href="ch1.html" media-type="application/xhtml+xml"></item>
            <item id="cov" href="cover.jpg" media-type="image/jpeg"></item>
          </manifest>
          <spine>
            <itemref idref="ch1"></itemref>
          </spine>
        </package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.manifest.len(), 2);
        assert_eq!(package.manifest["ch1"].href, "ch1.html");
        assert_eq!(package.spine.len(), 1);
        assert_eq!(package.spine[0].idref, "ch1");
        assert_eq!(package.cover_meta_id.as_deref(), Some("cov"));
    }

    #[test]
    fn duplicate_manifest_id_overwrites() {
        let opf = r#"<package><manifest>
            <item id="x" href="a.html" media-type="application/xhtml+xml"/>
            <item id="x" href="b.html" media-type="application/xhtml+xml"/>
        </manifest></package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.manifest.len(), 1);
        assert_eq!(package.manifest["x"].href, "b.html");
        assert_eq!(package.manifest_order, vec!["x"]);
    }

    #[test]
    fn cover_meta_id_extracted() {
        let package = parse_package(OPF).unwrap();
        assert_eq!(package.cover_meta_id.as_deref(), Some("cover-img"));
    }

    #[test]
    fn entity_in_title() {
        let opf = "<package><metadata><dc:title>Tom &amp; Jerry</dc:title></metadata></package>";
        let package = parse_package(opf).unwrap();
        assert_eq!(package.metadata.title, "Tom & Jerry");
    }

    #[test]
    fn entity_in_creator_keeps_spacing() {
        let opf =
            "<package><metadata><dc:creator>Strunk &amp; White</dc:creator></metadata></package>";
        let package = parse_package(opf).unwrap();
        assert_eq!(package.metadata.author, "Strunk & White");
    }

    #[test]
    fn cover_heuristic_ordering() {
        let package = parse_package(OPF).unwrap();
        let mut entries = ArchiveEntries::new();
        entries.insert("OEBPS/images/cover.jpg".to_string(), b"declared".to_vec());
        entries.insert("cover.jpg".to_string(), b"conventional".to_vec());

        // Stage 1: declared manifest item wins over conventional path
        let cover = resolve_cover(&entries, "OEBPS", &package).unwrap();
        assert_eq!(cover, b"declared");

        // Stage 2: conventional path when the declared item is missing
        entries.remove("OEBPS/images/cover.jpg");
        let cover = resolve_cover(&entries, "OEBPS", &package).unwrap();
        assert_eq!(cover, b"conventional");

        // Stage 3: href substring match as last resort, at a path the
        // conventional probe list does not cover
        entries.remove("cover.jpg");
        entries.insert("OEBPS/art/mycover.png".to_string(), b"substring".to_vec());
        let mut package = package;
        package.cover_meta_id = None;
        package.manifest.get_mut("cover-img").unwrap().href = "art/mycover.png".to_string();
        let cover = resolve_cover(&entries, "OEBPS", &package).unwrap();
        assert_eq!(cover, b"substring");
    }
}
