//! Resource resolution and document assembly.
//!
//! Drives the whole ingestion pipeline for a single parse call:
//! archive -> container descriptor -> package document -> images + TOC ->
//! spine-ordered chapter normalization -> assembled [`EpubDocument`].

use std::collections::HashMap;

use log::{debug, warn};

use crate::book::{EpubChapter, EpubDocument, EpubImage};
use crate::epub::archive::{self, ArchiveEntries};
use crate::epub::container;
use crate::epub::package::{self, PackageData};
use crate::epub::toc::{self, TocSource};
use crate::error::{Error, Result};
use crate::text::html;
use crate::util::{decode_text, strip_bom, xml_declared_encoding};

/// Resolve a manifest href against the package document's directory.
///
/// An empty directory means the href is used as-is; otherwise the two are
/// joined with a single slash. Applied uniformly to chapter, image, and
/// TOC lookups.
pub fn resolve_href(opf_dir: &str, href: &str) -> String {
    if opf_dir.is_empty() {
        href.to_string()
    } else {
        format!("{opf_dir}/{href}")
    }
}

/// Parse a complete EPUB container into an [`EpubDocument`].
///
/// Fails closed: a missing container descriptor or unparseable package
/// document aborts the whole operation and no partial document is ever
/// returned. Resource-level misses (an image or chapter referenced but
/// absent from the archive) are skipped, never fatal.
pub fn parse_document(bytes: &[u8]) -> Result<EpubDocument> {
    let entries = archive::read_archive(bytes)?;

    let opf_path = container::rootfile_path(&entries)?;
    let opf_dir = opf_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default();

    let package = load_package(&entries, &opf_path)?;

    let mut metadata = package.metadata.clone();
    metadata.cover = package::resolve_cover(&entries, &opf_dir, &package);

    let images = extract_images(&entries, &opf_dir, &package);
    let toc_entries = load_toc(&entries, &opf_dir, &package);

    let mut chapters = Vec::new();
    for spine_item in &package.spine {
        let Some(item) = package.manifest.get(&spine_item.idref) else {
            warn!("spine idref {} has no manifest entry", spine_item.idref);
            continue;
        };
        // Some producers register fonts or images in the spine; only HTML
        // content becomes a chapter.
        if !item.media_type.contains("html") {
            debug!("skipping non-HTML spine item {} ({})", item.id, item.media_type);
            continue;
        }

        let path = resolve_href(&opf_dir, &item.href);
        let Some(raw) = archive::lookup(&entries, &path) else {
            warn!("chapter resource missing from archive: {path}");
            continue;
        };

        let markup = decode_markup(raw);
        let content = html::extract_text(&markup);
        if content.trim().is_empty() {
            debug!("skipping blank chapter {}", item.id);
            continue;
        }

        let order = chapters.len();
        let title = toc::resolve_chapter_title(&toc_entries, &item.href, order);
        let styled_content = html::inline_images(&markup, &images);
        let image_hrefs = html::referenced_images(&markup, &images);

        chapters.push(EpubChapter {
            id: spine_item.idref.clone(),
            title,
            content,
            styled_content,
            order,
            image_hrefs,
        });
    }

    if chapters.is_empty() {
        chapters.push(placeholder_chapter());
    }

    let plain_text = concatenate_plain_text(&chapters);
    let styled_document = html::assemble_styled_document(&metadata, &chapters);

    Ok(EpubDocument {
        metadata,
        chapters,
        images,
        toc: toc_entries,
        plain_text,
        styled_document,
    })
}

/// Fast metadata path for library listings: container descriptor and
/// package metadata only, skipping spine, chapter, and image extraction.
///
/// Returns `None` on any failure; this path never reports errors.
pub fn extract_quick_metadata(bytes: &[u8]) -> Option<(String, String)> {
    let entries = archive::read_archive(bytes).ok()?;
    let opf_path = container::rootfile_path(&entries).ok()?;
    let package = load_package(&entries, &opf_path).ok()?;
    Some((package.metadata.title, package.metadata.author))
}

fn load_package(entries: &ArchiveEntries, opf_path: &str) -> Result<PackageData> {
    let raw = archive::lookup(entries, opf_path)
        .ok_or_else(|| Error::InvalidContainer(format!("package document missing: {opf_path}")))?;
    let content = decode_markup(raw);
    package::parse_package(&content)
        .map_err(|e| Error::InvalidContainer(format!("package document unparseable: {e}")))
}

/// Extract every image-typed manifest resource present in the archive.
///
/// The map is keyed by the unresolved href literal as written in markup;
/// the resolved archive path is used only for the lookup.
fn extract_images(
    entries: &ArchiveEntries,
    opf_dir: &str,
    package: &PackageData,
) -> HashMap<String, EpubImage> {
    let mut images = HashMap::new();

    for id in &package.manifest_order {
        let Some(item) = package.manifest.get(id) else {
            continue;
        };
        if !item.media_type.starts_with("image/") {
            continue;
        }
        let path = resolve_href(opf_dir, &item.href);
        match archive::lookup(entries, &path) {
            Some(data) => {
                images.insert(
                    item.href.clone(),
                    EpubImage {
                        id: item.id.clone(),
                        href: item.href.clone(),
                        media_type: item.media_type.clone(),
                        data: data.to_vec(),
                    },
                );
            }
            None => debug!("image resource missing from archive: {path}"),
        }
    }

    images
}

fn load_toc(entries: &ArchiveEntries, opf_dir: &str, package: &PackageData) -> Vec<crate::book::TocEntry> {
    let Some(source) = toc::select_toc_source(package) else {
        return Vec::new();
    };

    let (href, legacy) = match source {
        TocSource::Ncx(href) => (href, true),
        TocSource::Nav(href) => (href, false),
    };

    let path = resolve_href(opf_dir, &href);
    let Some(raw) = archive::lookup(entries, &path) else {
        debug!("TOC resource missing from archive: {path}");
        return Vec::new();
    };

    let content = decode_markup(raw);
    if legacy {
        toc::parse_ncx(&content)
    } else {
        toc::parse_nav(&content)
    }
}

fn decode_markup(raw: &[u8]) -> String {
    let hint = xml_declared_encoding(raw);
    decode_text(strip_bom(raw), hint.as_deref()).into_owned()
}

fn placeholder_chapter() -> EpubChapter {
    EpubChapter {
        id: "placeholder".to_string(),
        title: "Chapter 1".to_string(),
        content: "No content available".to_string(),
        styled_content: "<p>No content available</p>".to_string(),
        order: 0,
        image_hrefs: Vec::new(),
    }
}

/// Join chapter plain text, each block prefixed by its resolved title and
/// separated by blank lines.
fn concatenate_plain_text(chapters: &[EpubChapter]) -> String {
    let mut out = String::new();
    for chapter in chapters {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&chapter.title);
        out.push_str("\n\n");
        out.push_str(&chapter.content);
    }
    out
}
