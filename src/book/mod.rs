use std::collections::HashMap;

/// Fallback title used when the package document carries none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Fallback author used when the package document carries none.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// A fully assembled EPUB document: metadata plus spine-ordered chapters,
/// extracted images, table of contents, and the flattened text views.
///
/// Immutable once returned from [`crate::epub::parse_document`]; the caller
/// owns it.
#[derive(Debug, Clone)]
pub struct EpubDocument {
    pub metadata: EpubMetadata,
    /// Chapters in spine order; `chapters[i].order == i`.
    pub chapters: Vec<EpubChapter>,
    /// Images keyed by the href literal used in markup (not the resolved
    /// archive path).
    pub images: HashMap<String, EpubImage>,
    pub toc: Vec<TocEntry>,
    /// All chapters concatenated as plain text, each prefixed by its title,
    /// joined with blank lines.
    pub plain_text: String,
    /// Self-contained styled markup for the whole document (stylesheet,
    /// cover section, chapters with inlined images).
    pub styled_document: String,
}

/// Document metadata (Dublin Core subset).
///
/// `title` and `author` always hold a usable value; absence in the package
/// document resolves to [`UNKNOWN_TITLE`] / [`UNKNOWN_AUTHOR`] rather than
/// propagating downstream.
#[derive(Debug, Clone)]
pub struct EpubMetadata {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    /// Cover image bytes, when one of the cover heuristics found one.
    pub cover: Option<Vec<u8>>,
}

impl Default for EpubMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            description: None,
            language: None,
            publisher: None,
            cover: None,
        }
    }
}

/// A single chapter, resolved from one spine item.
#[derive(Debug, Clone)]
pub struct EpubChapter {
    /// The spine idref this chapter was produced from.
    pub id: String,
    /// Resolved via TOC match, else synthesized as `"Chapter N"`.
    pub title: String,
    /// Plain-text content (markup stripped, entities decoded).
    pub content: String,
    /// Normalized markup with image references inlined.
    pub styled_content: String,
    /// Position in the spine (0-based). Spine order is authoritative.
    pub order: usize,
    /// Image-map keys referenced by this chapter's markup.
    pub image_hrefs: Vec<String>,
}

/// An image resource extracted from the archive.
#[derive(Debug, Clone)]
pub struct EpubImage {
    pub id: String,
    /// The href as written in the manifest and in markup. This is the
    /// lookup key for rewriting; the resolved archive path is used only
    /// during extraction and never stored.
    pub href: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

/// An entry in the manifest (id -> resource table) of the package document.
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub title: Option<String>,
}

/// An item in the reading order (spine).
#[derive(Debug, Clone)]
pub struct SpineItem {
    /// References a [`ManifestItem`] id.
    pub idref: String,
    pub linear: bool,
}

/// A flattened table-of-contents entry, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    /// May carry a `#fragment` suffix; strip it before matching against
    /// chapter hrefs.
    pub href: String,
    /// Enumeration order in the TOC source.
    pub chapter_index: usize,
}

impl EpubMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>, chapter_index: usize) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            chapter_index,
        }
    }
}

impl EpubDocument {
    /// Look up a chapter by its spine position.
    pub fn chapter(&self, order: usize) -> Option<&EpubChapter> {
        self.chapters.get(order)
    }

    /// Look up an image by the href literal used in markup.
    pub fn image(&self, href: &str) -> Option<&EpubImage> {
        self.images.get(href)
    }
}
