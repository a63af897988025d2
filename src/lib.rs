//! # folio
//!
//! An EPUB ingestion and text-pagination core for ebook readers.
//!
//! folio does two jobs:
//!
//! - **Ingestion**: recover a coherent document (metadata, spine-ordered
//!   chapters, images, table of contents, flattened text) from a real-world
//!   EPUB container, tolerating the many non-conforming variants producers
//!   ship.
//! - **Pagination**: reflow arbitrary plain text into discrete,
//!   measurement-accurate pages under a viewport/font configuration, with a
//!   cached, position-preserving re-flow on configuration change.
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{parse_document, LayoutConfig, PaginationEngine};
//!
//! let bytes = std::fs::read("book.epub")?;
//! let document = parse_document(&bytes)?;
//! println!("{} by {}", document.metadata.title, document.metadata.author);
//!
//! let engine = PaginationEngine::new();
//! let config = LayoutConfig::for_display(1080.0, 1920.0);
//! let result = engine.paginate(&document.plain_text, &config);
//! println!("{} pages", result.total_pages);
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! Ingestion fails closed: a malformed container or package document
//! yields a typed [`Error`], never a partially populated document.
//! Pagination never fails; empty or degenerate input degrades to a single
//! placeholder page.

pub mod book;
pub mod epub;
pub mod error;
pub mod layout;
pub mod text;
pub(crate) mod util;

pub use book::{
    EpubChapter, EpubDocument, EpubImage, EpubMetadata, ManifestItem, SpineItem, TocEntry,
};
pub use epub::{extract_quick_metadata, parse_document};
pub use error::{Error, Result};
pub use layout::{
    DEFAULT_WORDS_PER_MINUTE, HeuristicMeasurer, LayoutConfig, Page, PaginationEngine,
    PaginationResult, TextMeasurer, reading_time_minutes, remap_page,
};
pub use text::{extract_text, strip_markdown};
pub use util::metadata_from_filename;
