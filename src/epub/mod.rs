//! EPUB container ingestion: archive, container descriptor, package
//! document, TOC, and document assembly.

pub mod archive;
pub mod container;
pub mod package;
pub mod parser;
pub mod toc;

pub use parser::{extract_quick_metadata, parse_document, resolve_href};
