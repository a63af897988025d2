//! Content normalization: best-effort reduction of chapter markup to plain
//! text, inline-image rewriting, and styled document assembly.

pub mod html;
pub mod markdown;

pub use html::{assemble_styled_document, extract_text, inline_images};
pub use markdown::strip_markdown;
