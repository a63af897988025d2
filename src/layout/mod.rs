//! Text layout: reflow plain text into discrete, measurement-accurate
//! pages under a viewport/font configuration.

pub mod engine;
pub mod measure;

pub use engine::{DEFAULT_WORDS_PER_MINUTE, PaginationEngine, reading_time_minutes, remap_page};
pub use measure::{HeuristicMeasurer, TextMeasurer};

use std::hash::{Hash, Hasher};

/// Layout configuration: viewport, font, margins, display density.
///
/// A value type; equality and hashing (over exact bit patterns) make it
/// usable as part of the pagination cache key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Viewport width, in display units.
    pub viewport_width: f32,
    /// Viewport height, in display units.
    pub viewport_height: f32,
    /// Font size, in display units.
    pub font_size: f32,
    /// Height of one wrapped line, in display units.
    pub line_height: f32,
    /// Margin applied on each horizontal edge.
    pub margin_horizontal: f32,
    /// Margin applied on each vertical edge.
    pub margin_vertical: f32,
    /// Display density multiplier.
    pub density: f32,
}

impl LayoutConfig {
    /// Build a configuration for a target display size with the default
    /// font and margin values.
    pub fn for_display(width: f32, height: f32) -> Self {
        Self {
            viewport_width: width,
            viewport_height: height,
            ..Self::default()
        }
    }

    /// Usable width after symmetric horizontal margins.
    pub fn available_width(&self) -> f32 {
        self.viewport_width - 2.0 * self.margin_horizontal
    }

    /// Usable height after symmetric vertical margins.
    pub fn available_height(&self) -> f32 {
        self.viewport_height - 2.0 * self.margin_vertical
    }

    /// Line count budget per page.
    ///
    /// Zero for degenerate configurations; the engine resolves that to the
    /// one-page placeholder policy rather than an error.
    pub fn lines_per_page(&self) -> usize {
        if self.line_height <= 0.0 {
            return 0;
        }
        let lines = (self.available_height() / self.line_height).floor();
        if lines.is_sign_negative() { 0 } else { lines as usize }
    }

    /// Estimated characters per line.
    ///
    /// A heuristic seed only; per-line measurement supersedes it wherever a
    /// measurer is available.
    pub fn estimated_chars_per_line(&self) -> usize {
        let advance = measure::glyph_advance(self);
        if advance <= 0.0 {
            return 0;
        }
        (self.available_width() / advance).floor().max(0.0) as usize
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1080.0,
            viewport_height: 1920.0,
            font_size: 16.0,
            line_height: 24.0,
            margin_horizontal: 32.0,
            margin_vertical: 48.0,
            density: 1.0,
        }
    }
}

impl Hash for LayoutConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.viewport_width.to_bits().hash(state);
        self.viewport_height.to_bits().hash(state);
        self.font_size.to_bits().hash(state);
        self.line_height.to_bits().hash(state);
        self.margin_horizontal.to_bits().hash(state);
        self.margin_vertical.to_bits().hash(state);
        self.density.to_bits().hash(state);
    }
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub content: String,
    /// Whitespace-delimited tokens, blank tokens excluded.
    pub word_count: usize,
    /// Raw length of the trimmed page text.
    pub char_count: usize,
}

/// The outcome of one pagination call.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult {
    pub pages: Vec<Page>,
    pub total_pages: usize,
    pub total_words: usize,
    /// Echo of the configuration the pages were produced under.
    pub config: LayoutConfig,
}

impl PaginationResult {
    /// Look up a page by its 1-based number.
    pub fn page(&self, number: usize) -> Option<&Page> {
        self.pages.get(number.checked_sub(1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_from_config() {
        let config = LayoutConfig {
            viewport_width: 400.0,
            viewport_height: 600.0,
            line_height: 20.0,
            margin_horizontal: 50.0,
            margin_vertical: 50.0,
            ..LayoutConfig::default()
        };
        assert_eq!(config.available_width(), 300.0);
        assert_eq!(config.available_height(), 500.0);
        assert_eq!(config.lines_per_page(), 25);
    }

    #[test]
    fn degenerate_viewport_yields_zero_budget() {
        let config = LayoutConfig {
            viewport_height: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(config.lines_per_page(), 0);
    }

    #[test]
    fn config_hash_is_bitwise() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = LayoutConfig::default();
        let b = LayoutConfig {
            font_size: 17.0,
            ..LayoutConfig::default()
        };

        let hash = |c: &LayoutConfig| {
            let mut h = DefaultHasher::new();
            c.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&a));
        assert_ne!(hash(&a), hash(&b));
    }
}
