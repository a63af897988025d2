//! The pagination engine: greedy word-wrap against measured width, page
//! breaking against a line budget, and a fingerprint-keyed result cache.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use super::measure::{HeuristicMeasurer, TextMeasurer};
use super::{LayoutConfig, Page, PaginationResult};

/// Literal content of the placeholder page emitted when layout produces
/// nothing.
pub const PLACEHOLDER_CONTENT: &str = "No content available";

/// Default reading speed for time estimates.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Cache bound; reaching it clears the whole map before the next insert.
/// The workload is single-document and foreground, so a generation sweep
/// beats carrying an LRU chain.
const MAX_CACHE_ENTRIES: usize = 64;

/// Splits text into pages and caches results per (content, configuration)
/// fingerprint.
///
/// Pagination never fails: empty or unmeasurable input degrades to a
/// single placeholder page. The cache accepts concurrent reads and inserts
/// from in-flight calls; a result is only inserted once fully computed.
pub struct PaginationEngine {
    cache: DashMap<String, Arc<PaginationResult>>,
}

impl Default for PaginationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationEngine {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Paginate with the configuration-seeded heuristic measurer.
    pub fn paginate(&self, content: &str, config: &LayoutConfig) -> Arc<PaginationResult> {
        let mut measurer = HeuristicMeasurer::new(config);
        self.paginate_with(content, config, &mut measurer)
    }

    /// Paginate with a caller-owned measurement handle.
    ///
    /// The cache key covers content and configuration; callers replacing
    /// their measurement context must [`clear_cache`](Self::clear_cache)
    /// first.
    pub fn paginate_with(
        &self,
        content: &str,
        config: &LayoutConfig,
        measurer: &mut dyn TextMeasurer,
    ) -> Arc<PaginationResult> {
        let key = fingerprint(content, config);
        if let Some(hit) = self.cache.get(&key) {
            debug!("pagination cache hit ({} pages)", hit.total_pages);
            return Arc::clone(hit.value());
        }

        let result = Arc::new(layout_pages(content, config, measurer));
        if self.cache.len() >= MAX_CACHE_ENTRIES {
            debug!("pagination cache at capacity, clearing");
            self.cache.clear();
        }
        self.cache.insert(key, Arc::clone(&result));
        result
    }

    /// Re-paginate after a configuration change, preserving relative
    /// reading position.
    ///
    /// Returns the new result and the remapped 1-based page number for a
    /// reader previously at `old_page` of `old_total`. Layout always runs
    /// from the full original content, never from the prior page set.
    pub fn repaginate(
        &self,
        content: &str,
        config: &LayoutConfig,
        old_page: usize,
        old_total: usize,
    ) -> (Arc<PaginationResult>, usize) {
        let result = self.paginate(content, config);
        let new_page = remap_page(old_page, old_total, result.total_pages);
        (result, new_page)
    }

    /// Drop every cached result. Callers invoke this when their
    /// text-measurement context is invalidated.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

/// Deterministic cache key over content and configuration.
fn fingerprint(content: &str, config: &LayoutConfig) -> String {
    let mut sha = sha1_smol::Sha1::new();
    sha.update(&config.viewport_width.to_bits().to_le_bytes());
    sha.update(&config.viewport_height.to_bits().to_le_bytes());
    sha.update(&config.font_size.to_bits().to_le_bytes());
    sha.update(&config.line_height.to_bits().to_le_bytes());
    sha.update(&config.margin_horizontal.to_bits().to_le_bytes());
    sha.update(&config.margin_vertical.to_bits().to_le_bytes());
    sha.update(&config.density.to_bits().to_le_bytes());
    sha.update(content.as_bytes());
    sha.digest().to_string()
}

/// Proportionally remap a 1-based page number onto a new total.
///
/// `round((old_page - 1) / old_total * new_total) + 1`, clamped to the new
/// page range. Ties round half to even, so page 10 of 100 lands on page 5
/// of 50. This preserves relative position, not absolute content position.
pub fn remap_page(old_page: usize, old_total: usize, new_total: usize) -> usize {
    if old_total == 0 || new_total == 0 {
        return 1;
    }

    let numerator = old_page.saturating_sub(1) * new_total;
    let quotient = numerator / old_total;
    let remainder = numerator % old_total;

    let rounded = match (2 * remainder).cmp(&old_total) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    };

    (rounded + 1).clamp(1, new_total)
}

/// Estimated reading time in whole minutes: `ceil(words / wpm)`.
pub fn reading_time_minutes(word_count: usize, words_per_minute: usize) -> usize {
    if words_per_minute == 0 {
        return 0;
    }
    word_count.div_ceil(words_per_minute)
}

fn layout_pages(
    content: &str,
    config: &LayoutConfig,
    measurer: &mut dyn TextMeasurer,
) -> PaginationResult {
    let available_width = config.available_width();
    let budget = config.lines_per_page();

    let mut pages: Vec<Page> = Vec::new();

    if budget > 0 && available_width > 0.0 {
        let mut current: Vec<String> = Vec::new();

        for paragraph in content.split('\n') {
            let paragraph = paragraph.trim_end_matches('\r');
            let lines = wrap_paragraph(paragraph, available_width, measurer);

            // A whole paragraph that will not fit starts a fresh page, as
            // long as the current one has content.
            if !current.is_empty() && current.len() + lines.len() > budget {
                flush_page(&mut pages, &mut current);
            }

            let multi_line = lines.len() > 1;
            for line in lines {
                current.push(line);
                if current.len() >= budget {
                    flush_page(&mut pages, &mut current);
                }
            }

            // Blank separator after a wrapped paragraph, counted against
            // the budget like any other line.
            if multi_line {
                current.push(String::new());
                if current.len() >= budget {
                    flush_page(&mut pages, &mut current);
                }
            }
        }

        flush_page(&mut pages, &mut current);
    }

    if pages.is_empty() {
        pages.push(make_page(1, PLACEHOLDER_CONTENT.to_string()));
    }

    let total_pages = pages.len();
    let total_words = pages.iter().map(|p| p.word_count).sum();

    PaginationResult {
        pages,
        total_pages,
        total_words,
        config: *config,
    }
}

/// Greedy word wrap: words accumulate while the measured candidate stays
/// within the available width; an overflowing candidate commits the line
/// and carries the word over. A blank paragraph contributes one empty line
/// so blank-line spacing survives layout.
fn wrap_paragraph(
    paragraph: &str,
    available_width: f32,
    measurer: &mut dyn TextMeasurer,
) -> Vec<String> {
    if paragraph.trim().is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if current.is_empty() || measurer.measure(&candidate) <= available_width {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn flush_page(pages: &mut Vec<Page>, lines: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let content = lines.join("\n").trim_end().to_string();
    lines.clear();
    if content.is_empty() {
        return;
    }
    let number = pages.len() + 1;
    pages.push(make_page(number, content));
}

fn make_page(number: usize, content: String) -> Page {
    let word_count = content.split_whitespace().count();
    let char_count = content.trim().chars().count();
    Page {
        number,
        content,
        word_count,
        char_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lines_per_page: usize, chars_per_line: usize) -> LayoutConfig {
        // font_size 10, density 1.0 -> advance 5.5 units/char
        LayoutConfig {
            viewport_width: chars_per_line as f32 * 5.5,
            viewport_height: lines_per_page as f32 * 10.0,
            font_size: 10.0,
            line_height: 10.0,
            margin_horizontal: 0.0,
            margin_vertical: 0.0,
            density: 1.0,
        }
    }

    #[test]
    fn empty_content_yields_placeholder() {
        let engine = PaginationEngine::new();
        let result = engine.paginate("", &config(10, 40));
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].content, PLACEHOLDER_CONTENT);
        assert_eq!(result.pages[0].number, 1);
    }

    #[test]
    fn degenerate_viewport_yields_placeholder() {
        let engine = PaginationEngine::new();
        let result = engine.paginate("some text", &config(0, 40));
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.pages[0].content, PLACEHOLDER_CONTENT);
    }

    #[test]
    fn wraps_at_measured_width() {
        let mut measurer = HeuristicMeasurer::new(&config(10, 10));
        let lines = wrap_paragraph(
            "aaaa bbbb cccc dddd",
            config(10, 10).available_width(),
            &mut measurer,
        );
        // 10 chars per line: "aaaa bbbb" fits, "aaaa bbbb cccc" does not
        assert_eq!(lines, vec!["aaaa bbbb", "cccc dddd"]);
    }

    #[test]
    fn overlong_word_still_commits() {
        let cfg = config(10, 4);
        let mut measurer = HeuristicMeasurer::new(&cfg);
        let lines = wrap_paragraph("extraordinary it", cfg.available_width(), &mut measurer);
        assert_eq!(lines, vec!["extraordinary", "it"]);
    }

    #[test]
    fn blank_paragraph_is_one_empty_line() {
        let cfg = config(10, 10);
        let mut measurer = HeuristicMeasurer::new(&cfg);
        assert_eq!(
            wrap_paragraph("   ", cfg.available_width(), &mut measurer),
            vec![String::new()]
        );
    }

    #[test]
    fn breaks_pages_at_line_budget() {
        let engine = PaginationEngine::new();
        // 3 lines per page, one word per paragraph so each is one line
        let content = "one\ntwo\nthree\nfour\nfive";
        let result = engine.paginate(content, &config(3, 40));
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.pages[0].content, "one\ntwo\nthree");
        assert_eq!(result.pages[1].content, "four\nfive");
        assert_eq!(result.pages[0].number, 1);
        assert_eq!(result.pages[1].number, 2);
    }

    #[test]
    fn paragraph_overflow_starts_new_page() {
        let engine = PaginationEngine::new();
        // Budget 4; first paragraph wraps to 2 lines + separator = 3,
        // second wraps to 2 lines and would overflow -> new page.
        let content = "aaaa bbbb cccc dddd\naaaa bbbb cccc dddd";
        let result = engine.paginate(content, &config(4, 10));
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.pages[0].content, "aaaa bbbb\ncccc dddd");
        assert_eq!(result.pages[1].content, "aaaa bbbb\ncccc dddd");
    }

    #[test]
    fn word_and_char_counts() {
        let page = make_page(1, "hello brave  world".to_string());
        assert_eq!(page.word_count, 3);
        assert_eq!(page.char_count, 18);
    }

    #[test]
    fn total_words_sum_pages() {
        let engine = PaginationEngine::new();
        let result = engine.paginate("one two three\nfour five", &config(2, 40));
        assert_eq!(result.total_words, 5);
    }

    #[test]
    fn cache_hit_on_identical_input() {
        let engine = PaginationEngine::new();
        let cfg = config(5, 20);
        let first = engine.paginate("some repeated content here", &cfg);
        assert_eq!(engine.cache_size(), 1);
        let second = engine.paginate("some repeated content here", &cfg);
        assert_eq!(engine.cache_size(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn different_config_misses_cache() {
        let engine = PaginationEngine::new();
        engine.paginate("content", &config(5, 20));
        engine.paginate("content", &config(6, 20));
        assert_eq!(engine.cache_size(), 2);
    }

    #[test]
    fn clear_cache_empties() {
        let engine = PaginationEngine::new();
        engine.paginate("content", &config(5, 20));
        engine.clear_cache();
        assert_eq!(engine.cache_size(), 0);
    }

    #[test]
    fn remap_preserves_relative_position() {
        // round((9/100) * 50) + 1 = 5, half rounding to even
        assert_eq!(remap_page(10, 100, 50), 5);
        assert_eq!(remap_page(1, 100, 50), 1);
        assert_eq!(remap_page(100, 100, 50), 50);
        // clamped into the new range
        assert_eq!(remap_page(100, 100, 200), 199);
        assert_eq!(remap_page(7, 0, 10), 1);
        assert_eq!(remap_page(7, 10, 0), 1);
    }

    #[test]
    fn repaginate_remaps_position() {
        let engine = PaginationEngine::new();
        let content = (0..200).map(|i| format!("word{i}")).collect::<Vec<_>>().join("\n");
        let coarse = config(2, 40);
        let fine = config(4, 40);

        let first = engine.paginate(&content, &coarse);
        let old_total = first.total_pages;
        let (second, new_page) = engine.repaginate(&content, &fine, 10, old_total);
        assert_eq!(new_page, remap_page(10, old_total, second.total_pages));
        assert!(new_page >= 1 && new_page <= second.total_pages);
    }

    #[test]
    fn reading_time_is_ceiling() {
        assert_eq!(reading_time_minutes(1000, DEFAULT_WORDS_PER_MINUTE), 5);
        assert_eq!(reading_time_minutes(1001, DEFAULT_WORDS_PER_MINUTE), 6);
        assert_eq!(reading_time_minutes(0, DEFAULT_WORDS_PER_MINUTE), 0);
    }
}
