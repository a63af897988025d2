//! The text-measurement seam.
//!
//! Rendering backends measure real glyph runs; the engine only needs a
//! width in the same units as the viewport. The measurer is caller-owned
//! and passed per pagination call, with font configuration fixed at
//! construction, so no measurement state is ever shared implicitly
//! between calls.

use super::LayoutConfig;

/// Measures candidate lines of text for the layout engine.
///
/// Implementations may keep a reusable measurement context internally;
/// font configuration must be applied when the measurer is constructed,
/// never assumed from a previous call.
pub trait TextMeasurer {
    /// Rendered width of `line`, in the same units as the viewport width.
    fn measure(&mut self, line: &str) -> f32;
}

/// Average glyph advance estimated from font size and density.
///
/// The 0.55 factor approximates the width/em ratio of common body serif
/// faces.
pub(crate) fn glyph_advance(config: &LayoutConfig) -> f32 {
    config.font_size * 0.55 * config.density
}

/// Character-count measurer seeded from the layout configuration.
///
/// Used when no rendering backend is available; a real backend supersedes
/// it via [`TextMeasurer`].
#[derive(Debug, Clone, Copy)]
pub struct HeuristicMeasurer {
    advance: f32,
}

impl HeuristicMeasurer {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            advance: glyph_advance(config),
        }
    }
}

impl TextMeasurer for HeuristicMeasurer {
    fn measure(&mut self, line: &str) -> f32 {
        line.chars().count() as f32 * self.advance
    }
}
