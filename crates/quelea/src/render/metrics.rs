use std::cell::RefCell;
use std::collections::HashMap;

use eframe::egui::{self, Color32, FontFamily, FontId};

use crate::theme::FontFace;

/// Measures text for the font sizer. Implementations must be monotonic in
/// `size`: a larger size never yields a smaller height or width.
pub trait FontMetrics {
    /// Height of one line of text at `size`, without extra spacing.
    fn line_height(&self, face: &FontFace, size: f32) -> f32;

    /// Rendered width of `text` on a single line at `size`.
    fn text_width(&self, face: &FontFace, size: f32, text: &str) -> f32;
}

/// Metrics derived from fixed per-character advances. Used headless (the
/// `fit` command) and in tests, where real fonts are not available.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    pub advance: f32,
    pub bold_advance: f32,
    pub line_height: f32,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self {
            advance: 0.5,
            bold_advance: 0.55,
            line_height: 1.2,
        }
    }
}

impl FontMetrics for ApproxMetrics {
    fn line_height(&self, _face: &FontFace, size: f32) -> f32 {
        size * self.line_height
    }

    fn text_width(&self, face: &FontFace, size: f32, text: &str) -> f32 {
        let advance = if face.bold {
            self.bold_advance
        } else {
            self.advance
        };
        text.chars().count() as f32 * size * advance
    }
}

/// Size at which egui glyph runs are measured; other sizes scale linearly.
const REFERENCE_SIZE: f32 = 100.0;

/// Measures with the fonts loaded into an egui context.
///
/// Layout is only possible once the context has run a frame, so this must be
/// used from inside `App::update`. Measurements are taken once per string at
/// [`REFERENCE_SIZE`] and scaled, which keeps the 0.5-step size search cheap.
pub struct EguiMetrics {
    painter: egui::Painter,
    widths: RefCell<HashMap<(FontFamily, String), f32>>,
    heights: RefCell<HashMap<FontFamily, f32>>,
}

impl EguiMetrics {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            painter: ctx.layer_painter(egui::LayerId::background()),
            widths: RefCell::new(HashMap::new()),
            heights: RefCell::new(HashMap::new()),
        }
    }

    fn measure(&self, family: FontFamily, text: &str) -> egui::Vec2 {
        self.painter
            .layout_no_wrap(
                text.to_string(),
                FontId::new(REFERENCE_SIZE, family),
                Color32::WHITE,
            )
            .rect
            .size()
    }
}

/// Map a theme font family onto one egui knows about. Only the built-in
/// proportional and monospace families are registered.
pub fn egui_family(face: &FontFace) -> FontFamily {
    if face.family.to_ascii_lowercase().contains("mono") {
        FontFamily::Monospace
    } else {
        FontFamily::Proportional
    }
}

impl FontMetrics for EguiMetrics {
    fn line_height(&self, face: &FontFace, size: f32) -> f32 {
        let family = egui_family(face);
        let reference = *self
            .heights
            .borrow_mut()
            .entry(family.clone())
            .or_insert_with(|| self.measure(family, "Ag").y);
        reference * size / REFERENCE_SIZE
    }

    fn text_width(&self, face: &FontFace, size: f32, text: &str) -> f32 {
        let family = egui_family(face);
        let reference = *self
            .widths
            .borrow_mut()
            .entry((family.clone(), text.to_string()))
            .or_insert_with(|| self.measure(family, text).x);
        // Bold is drawn one point larger, the way egui layouts emulate weight.
        let size = if face.bold { size + 1.0 } else { size };
        reference * size / REFERENCE_SIZE
    }
}
