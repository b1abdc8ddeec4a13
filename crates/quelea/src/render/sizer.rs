use crate::render::fit::DisplayLine;
use crate::render::metrics::FontMetrics;
use crate::theme::FontFace;

/// Amount the size shrinks per step of the search.
pub const SIZE_STEP: f32 = 0.5;
/// Smallest size ever returned; text that does not fit at this size is drawn anyway.
pub const MIN_FONT_SIZE: f32 = 1.0;

/// Picks the largest font size at which a block of lines fits a box.
pub struct FontSizer<'m> {
    metrics: &'m dyn FontMetrics,
    /// Extra vertical space added below every line.
    pub line_spacing: f32,
}

impl<'m> FontSizer<'m> {
    pub fn new(metrics: &'m dyn FontMetrics, line_spacing: f32) -> Self {
        Self {
            metrics,
            line_spacing,
        }
    }

    /// Shrink from `start_size` until the block fits `box_height`, then until
    /// the widest line fits `box_width`.
    ///
    /// The widest line is chosen once, after the height pass, so the width
    /// pass measures a single string per step.
    pub fn pick_size(
        &self,
        face: &FontFace,
        lines: &[DisplayLine],
        box_width: f32,
        box_height: f32,
        start_size: f32,
    ) -> f32 {
        let mut size = if start_size.is_finite() {
            start_size.max(MIN_FONT_SIZE)
        } else {
            MIN_FONT_SIZE
        };
        if lines.is_empty() {
            return size;
        }

        let count = lines.len() as f32;
        while (self.metrics.line_height(face, size) + self.line_spacing) * count > box_height {
            size -= SIZE_STEP;
            if size < MIN_FONT_SIZE {
                return MIN_FONT_SIZE;
            }
        }

        let widest = lines
            .iter()
            .map(|l| (l, self.metrics.text_width(face, size, l.text())))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(l, _)| l.text());
        let Some(widest) = widest else {
            return size;
        };

        while self.metrics.text_width(face, size, widest) > box_width {
            size -= SIZE_STEP;
            if size < MIN_FONT_SIZE {
                return MIN_FONT_SIZE;
            }
        }
        size
    }

    /// One size for every section of an item, so moving between sections
    /// never rescales the text: the smallest of the per-section sizes.
    pub fn uniform_size(
        &self,
        face: &FontFace,
        sections: &[Vec<DisplayLine>],
        box_width: f32,
        box_height: f32,
        start_size: f32,
    ) -> f32 {
        smallest(
            sections
                .iter()
                .map(|lines| self.pick_size(face, lines, box_width, box_height, start_size)),
        )
        .unwrap_or_else(|| start_size.max(MIN_FONT_SIZE))
    }
}

/// Minimum of a set of sizes, `None` when empty.
pub fn smallest(sizes: impl IntoIterator<Item = f32>) -> Option<f32> {
    sizes.into_iter().reduce(f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::metrics::ApproxMetrics;

    fn face() -> FontFace {
        FontFace {
            family: "Noto Sans".to_string(),
            bold: false,
            italic: false,
        }
    }

    fn lines(texts: &[&str]) -> Vec<DisplayLine> {
        texts.iter().map(|t| DisplayLine::new(*t)).collect()
    }

    #[test]
    fn test_fitting_text_keeps_start_size() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 0.0);
        let size = sizer.pick_size(&face(), &lines(&["short"]), 1000.0, 1000.0, 40.0);
        assert_eq!(size, 40.0);
    }

    #[test]
    fn test_height_bound_shrinks_below_start() {
        // At 40 each line takes 48 + 10; the box holds three of them.
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 10.0);
        let box_height = 3.0 * (40.0 * 1.2 + 10.0);
        let three = lines(&["a", "b", "c"]);
        let five = lines(&["a", "b", "c", "d", "e"]);
        assert_eq!(sizer.pick_size(&face(), &three, 2000.0, box_height, 40.0), 40.0);
        let size = sizer.pick_size(&face(), &five, 2000.0, box_height, 40.0);
        assert!(size < 40.0);
        assert!((metrics.line_height(&face(), size) + 10.0) * 5.0 <= box_height);
    }

    #[test]
    fn test_width_bound_uses_widest_line() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 0.0);
        // 20 chars at 0.5 advance: width = 10 * size, so a 300 wide box allows 30.
        let size = sizer.pick_size(
            &face(),
            &lines(&["tiny", "twenty characters!!!"]),
            300.0,
            10_000.0,
            100.0,
        );
        assert_eq!(size, 30.0);
    }

    #[test]
    fn test_never_below_minimum() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 10.0);
        let size = sizer.pick_size(&face(), &lines(&["a"; 50]), 10.0, 10.0, 100.0);
        assert_eq!(size, MIN_FONT_SIZE);
    }

    #[test]
    fn test_degenerate_start_size_is_clamped() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 0.0);
        assert_eq!(sizer.pick_size(&face(), &lines(&["a"]), 100.0, 100.0, 0.2), 1.0);
        assert_eq!(
            sizer.pick_size(&face(), &lines(&["a"]), 100.0, 100.0, f32::NAN),
            1.0
        );
    }

    #[test]
    fn test_size_never_grows_with_more_lines() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 10.0);
        let all = [
            "Amazing grace",
            "how sweet the sound",
            "that saved a wretch",
            "like me",
            "I once was lost",
            "but now am found",
        ];
        let mut previous = f32::INFINITY;
        for n in 1..=all.len() {
            let size = sizer.pick_size(&face(), &lines(&all[..n]), 800.0, 450.0, 200.0);
            assert!(size <= previous, "{n} lines grew to {size} from {previous}");
            previous = size;
        }
    }

    #[test]
    fn test_smallest_of_sections() {
        assert_eq!(smallest([40.0, 32.0, 55.0]), Some(32.0));
        assert_eq!(smallest(std::iter::empty()), None);
    }

    #[test]
    fn test_uniform_size_is_minimum_across_sections() {
        let metrics = ApproxMetrics::default();
        let sizer = FontSizer::new(&metrics, 0.0);
        let sections = vec![
            lines(&["short"]),
            lines(&["a considerably longer line"]),
            lines(&["mid length"]),
        ];
        let individual: Vec<f32> = sections
            .iter()
            .map(|s| sizer.pick_size(&face(), s, 500.0, 500.0, 100.0))
            .collect();
        let uniform = sizer.uniform_size(&face(), &sections, 500.0, 500.0, 100.0);
        assert_eq!(Some(uniform), smallest(individual.iter().copied()));
        assert!(individual.iter().all(|&s| uniform <= s));
    }
}
