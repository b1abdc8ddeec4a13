use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use eframe::egui::{self, Color32, FontId, Pos2, Rect, Vec2};

use crate::render::background::{BackgroundImage, BackgroundNode};
use crate::render::metrics::egui_family;
use crate::render::surface::{Layer, SurfaceState, TextBlock};
use crate::theme::{FontFace, Theme};

/// Height of the notice banner as a share of the surface.
const NOTICE_HEIGHT: f32 = 0.08;
/// Logo width as a share of the surface.
const LOGO_WIDTH: f32 = 0.4;

/// GPU textures for decoded images, uploaded on first use.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<(PathBuf, [usize; 2]), egui::TextureHandle>,
}

impl TextureCache {
    pub fn get_or_load(&mut self, ctx: &egui::Context, image: &BackgroundImage) -> egui::TextureId {
        self.textures
            .entry((image.path.clone(), image.size))
            .or_insert_with(|| {
                ctx.load_texture(
                    image.path.display().to_string(),
                    egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba),
                    egui::TextureOptions::LINEAR,
                )
            })
            .id()
    }
}

/// Largest rect with the aspect ratio of `size` centred inside `outer`.
pub fn fit_rect(outer: Rect, size: [usize; 2]) -> Rect {
    let [w, h] = size;
    if w == 0 || h == 0 {
        return outer;
    }
    let scale = (outer.width() / w as f32).min(outer.height() / h as f32);
    Rect::from_center_size(outer.center(), Vec2::new(w as f32 * scale, h as f32 * scale))
}

/// Everything needed to draw one surface into a rect of the window.
pub struct SurfacePainter<'a> {
    pub painter: &'a egui::Painter,
    pub textures: &'a mut TextureCache,
    pub chord_color: Color32,
    pub line_spacing: f32,
}

impl SurfacePainter<'_> {
    pub fn paint(&mut self, rect: Rect, surface: &SurfaceState, now: Instant) {
        // Surfaces lay out against their canvas; the pane may be smaller.
        let scale = rect.width() / surface.canvas()[0].max(1.0);
        self.painter.rect_filled(rect, 0.0, Color32::BLACK);

        for (layer, opacity) in surface.composite(now) {
            match layer {
                Layer::Background => {
                    if let Some(node) = surface.background() {
                        self.paint_background(rect, node, 1.0);
                    }
                }
                Layer::OutgoingBackground => {
                    if let Some(node) = surface.outgoing_background() {
                        self.paint_background(rect, node, opacity);
                    }
                }
                Layer::Text => {
                    if let Some(block) = surface.shown_text() {
                        let color = surface.text_color_at(now);
                        let chords = if surface.is_stage() {
                            self.chord_color
                        } else {
                            color
                        };
                        self.paint_text(rect, block, scale, color, chords, opacity);
                    }
                }
                Layer::Black => {
                    self.painter
                        .rect_filled(rect, 0.0, Theme::with_opacity(Color32::BLACK, opacity));
                }
                Layer::Logo => {
                    if let Some(logo) = surface.logo_image() {
                        let texture = self.textures.get_or_load(self.painter.ctx(), logo);
                        let area = Rect::from_center_size(
                            rect.center(),
                            rect.size() * Vec2::new(LOGO_WIDTH, LOGO_WIDTH * 1.5),
                        );
                        self.image(texture, fit_rect(area, logo.size), opacity);
                    }
                }
                Layer::Notice => {
                    if let Some(notice) = surface.notice() {
                        self.paint_notice(rect, notice);
                    }
                }
            }
        }
    }

    fn image(&self, texture: egui::TextureId, rect: Rect, opacity: f32) {
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        self.painter.image(
            texture,
            rect,
            uv,
            Theme::with_opacity(Color32::WHITE, opacity),
        );
    }

    fn paint_background(&mut self, rect: Rect, node: &BackgroundNode, opacity: f32) {
        match node {
            BackgroundNode::Color(color) => {
                self.painter
                    .rect_filled(rect, 0.0, Theme::with_opacity(*color, opacity));
            }
            BackgroundNode::Image(image) => {
                let texture = self.textures.get_or_load(self.painter.ctx(), image);
                self.image(texture, fit_rect(rect, image.size), opacity);
            }
            // Frames come from the media backend.
            BackgroundNode::Video(_) => {}
        }
    }

    fn line_galley(
        &self,
        text: &str,
        face: &FontFace,
        size: f32,
        color: Color32,
    ) -> std::sync::Arc<egui::Galley> {
        let size = if face.bold { size + 1.0 } else { size };
        let mut job = egui::text::LayoutJob::default();
        job.append(
            text,
            0.0,
            egui::text::TextFormat {
                font_id: FontId::new(size.max(1.0), egui_family(face)),
                color,
                italics: face.italic,
                ..Default::default()
            },
        );
        self.painter.layout_job(job)
    }

    fn paint_text(
        &self,
        rect: Rect,
        block: &TextBlock,
        scale: f32,
        color: Color32,
        chord_color: Color32,
        opacity: f32,
    ) {
        let spacing = self.line_spacing * scale;
        let mut rows = Vec::with_capacity(block.lines.len());
        for line in &block.lines {
            let fill = if line.is_chord() { chord_color } else { color };
            let fill = Theme::with_opacity(fill, opacity);
            rows.push((
                line.text(),
                self.line_galley(line.text(), &block.font, block.size * scale, fill),
                fill,
            ));
        }
        let total: f32 = rows.iter().map(|(_, g, _)| g.rect.height() + spacing).sum();
        let mut y = rect.center().y - total / 2.0;

        for (text, galley, fill) in rows {
            let pos = Pos2::new(rect.center().x - galley.rect.width() / 2.0, y);
            if let Some(shadow) = block.shadow {
                let shade = Theme::with_opacity(shadow.color, opacity);
                let offset = Vec2::new(shadow.offset_x, shadow.offset_y) * scale;
                let galley = self.line_galley(text, &block.font, block.size * scale, shade);
                self.painter.galley(pos + offset, galley, shade);
            }
            y += galley.rect.height() + spacing;
            self.painter.galley(pos, galley, fill);
        }

        let mut y = rect.bottom() - rect.height() * 0.02;
        for line in block.small_text.iter().rev() {
            let galley = self.line_galley(
                line.text(),
                &block.font,
                block.small_size * scale,
                Theme::with_opacity(color, opacity),
            );
            y -= galley.rect.height();
            let pos = Pos2::new(rect.right() - rect.width() * 0.02 - galley.rect.width(), y);
            self.painter.galley(pos, galley, color);
        }
    }

    fn paint_notice(&self, rect: Rect, notice: &str) {
        let height = rect.height() * NOTICE_HEIGHT;
        let band = Rect::from_min_max(Pos2::new(rect.left(), rect.bottom() - height), rect.max);
        self.painter
            .rect_filled(band, 0.0, Color32::from_black_alpha(180));
        self.painter.text(
            band.center(),
            egui::Align2::CENTER_CENTER,
            notice,
            FontId::proportional(height * 0.6),
            Color32::WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_rect_letterboxes_wide_images() {
        let outer = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 200.0));
        let fitted = fit_rect(outer, [400, 100]);
        assert_eq!(fitted.size(), Vec2::new(200.0, 50.0));
        assert_eq!(fitted.center(), outer.center());
    }

    #[test]
    fn test_fit_rect_pillarboxes_tall_images() {
        let outer = Rect::from_min_size(Pos2::ZERO, Vec2::new(160.0, 90.0));
        let fitted = fit_rect(outer, [9, 16]);
        assert!((fitted.height() - 90.0).abs() < 1e-3);
        assert!(fitted.width() < 160.0);
    }

    #[test]
    fn test_fit_rect_empty_size_fills() {
        let outer = Rect::from_min_size(Pos2::ZERO, Vec2::new(10.0, 10.0));
        assert_eq!(fit_rect(outer, [0, 5]), outer);
    }
}
