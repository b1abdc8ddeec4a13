//! Drives every registered surface from one selection.
//!
//! Selection and theme changes are staged, then [`RenderCoordinator::flush`]
//! lays out text and swaps backgrounds once for all of them. A burst of
//! commands in one frame therefore costs a single render of the latest state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DisplayConfig;
use crate::displayable::{Displayable, TextKind};
use crate::render::background::{BackgroundNode, ThemeResolver};
use crate::render::dispatch::{Command, RenderThreadOnly};
use crate::render::fit::{DisplayLine, LineKind, TextFitter, WrapMode, capitalise_first, classify};
use crate::render::metrics::FontMetrics;
use crate::render::sizer::FontSizer;
use crate::render::surface::{Priority, SurfaceKind, SurfaceState, TextBlock};
use crate::theme::{Background, DEFAULT_THEME, Theme};

/// Fraction of the canvas kept clear on each side.
const MARGIN: f32 = 0.05;
/// Share of the text box given to small text when a section has any.
const SMALL_TEXT_SHARE: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

pub struct RenderCoordinator {
    config: DisplayConfig,
    metrics: Box<dyn FontMetrics>,
    resolver: ThemeResolver,
    surfaces: Vec<SurfaceState>,

    displayable: Option<Arc<Displayable>>,
    section: usize,
    temp_theme: Option<Theme>,
    active_theme: Option<Theme>,
    active_background: Option<(BackgroundNode, Duration)>,

    text_dirty: bool,
    theme_dirty: bool,
    renders: u64,
    _render_thread: RenderThreadOnly,
}

fn same_item(a: &Option<Arc<Displayable>>, b: &Option<Arc<Displayable>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a == b,
        (None, None) => true,
        _ => false,
    }
}

impl RenderCoordinator {
    pub fn new(config: DisplayConfig, metrics: Box<dyn FontMetrics>, resolver: ThemeResolver) -> Self {
        Self {
            config,
            metrics,
            resolver,
            surfaces: Vec::new(),
            displayable: None,
            section: 0,
            temp_theme: None,
            active_theme: None,
            active_background: None,
            text_dirty: false,
            theme_dirty: false,
            renders: 0,
            _render_thread: Default::default(),
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn displayable(&self) -> Option<&Arc<Displayable>> {
        self.displayable.as_ref()
    }

    pub fn section(&self) -> usize {
        self.section
    }

    pub fn temp_theme(&self) -> Option<&Theme> {
        self.temp_theme.as_ref()
    }

    /// Theme of the last render.
    pub fn active_theme(&self) -> Option<&Theme> {
        self.active_theme.as_ref()
    }

    /// How many flushes actually changed something.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn resolver(&self) -> &ThemeResolver {
        &self.resolver
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &SurfaceState)> {
        self.surfaces
            .iter()
            .enumerate()
            .map(|(i, s)| (SurfaceId(i), s))
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceState> {
        self.surfaces.get(id.0)
    }

    /// For black/clear/logo toggles on a single output.
    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut SurfaceState> {
        self.surfaces.get_mut(id.0)
    }

    pub fn register_surface(&mut self, kind: SurfaceKind, priority: Priority, canvas: [f32; 2]) -> SurfaceId {
        let now = Instant::now();
        let clear_fade = Duration::from_millis(self.config.clear_fade_duration_ms);
        let mut surface = SurfaceState::new(kind, priority, canvas, clear_fade);

        if let Some(path) = &self.config.logo_image {
            match self.resolver.load_image(path, [canvas[0] as u32, canvas[1] as u32]) {
                Ok(image) => surface.set_logo_image(Some(image)),
                Err(e) => tracing::warn!("Logo unavailable: {e}"),
            }
        }
        if let Some((node, _)) = &self.active_background {
            surface.set_background(node.clone(), Duration::ZERO, now);
        }
        if let Some(theme) = &self.active_theme {
            surface.set_text_color(theme.font_color, false, now);
        }

        let id = SurfaceId(self.surfaces.len());
        tracing::debug!(?kind, ?priority, "Registered surface {}", id.0);
        self.surfaces.push(surface);
        self.text_dirty = true;
        id
    }

    pub fn resize_surface(&mut self, id: SurfaceId, canvas: [f32; 2]) {
        if let Some(surface) = self.surfaces.get_mut(id.0) {
            if surface.resize(canvas) {
                self.text_dirty = true;
            }
        }
    }

    /// Select an item and section. Returns `false` if that is already the
    /// selection. Moving to a different item drops the temporary theme.
    pub fn set_displayable(&mut self, displayable: Option<Arc<Displayable>>, section: usize) -> bool {
        let item_changed = !same_item(&self.displayable, &displayable);
        if !item_changed && self.section == section {
            return false;
        }
        if item_changed {
            if self.temp_theme.take().is_some() {
                tracing::debug!("Item changed, temporary theme dropped");
            }
            self.displayable = displayable;
        }
        self.section = section;
        self.text_dirty = true;
        self.theme_dirty = true;
        true
    }

    /// Set or remove the temporary theme override. Returns `false` if an
    /// equal override is already in place.
    pub fn set_theme(&mut self, theme: Option<Theme>) -> bool {
        if self.temp_theme == theme {
            return false;
        }
        self.temp_theme = theme;
        self.theme_dirty = true;
        self.text_dirty = true;
        true
    }

    pub fn set_blacked(&mut self, blacked: bool, now: Instant) {
        for surface in &mut self.surfaces {
            surface.set_blacked(blacked, now);
        }
    }

    pub fn set_cleared(&mut self, cleared: bool, now: Instant) {
        for surface in &mut self.surfaces {
            surface.set_cleared(cleared, now);
        }
    }

    pub fn restore(&mut self, now: Instant) {
        for surface in &mut self.surfaces {
            surface.restore(now);
        }
    }

    pub fn set_logo(&mut self, logo: bool, now: Instant) {
        for surface in &mut self.surfaces {
            surface.set_logo(logo, now);
        }
    }

    pub fn set_notice(&mut self, notice: Option<String>) {
        for surface in &mut self.surfaces {
            surface.set_notice(notice.clone());
        }
    }

    /// Apply commands in order, then render once.
    pub fn apply(&mut self, commands: impl IntoIterator<Item = Command>, now: Instant) {
        for command in commands {
            match command {
                Command::SetDisplayable {
                    displayable,
                    section,
                } => {
                    self.set_displayable(displayable, section);
                }
                Command::SetTheme(theme) => {
                    self.set_theme(theme);
                }
                Command::SetBlacked(blacked) => self.set_blacked(blacked, now),
                Command::SetCleared(cleared) => self.set_cleared(cleared, now),
                Command::Restore => self.restore(now),
                Command::SetLogo(logo) => self.set_logo(logo, now),
                Command::SetNotice(notice) => self.set_notice(notice),
            }
        }
        self.flush(now);
    }

    /// Advance fades and drop finished layers.
    pub fn tick(&mut self, now: Instant) {
        for surface in &mut self.surfaces {
            surface.tick(now);
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.surfaces.iter().any(|s| s.is_animating(now))
    }

    /// Push staged changes to the surfaces. Does nothing until at least one
    /// surface is registered.
    pub fn flush(&mut self, now: Instant) {
        if self.surfaces.is_empty() || !(self.text_dirty || self.theme_dirty) {
            return;
        }
        let theme = self.effective_theme();

        if self.theme_dirty {
            self.theme_dirty = false;
            if let Some(theme) = &theme {
                self.apply_theme(theme, now);
            }
        }

        if self.text_dirty {
            self.text_dirty = false;
            let theme = theme
                .or_else(|| self.active_theme.clone())
                .unwrap_or_else(|| DEFAULT_THEME.clone());
            for i in 0..self.surfaces.len() {
                let content = self.layout(&self.surfaces[i], &theme);
                self.surfaces[i].set_content(content);
            }
        }

        self.renders += 1;
    }

    /// Temporary override, else the section's own theme, else the item's,
    /// else the default. Media items show their content as the background.
    /// `None` keeps whatever is on screen.
    fn effective_theme(&self) -> Option<Theme> {
        let displayable = self.displayable.as_deref()?;
        let base = || {
            self.temp_theme
                .clone()
                .unwrap_or_else(|| DEFAULT_THEME.clone())
        };
        match displayable {
            Displayable::Text(item) => Some(self.temp_theme.clone().unwrap_or_else(|| {
                item.section_theme(self.section)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_THEME.clone())
            })),
            Displayable::Image(media) => {
                Some(base().with_background(Background::Image(media.path.clone())))
            }
            Displayable::Video(media) => Some(base().with_background(Background::Video {
                path: media.path.clone(),
                hue: 0.0,
            })),
            Displayable::Presentation(p) => p
                .slides
                .get(self.section)
                .map(|slide| base().with_background(Background::Image(slide.clone()))),
            Displayable::Audio(_) => self.temp_theme.clone(),
        }
    }

    fn apply_theme(&mut self, theme: &Theme, now: Instant) {
        if self.active_theme.as_ref() == Some(theme) {
            return;
        }
        let canvas = self.surfaces.iter().fold([0u32; 2], |[w, h], s| {
            let [sw, sh] = s.canvas();
            [w.max(sw as u32), h.max(sh as u32)]
        });
        if let Some(resolved) = self.resolver.resolve(theme, canvas) {
            for surface in &mut self.surfaces {
                surface.set_background(resolved.background.clone(), resolved.fade, now);
            }
            self.active_background = Some((resolved.background, resolved.fade));
        }
        // Video items have sound; video backgrounds do not.
        if matches!(self.displayable.as_deref(), Some(Displayable::Video(_))) {
            self.resolver.player_mut().set_mute(false);
        }

        let animate = self.active_theme.is_some();
        for surface in &mut self.surfaces {
            surface.set_text_color(theme.font_color, animate, now);
        }
        tracing::debug!(theme = %theme.name, "Theme applied");
        self.active_theme = Some(theme.clone());
    }

    /// Lines of one section as `surface` shows them: chords kept only on the
    /// stage view, optional capitalisation, then wrapped.
    fn section_lines(&self, lines: &[String], kind: TextKind, stage: bool) -> Vec<DisplayLine> {
        let prepared: Vec<String> = lines
            .iter()
            .filter(|l| stage || classify(l) != LineKind::Chord)
            .map(|l| {
                if self.config.capitalise_first_letter {
                    capitalise_first(l)
                } else {
                    l.clone()
                }
            })
            .collect();
        let (max_chars, mode) = match kind {
            TextKind::Song => (self.config.max_chars, WrapMode::Smart),
            TextKind::Bible => (self.config.max_bible_chars, WrapMode::Dumb),
        };
        TextFitter::new(max_chars, mode)
            .preserving_whitespace(stage)
            .wrap(&prepared)
    }

    fn layout(&self, surface: &SurfaceState, theme: &Theme) -> Option<TextBlock> {
        let Some(Displayable::Text(item)) = self.displayable.as_deref() else {
            return None;
        };
        let section = item.sections.get(self.section)?;
        let stage = surface.is_stage();

        let [w, h] = surface.canvas();
        let box_w = w * (1.0 - 2.0 * MARGIN);
        let box_h = h * (1.0 - 2.0 * MARGIN);
        let has_small_text = self.config.show_small_text
            && item.sections.iter().any(|s| !s.small_text.is_empty());
        let (main_h, small_h) = if has_small_text {
            (box_h * (1.0 - SMALL_TEXT_SHARE), box_h * SMALL_TEXT_SHARE)
        } else {
            (box_h, 0.0)
        };

        let sizer = FontSizer::new(self.metrics.as_ref(), self.config.additional_line_spacing);
        let lines = self.section_lines(&section.lines, item.kind, stage);
        let size = if self.config.use_uniform_font_size {
            let all: Vec<Vec<DisplayLine>> = item
                .sections
                .iter()
                .map(|s| self.section_lines(&s.lines, item.kind, stage))
                .collect();
            sizer.uniform_size(&theme.font, &all, box_w, main_h, self.config.max_font_size)
        } else {
            sizer.pick_size(&theme.font, &lines, box_w, main_h, self.config.max_font_size)
        };

        let (small_text, small_size) = if has_small_text {
            let small: Vec<DisplayLine> = section.small_text.iter().map(DisplayLine::new).collect();
            let small_size = FontSizer::new(self.metrics.as_ref(), 0.0).pick_size(
                &theme.font,
                &small,
                box_w,
                small_h,
                self.config.max_font_size,
            );
            (small, small_size)
        } else {
            (Vec::new(), 0.0)
        };

        Some(TextBlock {
            lines,
            font: theme.font.clone(),
            size,
            small_text,
            small_size,
            shadow: theme.shadow.filter(|_| self.config.text_shadow_enabled),
        })
    }
}
