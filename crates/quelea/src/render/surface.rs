//! Per-output state: what each surface shows and whether it is blacked or
//! cleared.
//!
//! A surface keeps an ordered child list of [`Layer`]s. The list is re-sorted
//! after every mutation so the stacking order is always
//! background < text < black < logo < notice.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::Color32;

use crate::render::background::{BackgroundImage, BackgroundNode};
use crate::render::fit::DisplayLine;
use crate::render::transition::{ColorFade, Fade, OVERLAY_FADE, TEXT_COLOR_FADE};
use crate::theme::{FontFace, Shadow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// The operator's preview on the control screen.
    Preview,
    /// Confidence monitor for the musicians: keeps chords and indentation.
    Stage,
    /// A full-screen output; the index tells multiple projectors apart.
    Projector(usize),
}

/// How much a surface is worth animating. `Low` surfaces snap between
/// states instead of fading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    HighMid,
    Mid,
    Low,
}

/// Children of a surface in stacking order, bottom first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    /// The previous background fading out above the new one.
    OutgoingBackground,
    Text,
    Black,
    Logo,
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Normal,
    Cleared,
    Blacked,
}

/// Laid-out text ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<DisplayLine>,
    pub font: FontFace,
    pub size: f32,
    pub small_text: Vec<DisplayLine>,
    pub small_size: f32,
    pub shadow: Option<Shadow>,
}

#[derive(Debug)]
pub struct SurfaceState {
    kind: SurfaceKind,
    priority: Priority,
    canvas: [f32; 2],
    clear_fade: Duration,

    cleared: bool,
    blacked: bool,
    logo: bool,
    notice: Option<String>,
    logo_image: Option<Arc<BackgroundImage>>,

    children: Vec<Layer>,
    background: Option<BackgroundNode>,
    outgoing: Option<(BackgroundNode, Fade)>,
    shown: Option<TextBlock>,
    /// Content that arrived while hidden; the inner `None` means "no text".
    pending: Option<Option<TextBlock>>,

    black_fade: Fade,
    text_fade: Fade,
    logo_fade: Fade,
    text_color: ColorFade,

    transitions: u64,
    background_changes: u64,
}

impl SurfaceState {
    pub fn new(kind: SurfaceKind, priority: Priority, canvas: [f32; 2], clear_fade: Duration) -> Self {
        let now = Instant::now();
        Self {
            kind,
            priority,
            canvas,
            clear_fade,
            cleared: false,
            blacked: false,
            logo: false,
            notice: None,
            logo_image: None,
            children: Vec::new(),
            background: None,
            outgoing: None,
            shown: None,
            pending: None,
            black_fade: Fade::settled(0.0, now),
            text_fade: Fade::settled(1.0, now),
            logo_fade: Fade::settled(0.0, now),
            text_color: ColorFade::settled(Color32::WHITE, now),
            transitions: 0,
            background_changes: 0,
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn canvas(&self) -> [f32; 2] {
        self.canvas
    }

    pub fn is_stage(&self) -> bool {
        self.kind == SurfaceKind::Stage
    }

    pub fn is_blacked(&self) -> bool {
        self.blacked
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn has_logo(&self) -> bool {
        self.logo
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn logo_image(&self) -> Option<&Arc<BackgroundImage>> {
        self.logo_image.as_ref()
    }

    pub fn visibility(&self) -> Visibility {
        if self.blacked {
            Visibility::Blacked
        } else if self.cleared {
            Visibility::Cleared
        } else {
            Visibility::Normal
        }
    }

    pub fn children(&self) -> &[Layer] {
        &self.children
    }

    pub fn background(&self) -> Option<&BackgroundNode> {
        self.background.as_ref()
    }

    pub fn outgoing_background(&self) -> Option<&BackgroundNode> {
        self.outgoing.as_ref().map(|(node, _)| node)
    }

    /// Text currently on the surface (possibly fading out).
    pub fn shown_text(&self) -> Option<&TextBlock> {
        self.shown.as_ref()
    }

    /// Whether content is waiting for the surface to become visible again.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn text_color_at(&self, now: Instant) -> Color32 {
        self.text_color.value_at(now)
    }

    /// Number of effective black/clear/restore toggles so far.
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Number of background swaps so far.
    pub fn background_changes(&self) -> u64 {
        self.background_changes
    }

    fn hidden(&self) -> bool {
        self.blacked || self.cleared
    }

    fn fade_duration(&self, animated: Duration) -> Duration {
        if self.priority == Priority::Low {
            Duration::ZERO
        } else {
            animated
        }
    }

    fn insert_child(&mut self, layer: Layer) {
        if !self.children.contains(&layer) {
            self.children.push(layer);
        }
        self.enforce_z_order();
    }

    fn remove_child(&mut self, layer: Layer) {
        self.children.retain(|&l| l != layer);
        self.enforce_z_order();
    }

    fn enforce_z_order(&mut self) {
        self.children.sort();
    }

    /// Black out (or un-black) the surface. Returns `false` if already in
    /// that state, in which case any running fade is left untouched.
    pub fn set_blacked(&mut self, blacked: bool, now: Instant) -> bool {
        if self.blacked == blacked {
            return false;
        }
        self.blacked = blacked;
        let duration = self.fade_duration(OVERLAY_FADE);
        let target = if blacked { 1.0 } else { 0.0 };
        self.black_fade = self.black_fade.retarget(target, duration, now);
        self.insert_child(Layer::Black);
        if !blacked {
            self.reveal_pending(now);
        }
        self.transitions += 1;
        tracing::debug!(surface = ?self.kind, blacked, "Black toggled");
        true
    }

    /// Hide (or show again) the text while keeping the background.
    pub fn set_cleared(&mut self, cleared: bool, now: Instant) -> bool {
        if self.cleared == cleared {
            return false;
        }
        self.cleared = cleared;
        self.fade_text(!cleared, now);
        if !cleared {
            self.reveal_pending(now);
        }
        self.transitions += 1;
        tracing::debug!(surface = ?self.kind, cleared, "Clear toggled");
        true
    }

    /// Leave both black and clear in one step.
    pub fn restore(&mut self, now: Instant) -> bool {
        if !self.hidden() {
            return false;
        }
        let duration = self.fade_duration(OVERLAY_FADE);
        if self.blacked {
            self.blacked = false;
            self.black_fade = self.black_fade.retarget(0.0, duration, now);
        }
        if self.cleared {
            self.cleared = false;
            self.fade_text(true, now);
        }
        self.reveal_pending(now);
        self.transitions += 1;
        tracing::debug!(surface = ?self.kind, "Restored");
        true
    }

    pub fn set_logo(&mut self, logo: bool, now: Instant) -> bool {
        if self.logo == logo {
            return false;
        }
        self.logo = logo;
        let duration = self.fade_duration(OVERLAY_FADE);
        let target = if logo { 1.0 } else { 0.0 };
        self.logo_fade = self.logo_fade.retarget(target, duration, now);
        self.insert_child(Layer::Logo);
        true
    }

    pub fn set_notice(&mut self, notice: Option<String>) {
        if notice.is_some() {
            self.insert_child(Layer::Notice);
        } else {
            self.remove_child(Layer::Notice);
        }
        self.notice = notice;
    }

    pub(crate) fn set_logo_image(&mut self, image: Option<Arc<BackgroundImage>>) {
        self.logo_image = image;
    }

    /// Returns `true` if the size changed.
    pub(crate) fn resize(&mut self, canvas: [f32; 2]) -> bool {
        if self.canvas == canvas {
            return false;
        }
        self.canvas = canvas;
        true
    }

    fn fade_text(&mut self, visible: bool, now: Instant) {
        let duration = self.fade_duration(self.clear_fade);
        let target = if visible { 1.0 } else { 0.0 };
        self.text_fade = self.text_fade.retarget(target, duration, now);
        if visible && self.shown.is_some() {
            self.insert_child(Layer::Text);
        }
    }

    fn reveal_pending(&mut self, now: Instant) {
        if self.hidden() {
            return;
        }
        if let Some(content) = self.pending.take() {
            self.show(content);
        }
        self.text_fade = self
            .text_fade
            .retarget(1.0, self.fade_duration(self.clear_fade), now);
    }

    fn show(&mut self, content: Option<TextBlock>) {
        self.shown = content;
        if self.shown.is_some() {
            self.insert_child(Layer::Text);
        } else {
            self.remove_child(Layer::Text);
        }
    }

    /// New text for the surface. While blacked or cleared it is held back and
    /// shown as soon as the surface is visible again.
    pub(crate) fn set_content(&mut self, content: Option<TextBlock>) {
        if self.hidden() {
            self.pending = Some(content);
        } else {
            self.show(content);
        }
    }

    /// Swap the background, crossfading from the old one. An in-flight
    /// crossfade is aborted and the new one starts from the visual weight the
    /// most recent background currently has.
    pub(crate) fn set_background(&mut self, node: BackgroundNode, fade: Duration, now: Instant) -> bool {
        if self.background.as_ref() == Some(&node) {
            return false;
        }
        let duration = self.fade_duration(fade);
        let start = match &self.outgoing {
            Some((_, running)) => 1.0 - running.value_at(now),
            None => 1.0,
        };
        match self.background.replace(node) {
            Some(previous) if !duration.is_zero() => {
                self.outgoing = Some((previous, Fade::new(start, 0.0, duration, now)));
                self.insert_child(Layer::OutgoingBackground);
            }
            _ => {
                self.outgoing = None;
                self.remove_child(Layer::OutgoingBackground);
            }
        }
        self.insert_child(Layer::Background);
        self.background_changes += 1;
        true
    }

    pub(crate) fn set_text_color(&mut self, color: Color32, animate: bool, now: Instant) {
        let duration = if animate {
            self.fade_duration(TEXT_COLOR_FADE)
        } else {
            Duration::ZERO
        };
        self.text_color = self.text_color.retarget(color, duration, now);
    }

    /// Drop children whose fade-out has finished.
    pub fn tick(&mut self, now: Instant) {
        if self
            .outgoing
            .as_ref()
            .is_some_and(|(_, fade)| fade.is_complete_at(now))
        {
            self.outgoing = None;
            self.remove_child(Layer::OutgoingBackground);
        }
        if !self.blacked && self.black_fade.is_complete_at(now) {
            self.remove_child(Layer::Black);
        }
        if !self.logo && self.logo_fade.is_complete_at(now) {
            self.remove_child(Layer::Logo);
        }
        if self.cleared && self.text_fade.is_complete_at(now) {
            self.remove_child(Layer::Text);
        }
    }

    /// Whether any fade is still running.
    pub fn is_animating(&self, now: Instant) -> bool {
        !(self.black_fade.is_complete_at(now)
            && self.text_fade.is_complete_at(now)
            && self.logo_fade.is_complete_at(now)
            && self
                .outgoing
                .as_ref()
                .is_none_or(|(_, fade)| fade.is_complete_at(now)))
    }

    fn layer_opacity(&self, layer: Layer, now: Instant) -> f32 {
        match layer {
            Layer::Background | Layer::Notice => 1.0,
            Layer::OutgoingBackground => self
                .outgoing
                .as_ref()
                .map_or(0.0, |(_, fade)| fade.value_at(now)),
            Layer::Text => self.text_fade.value_at(now),
            Layer::Black => self.black_fade.value_at(now),
            Layer::Logo => self.logo_fade.value_at(now),
        }
    }

    /// The layers that actually reach the screen at `now`, bottom first, with
    /// their opacity. Anything beneath a fully opaque black overlay is dropped.
    pub fn composite(&self, now: Instant) -> Vec<(Layer, f32)> {
        let mut layers: Vec<(Layer, f32)> = self
            .children
            .iter()
            .map(|&layer| (layer, self.layer_opacity(layer, now)))
            .filter(|&(_, opacity)| opacity > 0.0)
            .collect();
        if let Some(idx) = layers
            .iter()
            .rposition(|&(layer, opacity)| layer == Layer::Black && opacity >= 1.0)
        {
            layers.drain(..idx);
        }
        layers
    }
}
