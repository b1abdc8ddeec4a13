mod visibility;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::Color32;

use super::background::{MediaPlayer, ThemeResolver};
use super::coordinator::{RenderCoordinator, SurfaceId};
use super::fit::DisplayLine;
use super::metrics::ApproxMetrics;
use super::surface::{Priority, SurfaceKind, TextBlock};
use crate::config::DisplayConfig;
use crate::displayable::{Displayable, Section, TextItem, TextKind};
use crate::error::{ResourceError, ResourceResult};
use crate::theme::{Background, DEFAULT_THEME, Theme};

/// Media player that logs every call instead of playing anything.
#[derive(Default)]
pub(crate) struct RecordingPlayer {
    calls: Rc<RefCell<Vec<String>>>,
    playing: bool,
    fail: bool,
}

impl RecordingPlayer {
    /// A player whose every `play` fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Shared handle to the call log, valid after the player is boxed.
    pub(crate) fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }
}

impl MediaPlayer for RecordingPlayer {
    fn play(&mut self, path: &Path, hue: f32) -> ResourceResult<()> {
        if self.fail {
            return Err(ResourceError::Media {
                path: path.to_path_buf(),
                reason: "cannot open".to_string(),
            });
        }
        self.calls
            .borrow_mut()
            .push(format!("play {} {hue}", path.display()));
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.borrow_mut().push("pause".to_string());
        self.playing = false;
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push("stop".to_string());
        self.playing = false;
    }

    fn set_mute(&mut self, mute: bool) {
        self.calls.borrow_mut().push(format!("mute {mute}"));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

pub(crate) fn theme_with(background: Background) -> Theme {
    Theme {
        name: "test".to_string(),
        ..DEFAULT_THEME.with_background(background)
    }
}

/// A theme distinguished by name, background and text colour.
pub(crate) fn named_theme(name: &str, background: Color32, font_color: Color32) -> Theme {
    Theme {
        name: name.to_string(),
        font_color,
        ..DEFAULT_THEME.with_background(Background::Color(background))
    }
}

pub(crate) fn text_block(lines: &[&str]) -> TextBlock {
    TextBlock {
        lines: lines.iter().map(|l| DisplayLine::new(*l)).collect(),
        font: DEFAULT_THEME.font.clone(),
        size: 40.0,
        small_text: Vec::new(),
        small_size: 0.0,
        shadow: None,
    }
}

fn section(lines: &[&str]) -> Section {
    Section {
        lines: lines.iter().map(|l| l.to_string()).collect(),
        ..Section::default()
    }
}

fn text_item(kind: TextKind, sections: &[&[&str]]) -> Arc<Displayable> {
    Arc::new(Displayable::Text(TextItem {
        title: "Amazing Grace".to_string(),
        kind,
        sections: sections.iter().map(|s| section(s)).collect(),
        theme: None,
    }))
}

fn song(sections: &[&[&str]]) -> Arc<Displayable> {
    text_item(TextKind::Song, sections)
}

fn coordinator_with(config: DisplayConfig, player: RecordingPlayer) -> RenderCoordinator {
    RenderCoordinator::new(
        config,
        Box::new(ApproxMetrics::default()),
        ThemeResolver::new(Box::new(player), Duration::from_millis(1000)),
    )
}

fn coordinator() -> RenderCoordinator {
    coordinator_with(DisplayConfig::default(), RecordingPlayer::default())
}

fn projector(c: &mut RenderCoordinator) -> SurfaceId {
    c.register_surface(SurfaceKind::Projector(0), Priority::High, [1920.0, 1080.0])
}

fn preview(c: &mut RenderCoordinator) -> SurfaceId {
    c.register_surface(SurfaceKind::Preview, Priority::Low, [480.0, 270.0])
}

fn stage(c: &mut RenderCoordinator) -> SurfaceId {
    c.register_surface(SurfaceKind::Stage, Priority::Mid, [1280.0, 720.0])
}

/// Text lines currently shown on a surface.
fn shown(c: &RenderCoordinator, id: SurfaceId) -> Vec<String> {
    c.surface(id)
        .and_then(|s| s.shown_text())
        .map(|t| t.lines.iter().map(|l| l.text().to_string()).collect())
        .unwrap_or_default()
}
