use std::path::PathBuf;
use std::sync::Arc;

use crate::theme::Theme;

/// Something that can be put in the schedule and shown on the output surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Displayable {
    Text(TextItem),
    Image(MediaItem),
    Video(MediaItem),
    Audio(MediaItem),
    Presentation(PresentationItem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Song,
    /// Bible passages wrap word by word rather than at delimiters.
    Bible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub title: String,
    pub kind: TextKind,
    pub sections: Vec<Section>,
    /// Item-wide theme, used by sections without their own.
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
    /// Secondary text, e.g. a copyright line or passage reference.
    pub small_text: Vec<String>,
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub title: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationItem {
    pub title: String,
    /// One pre-rendered image per slide.
    pub slides: Vec<PathBuf>,
}

/// The ordered items of a service.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub title: Option<String>,
    pub items: Vec<Arc<Displayable>>,
    /// Named themes in declaration order, offered as temporary overrides.
    pub themes: Vec<Theme>,
}

impl Displayable {
    pub fn title(&self) -> &str {
        match self {
            Self::Text(t) => &t.title,
            Self::Image(m) | Self::Video(m) | Self::Audio(m) => &m.title,
            Self::Presentation(p) => &p.title,
        }
    }

    /// Number of selectable sections. Single-shot media count as one.
    pub fn section_count(&self) -> usize {
        match self {
            Self::Text(t) => t.sections.len(),
            Self::Presentation(p) => p.slides.len(),
            Self::Image(_) | Self::Video(_) | Self::Audio(_) => 1,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Text(TextItem {
                kind: TextKind::Song,
                ..
            }) => "Song",
            Self::Text(TextItem {
                kind: TextKind::Bible,
                ..
            }) => "Bible",
            Self::Image(_) => "Image",
            Self::Video(_) => "Video",
            Self::Audio(_) => "Audio",
            Self::Presentation(_) => "Presentation",
        }
    }
}

impl TextItem {
    /// Base theme of a section: its own, else the item's, else none.
    pub fn section_theme(&self, index: usize) -> Option<&Theme> {
        self.sections
            .get(index)
            .and_then(|s| s.theme.as_ref())
            .or(self.theme.as_ref())
    }
}
