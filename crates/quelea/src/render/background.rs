use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::Color32;
use image::imageops::FilterType;

use crate::error::{ResourceError, ResourceResult};
use crate::theme::{Background, Theme};

/// The video backend. Frames are drawn by the backend itself, so the renderer
/// only tells it what to play.
pub trait MediaPlayer {
    fn play(&mut self, path: &Path, hue: f32) -> ResourceResult<()>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_mute(&mut self, mute: bool);
    fn is_playing(&self) -> bool;
}

/// Stands in when no video backend is available: every video fails to open,
/// so video themes keep the previous background.
#[derive(Debug, Default)]
pub struct NoVideo;

impl MediaPlayer for NoVideo {
    fn play(&mut self, path: &Path, _hue: f32) -> ResourceResult<()> {
        Err(ResourceError::Media {
            path: path.to_path_buf(),
            reason: "no video backend available".to_string(),
        })
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {}

    fn set_mute(&mut self, _mute: bool) {}

    fn is_playing(&self) -> bool {
        false
    }
}

/// A decoded image scaled to fit the canvas, RGBA8, row major.
#[derive(Debug, PartialEq)]
pub struct BackgroundImage {
    pub path: PathBuf,
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

/// Drawable background content.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundNode {
    /// Solid fill covering the whole canvas.
    Color(Color32),
    Image(Arc<BackgroundImage>),
    /// Transparent; the media backend draws the frames.
    Video(PathBuf),
}

/// What the surfaces need to show a theme's background.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub background: BackgroundNode,
    /// Crossfade from the previous background.
    pub fade: Duration,
}

/// Turns theme backgrounds into drawable nodes.
pub struct ThemeResolver {
    player: Box<dyn MediaPlayer>,
    fade: Duration,
    images: HashMap<(PathBuf, [u32; 2]), Arc<BackgroundImage>>,
    active: Option<Background>,
}

impl ThemeResolver {
    pub fn new(player: Box<dyn MediaPlayer>, fade: Duration) -> Self {
        Self {
            player,
            fade,
            images: HashMap::new(),
            active: None,
        }
    }

    pub fn player(&self) -> &dyn MediaPlayer {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> &mut dyn MediaPlayer {
        self.player.as_mut()
    }

    /// The background last resolved successfully.
    pub fn active(&self) -> Option<&Background> {
        self.active.as_ref()
    }

    /// Resolve the theme's background for a canvas of `canvas` pixels.
    ///
    /// Returns `None` when the background is unchanged or its resource cannot
    /// be loaded; in both cases the surfaces keep what they show.
    pub fn resolve(&mut self, theme: &Theme, canvas: [u32; 2]) -> Option<Resolved> {
        if self.active.as_ref() == Some(&theme.background) {
            return None;
        }

        let node = match &theme.background {
            Background::Color(color) => BackgroundNode::Color(*color),
            Background::Image(path) => match self.load_image(path, canvas) {
                Ok(image) => BackgroundNode::Image(image),
                Err(e) => {
                    tracing::warn!("Keeping previous background: {e}");
                    return None;
                }
            },
            Background::Video { path, hue } => {
                if let Err(e) = self.player.play(path, *hue) {
                    tracing::warn!("Keeping previous background: {e}");
                    return None;
                }
                self.player.set_mute(true);
                BackgroundNode::Video(path.clone())
            }
        };

        let leaving_video = matches!(self.active, Some(Background::Video { .. }))
            && !matches!(theme.background, Background::Video { .. });
        if leaving_video {
            self.player.stop();
        }

        tracing::debug!(theme = %theme.name, "Resolved new background");
        self.active = Some(theme.background.clone());
        Some(Resolved {
            background: node,
            fade: self.fade,
        })
    }

    /// Decode an image and scale it to fit within `canvas`, preserving its
    /// aspect ratio. Results are cached per path and canvas size.
    pub fn load_image(
        &mut self,
        path: &Path,
        canvas: [u32; 2],
    ) -> ResourceResult<Arc<BackgroundImage>> {
        let key = (path.to_path_buf(), canvas);
        if let Some(image) = self.images.get(&key) {
            return Ok(Arc::clone(image));
        }
        let decoded = image::open(path).map_err(|source| ResourceError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ResourceError::EmptyImage(path.to_path_buf()));
        }
        let [w, h] = canvas;
        let scaled = if w > 0 && h > 0 {
            decoded.resize(w, h, FilterType::Triangle)
        } else {
            decoded
        };
        let rgba = scaled.into_rgba8();
        let image = Arc::new(BackgroundImage {
            path: path.to_path_buf(),
            size: [rgba.width() as usize, rgba.height() as usize],
            rgba: rgba.into_raw(),
        });
        self.images.insert(key, Arc::clone(&image));
        Ok(image)
    }
}
