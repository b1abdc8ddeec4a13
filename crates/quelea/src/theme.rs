use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

/// The theme used when neither a section nor its item carries one.
pub static DEFAULT_THEME: LazyLock<Theme> = LazyLock::new(|| Theme {
    name: "default".to_string(),
    font: FontFace {
        family: "Noto Sans".to_string(),
        bold: false,
        italic: false,
    },
    font_color: Color32::WHITE,
    background: Background::Color(Color32::BLACK),
    shadow: Some(Shadow {
        offset_x: 3.0,
        offset_y: 3.0,
        radius: 6.0,
        color: Color32::from_black_alpha(200),
    }),
});

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub font: FontFace,
    pub font_color: Color32,
    pub background: Background,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontFace {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Color32),
    Image(PathBuf),
    /// `hue` is a 0..1 rotation handed to the media backend.
    Video { path: PathBuf, hue: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub radius: f32,
    pub color: Color32,
}

impl Theme {
    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        let alpha = color.a() as f32 * opacity.clamp(0.0, 1.0);
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha as u8)
    }

    /// A copy of this theme with a different background, used for image,
    /// video and presentation items whose content *is* the background.
    pub fn with_background(&self, background: Background) -> Self {
        Self {
            background,
            ..self.clone()
        }
    }
}

/// A theme as written in a schedule file's frontmatter. Every field is
/// optional and falls back to [`DEFAULT_THEME`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,

    /// `"x,y,radius,#color"` or `"none"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<String>,
}

impl ThemeDef {
    /// Resolve the definition into a concrete theme. Relative media paths are
    /// joined onto `base_path`.
    pub fn build(&self, name: &str, base_path: &Path) -> Result<Theme> {
        let default = &*DEFAULT_THEME;
        let font_color = match &self.color {
            Some(c) => parse_color(c).with_context(|| format!("theme '{name}': color"))?,
            None => default.font_color,
        };
        let background = match &self.background {
            Some(b) => {
                parse_background(b, base_path).with_context(|| format!("theme '{name}': background"))?
            }
            None => default.background.clone(),
        };
        let shadow = match self.shadow.as_deref() {
            Some("none") => None,
            Some(s) => Some(parse_shadow(s).with_context(|| format!("theme '{name}': shadow"))?),
            None => default.shadow,
        };
        Ok(Theme {
            name: name.to_string(),
            font: FontFace {
                family: self.font.clone().unwrap_or_else(|| default.font.family.clone()),
                bold: self.bold,
                italic: self.italic,
            },
            font_color,
            background,
            shadow,
        })
    }
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_color(s: &str) -> Result<Color32> {
    let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
    let byte = |i: usize| -> Result<u8> {
        let pair = hex
            .get(i..i + 2)
            .ok_or_else(|| anyhow::anyhow!("Invalid color: {s}"))?;
        u8::from_str_radix(pair, 16).map_err(|_| anyhow::anyhow!("Invalid color: {s}"))
    };
    match hex.len() {
        6 => Ok(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Color32::from_rgba_unmultiplied(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)?,
        )),
        _ => anyhow::bail!("Invalid color: {s}. Expected #RRGGBB or #RRGGBBAA."),
    }
}

/// Parse `#color`, `image:<path>` or `video:<path>[@hue]`.
pub fn parse_background(s: &str, base_path: &Path) -> Result<Background> {
    let s = s.trim();
    if let Some(path) = s.strip_prefix("image:") {
        return Ok(Background::Image(base_path.join(path.trim())));
    }
    if let Some(rest) = s.strip_prefix("video:") {
        let (path, hue) = match rest.rsplit_once('@') {
            Some((p, h)) => {
                let hue = h
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| anyhow::anyhow!("Invalid video hue: {h}"))?;
                (p, hue)
            }
            None => (rest, 0.0),
        };
        return Ok(Background::Video {
            path: base_path.join(path.trim()),
            hue,
        });
    }
    Ok(Background::Color(parse_color(s)?))
}

fn parse_shadow(s: &str) -> Result<Shadow> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, radius, color] = parts.as_slice() else {
        anyhow::bail!("Invalid shadow: {s}. Expected \"x,y,radius,#color\".");
    };
    let num = |v: &str| {
        v.parse::<f32>()
            .map_err(|_| anyhow::anyhow!("Invalid shadow value: {v}"))
    };
    Ok(Shadow {
        offset_x: num(x)?,
        offset_y: num(y)?,
        radius: num(radius)?,
        color: parse_color(color)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_rgb_and_rgba() {
        assert_eq!(parse_color("#FF8000").unwrap(), Color32::from_rgb(255, 128, 0));
        assert_eq!(
            parse_color("#00000080").unwrap(),
            Color32::from_rgba_unmultiplied(0, 0, 0, 128)
        );
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#GG0000").is_err());
    }

    #[test]
    fn test_parse_background_kinds() {
        let base = Path::new("/songs");
        assert_eq!(
            parse_background("#000000", base).unwrap(),
            Background::Color(Color32::BLACK)
        );
        assert_eq!(
            parse_background("image:bg/sky.jpg", base).unwrap(),
            Background::Image(PathBuf::from("/songs/bg/sky.jpg"))
        );
        assert_eq!(
            parse_background("video:loop.mp4@0.25", base).unwrap(),
            Background::Video {
                path: PathBuf::from("/songs/loop.mp4"),
                hue: 0.25
            }
        );
    }

    #[test]
    fn test_theme_def_falls_back_to_default() {
        let def = ThemeDef {
            color: Some("#FFFF00".to_string()),
            ..Default::default()
        };
        let theme = def.build("yellow", Path::new(".")).unwrap();
        assert_eq!(theme.font_color, Color32::from_rgb(255, 255, 0));
        assert_eq!(theme.font.family, DEFAULT_THEME.font.family);
        assert_eq!(theme.background, DEFAULT_THEME.background);
        assert_eq!(theme.shadow, DEFAULT_THEME.shadow);
    }

    #[test]
    fn test_theme_def_shadow_none() {
        let def = ThemeDef {
            shadow: Some("none".to_string()),
            ..Default::default()
        };
        assert!(def.build("flat", Path::new(".")).unwrap().shadow.is_none());
    }

    #[test]
    fn test_theme_def_reports_bad_field() {
        let def = ThemeDef {
            shadow: Some("1,2".to_string()),
            ..Default::default()
        };
        let err = def.build("broken", Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[test]
    fn test_themes_compare_structurally() {
        let a = DEFAULT_THEME.clone();
        let mut b = DEFAULT_THEME.clone();
        assert_eq!(a, b);
        b.font.bold = true;
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_opacity_scales_alpha() {
        let c = Theme::with_opacity(Color32::WHITE, 0.5);
        assert_eq!(c.a(), 127);
    }
}
