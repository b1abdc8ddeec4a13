use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "quelea";

const KEYS: &str = "display.max_chars, display.max_bible_chars, display.use_uniform_font_size, \
display.additional_line_spacing, display.max_font_size, display.clear_fade_duration_ms, \
display.text_shadow_enabled, display.capitalise_first_letter, display.logo_image, \
display.stage_chord_color, display.show_small_text, defaults.projectors, defaults.windowed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Options the renderer reads on every layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Lyric lines longer than this are split.
    pub max_chars: usize,
    /// Bible passages wrap word by word at this width.
    pub max_bible_chars: usize,
    /// Size every section of an item the same.
    pub use_uniform_font_size: bool,
    /// Extra pixels below each line.
    pub additional_line_spacing: f32,
    /// Starting point of the font size search.
    pub max_font_size: f32,
    pub clear_fade_duration_ms: u64,
    pub text_shadow_enabled: bool,
    pub capitalise_first_letter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<PathBuf>,
    pub stage_chord_color: String,
    pub show_small_text: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_chars: 30,
            max_bible_chars: 80,
            use_uniform_font_size: true,
            additional_line_spacing: 10.0,
            max_font_size: 1000.0,
            clear_fade_duration_ms: 1000,
            text_shadow_enabled: true,
            capitalise_first_letter: false,
            logo_image: None,
            stage_chord_color: "#FFD700".to_string(),
            show_small_text: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectors: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windowed: Option<bool>,
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be 'true' or 'false'."),
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be a positive number."),
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `quelea config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default config: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# Quelea configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let display = &mut self.display;
        match key {
            "display.max_chars" => display.max_chars = parse_positive(key, value)?,
            "display.max_bible_chars" => display.max_bible_chars = parse_positive(key, value)?,
            "display.use_uniform_font_size" => {
                display.use_uniform_font_size = parse_bool(key, value)?
            }
            "display.additional_line_spacing" => {
                display.additional_line_spacing = match value.parse::<f32>() {
                    Ok(n) if n >= 0.0 && n.is_finite() => n,
                    _ => anyhow::bail!(
                        "Invalid value for {key}: {value}. Must be zero or a positive number."
                    ),
                }
            }
            "display.max_font_size" => display.max_font_size = parse_positive(key, value)?,
            "display.clear_fade_duration_ms" => {
                display.clear_fade_duration_ms = match value.parse::<u64>() {
                    Ok(n) => n,
                    Err(_) => anyhow::bail!(
                        "Invalid value for {key}: {value}. Must be a whole number of milliseconds."
                    ),
                }
            }
            "display.text_shadow_enabled" => display.text_shadow_enabled = parse_bool(key, value)?,
            "display.capitalise_first_letter" => {
                display.capitalise_first_letter = parse_bool(key, value)?
            }
            "display.logo_image" => {
                display.logo_image = match value {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            "display.stage_chord_color" => {
                crate::theme::parse_color(value)?;
                display.stage_chord_color = value.to_string();
            }
            "display.show_small_text" => display.show_small_text = parse_bool(key, value)?,
            "defaults.projectors" => {
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .projectors = Some(parse_positive(key, value)?);
            }
            "defaults.windowed" => {
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .windowed = Some(parse_bool(key, value)?);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {KEYS}"),
        }
        Ok(())
    }
}
