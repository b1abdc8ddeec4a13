use anyhow::{Context, Result};
use serde::Deserialize;

use crate::theme::ThemeDef;

/// Schedule-wide settings from the YAML block at the top of the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleMeta {
    #[serde(default)]
    pub title: Option<String>,
    /// Name of the theme items use unless they pick their own.
    #[serde(default)]
    pub theme: Option<String>,
    /// Named themes in declaration order.
    #[serde(default, deserialize_with = "ordered_themes")]
    pub themes: Vec<(String, ThemeDef)>,
}

fn ordered_themes<'de, D>(deserializer: D) -> Result<Vec<(String, ThemeDef)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .into_iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .ok_or_else(|| D::Error::custom("theme names must be strings"))?
                .to_string();
            let def = serde_yaml::from_value(value)
                .map_err(|e| D::Error::custom(format!("theme '{name}': {e}")))?;
            Ok((name, def))
        })
        .collect()
}

/// Split `content` into its frontmatter and the remaining body. A file
/// without a leading `---` line has no frontmatter.
pub fn extract(content: &str) -> Result<(ScheduleMeta, String)> {
    let content = content.replace("\r\n", "\n");
    let Some(rest) = content.strip_prefix("---\n") else {
        return Ok((ScheduleMeta::default(), content));
    };

    let (yaml, after) = if let Some(after) = rest.strip_prefix("---") {
        ("", after)
    } else if let Some(end) = rest.find("\n---") {
        (&rest[..end], &rest[end + 4..])
    } else {
        anyhow::bail!("Frontmatter is missing its closing '---'");
    };
    let body = after.strip_prefix('\n').unwrap_or(after);

    let meta = if yaml.trim().is_empty() {
        ScheduleMeta::default()
    } else {
        serde_yaml::from_str(yaml).context("Invalid schedule frontmatter")?
    };
    Ok((meta, body.to_string()))
}
