pub mod frontmatter;
pub mod splitter;

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;

use crate::displayable::{
    Displayable, MediaItem, PresentationItem, Schedule, Section, TextItem, TextKind,
};
use crate::theme::Theme;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([A-Za-z0-9_-]+)\s*(?::\s*(.*))?$")
        .unwrap_or_else(|e| unreachable!("directive pattern is valid: {e}"))
});

static SECTION_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(.+)\]$").unwrap_or_else(|e| unreachable!("section pattern is valid: {e}"))
});

#[derive(Debug, Clone, PartialEq)]
struct Directive {
    name: String,
    value: String,
}

fn parse_directive(line: &str) -> Option<Directive> {
    let caps = DIRECTIVE.captures(line.trim())?;
    Some(Directive {
        name: caps[1].to_ascii_lowercase(),
        value: caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    })
}

/// Read and parse a schedule file. Relative media paths resolve against the
/// file's directory.
pub fn load(path: &Path) -> Result<Schedule> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let base_path = path.parent().unwrap_or(Path::new("."));
    parse(&content, base_path).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(content: &str, base_path: &Path) -> Result<Schedule> {
    let (meta, body) = frontmatter::extract(content)?;

    let themes = meta
        .themes
        .iter()
        .map(|(name, def)| def.build(name, base_path))
        .collect::<Result<Vec<Theme>>>()?;

    let default_theme = match &meta.theme {
        Some(name) => {
            let theme = themes.iter().find(|t| &t.name == name).cloned();
            if theme.is_none() {
                tracing::warn!("Schedule theme '{name}' is not defined, using the default");
            }
            theme
        }
        None => None,
    };

    let items = splitter::split(&body)
        .iter()
        .filter_map(|raw| parse_item(raw, base_path, &themes, default_theme.as_ref()))
        .map(Arc::new)
        .collect();

    Ok(Schedule {
        title: meta.title,
        items,
        themes,
    })
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_item(
    raw: &str,
    base_path: &Path,
    themes: &[Theme],
    default_theme: Option<&Theme>,
) -> Option<Displayable> {
    let mut title: Option<String> = None;
    let mut kind = TextKind::Song;
    let mut theme = default_theme.cloned();
    let mut media: Option<Displayable> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if title.is_none() && body.iter().all(|l| l.trim().is_empty()) {
            if let Some(t) = line.strip_prefix("# ") {
                title = Some(t.trim().to_string());
                continue;
            }
        }
        let Some(directive) = parse_directive(line) else {
            body.push(line);
            continue;
        };
        let media_item = |value: &str| MediaItem {
            title: String::new(),
            path: base_path.join(value),
        };
        match directive.name.as_str() {
            "theme" => match themes.iter().find(|t| t.name == directive.value) {
                Some(t) => theme = Some(t.clone()),
                None => tracing::warn!("Unknown theme '{}', ignoring", directive.value),
            },
            "bible" => kind = TextKind::Bible,
            "image" => media = Some(Displayable::Image(media_item(&directive.value))),
            "video" => media = Some(Displayable::Video(media_item(&directive.value))),
            "audio" => media = Some(Displayable::Audio(media_item(&directive.value))),
            "presentation" => {
                let slides: Vec<PathBuf> = directive
                    .value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| base_path.join(s))
                    .collect();
                media = Some(Displayable::Presentation(PresentationItem {
                    title: String::new(),
                    slides,
                }));
            }
            other => tracing::warn!("Unknown directive '@{other}', ignoring"),
        }
    }

    if let Some(mut item) = media {
        let fallback = match &item {
            Displayable::Image(m) | Displayable::Video(m) | Displayable::Audio(m) => {
                file_title(&m.path)
            }
            Displayable::Presentation(p) => p
                .slides
                .first()
                .map(|s| file_title(s))
                .unwrap_or_else(|| "Presentation".to_string()),
            Displayable::Text(_) => String::new(),
        };
        let name = title.unwrap_or(fallback);
        match &mut item {
            Displayable::Image(m) | Displayable::Video(m) | Displayable::Audio(m) => m.title = name,
            Displayable::Presentation(p) => p.title = name,
            Displayable::Text(_) => {}
        }
        return Some(item);
    }

    let sections = parse_sections(&body);
    if title.is_none() && sections.is_empty() {
        return None;
    }
    Some(Displayable::Text(TextItem {
        title: title.unwrap_or_else(|| {
            sections
                .first()
                .and_then(|s| s.lines.first())
                .map(|l| l.trim().to_string())
                .unwrap_or_default()
        }),
        kind,
        sections,
        theme,
    }))
}

/// Blank lines separate sections. An optional `[Title]` line names the
/// section and `> ` lines are its small text.
fn parse_sections(lines: &[&str]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section::default();

    let mut finish = |current: &mut Section| {
        let section = std::mem::take(current);
        if !section.lines.is_empty() || !section.small_text.is_empty() {
            sections.push(section);
        }
    };

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            finish(&mut current);
            continue;
        }
        if let Some(caps) = SECTION_TITLE.captures(trimmed) {
            if !current.lines.is_empty() || !current.small_text.is_empty() {
                finish(&mut current);
            }
            current.title = caps[1].trim().to_string();
            continue;
        }
        if let Some(small) = trimmed.strip_prefix('>') {
            current.small_text.push(small.trim().to_string());
            continue;
        }
        current.lines.push(line.trim_end().to_string());
    }
    finish(&mut current);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Background;
    use eframe::egui::Color32;

    const SERVICE: &str = "---
title: Sunday service
theme: night
themes:
  night:
    color: \"#FFFFFF\"
    background: \"#000030\"
  photo:
    background: \"image:backgrounds/sky.jpg\"
---
# Amazing Grace
[Verse 1]
Amazing grace, how sweet the sound
That saved a wretch like me
> John Newton

[Verse 2]
'Twas grace that taught my heart to fear

---

@bible
@theme: photo
# John 3:16
For God so loved the world

# Notices
@image: slides/notices.png

@video: media/intro.mp4
# Welcome video
";

    fn service() -> Schedule {
        parse(SERVICE, Path::new("/srv/church")).unwrap()
    }

    #[test]
    fn test_schedule_meta_and_themes() {
        let schedule = service();
        assert_eq!(schedule.title.as_deref(), Some("Sunday service"));
        let names: Vec<&str> = schedule.themes.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["night", "photo"]);
        assert_eq!(
            schedule.themes[1].background,
            Background::Image(PathBuf::from("/srv/church/backgrounds/sky.jpg"))
        );
    }

    #[test]
    fn test_items_in_order() {
        let schedule = service();
        let kinds: Vec<&str> = schedule.items.iter().map(|i| i.kind_label()).collect();
        assert_eq!(kinds, vec!["Song", "Bible", "Image", "Video"]);
        let titles: Vec<&str> = schedule.items.iter().map(|i| i.title()).collect();
        assert_eq!(
            titles,
            vec!["Amazing Grace", "John 3:16", "Notices", "Welcome video"]
        );
    }

    #[test]
    fn test_song_sections() {
        let schedule = service();
        let Displayable::Text(song) = schedule.items[0].as_ref() else {
            panic!("expected a song");
        };
        assert_eq!(song.sections.len(), 2);
        assert_eq!(song.sections[0].title, "Verse 1");
        assert_eq!(
            song.sections[0].lines,
            vec![
                "Amazing grace, how sweet the sound",
                "That saved a wretch like me"
            ]
        );
        assert_eq!(song.sections[0].small_text, vec!["John Newton"]);
        assert_eq!(song.sections[1].title, "Verse 2");
        assert_eq!(
            song.theme.as_ref().map(|t| t.name.as_str()),
            Some("night")
        );
        assert_eq!(
            song.theme.as_ref().map(|t| t.background.clone()),
            Some(Background::Color(Color32::from_rgb(0, 0, 0x30)))
        );
    }

    #[test]
    fn test_bible_item_with_own_theme() {
        let schedule = service();
        let Displayable::Text(passage) = schedule.items[1].as_ref() else {
            panic!("expected a passage");
        };
        assert_eq!(passage.kind, TextKind::Bible);
        assert_eq!(
            passage.theme.as_ref().map(|t| t.name.as_str()),
            Some("photo")
        );
    }

    #[test]
    fn test_media_paths_resolve_against_schedule() {
        let schedule = service();
        let Displayable::Image(image) = schedule.items[2].as_ref() else {
            panic!("expected an image");
        };
        assert_eq!(image.path, PathBuf::from("/srv/church/slides/notices.png"));
        let Displayable::Video(video) = schedule.items[3].as_ref() else {
            panic!("expected a video");
        };
        assert_eq!(video.path, PathBuf::from("/srv/church/media/intro.mp4"));
    }

    #[test]
    fn test_presentation_slides() {
        let schedule = parse(
            "@presentation: deck/1.png, deck/2.png\n# Mission",
            Path::new("/base"),
        )
        .unwrap();
        let Displayable::Presentation(deck) = schedule.items[0].as_ref() else {
            panic!("expected a presentation");
        };
        assert_eq!(deck.title, "Mission");
        assert_eq!(
            deck.slides,
            vec![PathBuf::from("/base/deck/1.png"), PathBuf::from("/base/deck/2.png")]
        );
    }

    #[test]
    fn test_media_title_falls_back_to_file_name() {
        let schedule = parse("@audio: music/prelude.ogg", Path::new("/")).unwrap();
        assert_eq!(schedule.items[0].title(), "prelude");
    }

    #[test]
    fn test_untitled_text_uses_first_line() {
        let schedule = parse("Holy, holy, holy\nLord God Almighty", Path::new("/")).unwrap();
        assert_eq!(schedule.items[0].title(), "Holy, holy, holy");
    }

    #[test]
    fn test_unknown_theme_and_directive_are_ignored() {
        let schedule = parse("@theme: missing\n@sparkles: yes\n# Song\nLa la", Path::new("/")).unwrap();
        let Displayable::Text(song) = schedule.items[0].as_ref() else {
            panic!("expected a song");
        };
        assert!(song.theme.is_none());
        assert_eq!(song.sections[0].lines, vec!["La la"]);
    }

    #[test]
    fn test_bad_theme_definition_names_theme() {
        let err = parse(
            "---\nthemes:\n  broken:\n    color: \"#XYZ\"\n---\n",
            Path::new("/"),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[test]
    fn test_stage_indentation_kept_in_source_lines() {
        let schedule = parse("# Song\nG   D\n  Amazing grace", Path::new("/")).unwrap();
        let Displayable::Text(song) = schedule.items[0].as_ref() else {
            panic!("expected a song");
        };
        assert_eq!(song.sections[0].lines, vec!["G   D", "  Amazing grace"]);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.txt");
        std::fs::write(&path, "@image: a.png").unwrap();
        let schedule = load(&path).unwrap();
        let Displayable::Image(image) = schedule.items[0].as_ref() else {
            panic!("expected an image");
        };
        assert_eq!(image.path, dir.path().join("a.png"));
    }
}
