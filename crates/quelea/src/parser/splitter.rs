/// Split a schedule body (after frontmatter extraction) into raw item strings.
///
/// Two mechanisms create item breaks:
/// 1. `---` with blank lines on both sides
/// 2. A `# ` title line when the current item already has content
///
/// Single and double blank lines are left alone; inside an item they separate
/// sections.
pub fn split(body: &str) -> Vec<String> {
    let body = body.replace("\r\n", "\n");
    let lines: Vec<&str> = body.split('\n').collect();

    let mut chunks: Vec<Vec<&str>> = vec![Vec::new()];
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_dash_separator(line.trim()) {
            let prev_blank = chunks
                .last()
                .and_then(|c| c.last())
                .is_none_or(|l| l.trim().is_empty());
            let next_blank = lines.get(i + 1).is_none_or(|l| l.trim().is_empty());
            if prev_blank && next_blank {
                chunks.push(Vec::new());
                i += 1;
                continue;
            }
        }
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(line);
        }
        i += 1;
    }

    let mut items = Vec::new();
    for chunk in chunks {
        let chunk = chunk.join("\n");
        let chunk = chunk.trim_matches('\n');
        if chunk.trim().is_empty() {
            continue;
        }
        split_by_title_inference(chunk, &mut items);
    }
    items
}

/// Split a chunk where a `# ` title appears after content. Directives placed
/// just before the title belong to the new item.
fn split_by_title_inference(chunk: &str, items: &mut Vec<String>) {
    let mut current = String::new();
    let mut has_content = false;

    for line in chunk.lines() {
        let trimmed = line.trim();

        if line.starts_with("# ") && has_content {
            let item_text = current.trim_matches('\n').to_string();
            let (content_part, trailing_directives) = strip_trailing_directives(&item_text);
            if !content_part.is_empty() {
                items.push(content_part);
            }
            current = trailing_directives;
            has_content = false;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        if !trimmed.is_empty() && !is_directive(trimmed) {
            has_content = true;
        }
    }

    let item_text = current.trim_matches('\n').to_string();
    if !item_text.trim().is_empty() {
        items.push(item_text);
    }
}

/// Split off the directive lines at the end of an item's raw text when a
/// blank line separates them from the content above. Returns
/// `(content, directives)`.
fn strip_trailing_directives(text: &str) -> (String, String) {
    let lines: Vec<&str> = text.lines().collect();

    let mut start = lines.len();
    while start > 0 && is_directive(lines[start - 1].trim()) {
        start -= 1;
    }
    if start == lines.len() || start == 0 || !lines[start - 1].trim().is_empty() {
        return (text.to_string(), String::new());
    }

    let content = lines[..start].join("\n").trim_end().to_string();
    let directives = lines[start..].join("\n");
    (content, directives)
}

fn is_dash_separator(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

/// `@name` or `@name: value`.
pub(crate) fn is_directive(line: &str) -> bool {
    let Some(rest) = line.strip_prefix('@') else {
        return false;
    };
    let name = rest.split(':').next().unwrap_or_default().trim_end();
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_separator() {
        let body = "Item one\n\n---\n\nItem two";
        let items = split(body);
        assert_eq!(items, vec!["Item one", "Item two"]);
    }

    #[test]
    fn test_dashes_inside_text_do_not_split() {
        let body = "Line one\n---\nLine two";
        assert_eq!(split(body).len(), 1);
    }

    #[test]
    fn test_blank_lines_stay_inside_item() {
        let body = "# Song\n\nVerse one\n\n\n\nVerse two";
        let items = split(body);
        assert_eq!(items.len(), 1);
        assert!(items[0].contains("\n\n\n\nVerse two"));
    }

    #[test]
    fn test_title_inference() {
        let body = "# First\n\nLyrics\n\n# Second\n\nMore lyrics";
        let items = split(body);
        assert_eq!(items.len(), 2);
        assert!(items[0].starts_with("# First"));
        assert!(items[1].starts_with("# Second"));
    }

    #[test]
    fn test_first_title_does_not_split() {
        let items = split("# Only\n\nLyrics");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_directives_move_to_following_item() {
        let body = "# First\nLyrics\n\n@theme: night\n# Second\nMore";
        let items = split(body);
        assert_eq!(items[0], "# First\nLyrics");
        assert_eq!(items[1], "@theme: night\n# Second\nMore");
    }

    #[test]
    fn test_directives_under_title_stay_put() {
        let body = "# Notices\n@image: notices.png\n\n@video: intro.mp4\n# Welcome";
        let items = split(body);
        assert_eq!(items[0], "# Notices\n@image: notices.png");
        assert_eq!(items[1], "@video: intro.mp4\n# Welcome");
    }

    #[test]
    fn test_directive_only_prefix_does_not_count_as_content() {
        let items = split("@bible\n# John 3:16\nFor God so loved");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_leading_indentation_survives() {
        let items = split("# Song\n  indented line");
        assert_eq!(items[0], "# Song\n  indented line");
    }

    #[test]
    fn test_crlf_normalised() {
        let items = split("One\r\n\r\n---\r\n\r\nTwo");
        assert_eq!(items, vec!["One", "Two"]);
    }

    #[test]
    fn test_is_directive() {
        assert!(is_directive("@theme: night"));
        assert!(is_directive("@bible"));
        assert!(!is_directive("@ nothing"));
        assert!(!is_directive("email@example.com"));
        assert!(!is_directive("@weird name: x"));
    }
}
