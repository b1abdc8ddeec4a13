//! Line breaking for projected text.
//!
//! Lyrics are split at the most natural delimiter near the middle of an
//! over-long line; bible passages are wrapped word by word.

use std::sync::LazyLock;

use regex::Regex;

/// Delimiters tried in order of preference when splitting a long line.
const DELIMITERS: [char; 3] = [';', ',', ' '];

static CHORD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?[A-G][#b]?(m|maj|min|dim|aug|sus|add)?[0-9]*(/[A-G][#b]?)?\)?$")
        .unwrap_or_else(|e| unreachable!("chord pattern is valid: {e}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Lyric,
    Chord,
}

/// One line as it will be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    text: String,
    kind: LineKind,
}

impl DisplayLine {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = classify(&text);
        Self { text, kind }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn is_chord(&self) -> bool {
        self.kind == LineKind::Chord
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A line is a chord line when every whitespace-separated token is a chord.
pub fn classify(text: &str) -> LineKind {
    let mut tokens = text.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return LineKind::Lyric;
    }
    if tokens.all(|t| CHORD_TOKEN.is_match(t)) {
        LineKind::Chord
    } else {
        LineKind::Lyric
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Split at `;`, `,` or space nearest the middle, hyphenating as a last resort.
    Smart,
    /// Fill lines word by word.
    Dumb,
}

#[derive(Debug, Clone, Copy)]
pub struct TextFitter {
    pub max_chars: usize,
    pub mode: WrapMode,
    /// Stage views keep the operator's original indentation.
    pub preserve_whitespace: bool,
}

impl TextFitter {
    pub fn new(max_chars: usize, mode: WrapMode) -> Self {
        Self {
            max_chars,
            mode,
            preserve_whitespace: false,
        }
    }

    pub fn preserving_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }

    pub fn wrap<S: AsRef<str>>(&self, lines: &[S]) -> Vec<DisplayLine> {
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            let line = line.as_ref();
            match self.mode {
                WrapMode::Smart => self.wrap_smart(line, &mut out),
                WrapMode::Dumb => self.wrap_dumb(line, &mut out),
            }
        }
        out
    }

    fn tidy<'a>(&self, s: &'a str) -> &'a str {
        if self.preserve_whitespace {
            s
        } else {
            s.trim()
        }
    }

    fn wrap_smart(&self, line: &str, out: &mut Vec<DisplayLine>) {
        let line = self.tidy(line);
        let chars: Vec<char> = line.chars().collect();
        self.split_recursive(&chars, out);
    }

    fn split_recursive(&self, chars: &[char], out: &mut Vec<DisplayLine>) {
        if chars.len() <= self.max_chars {
            out.push(DisplayLine::new(chars.iter().collect::<String>()));
            return;
        }

        let (first, second): (String, String) = match split_point(chars) {
            Some((idx, ' ')) => (chars[..idx].iter().collect(), chars[idx + 1..].iter().collect()),
            // Punctuation stays at the end of the first half.
            Some((idx, _)) => (
                chars[..=idx].iter().collect(),
                chars[idx + 1..].iter().collect(),
            ),
            None => {
                let mid = chars.len() / 2;
                // The hyphen only shrinks pieces of three or more characters.
                if mid + 1 >= chars.len() {
                    out.push(DisplayLine::new(chars.iter().collect::<String>()));
                    return;
                }
                let mut first: String = chars[..mid].iter().collect();
                first.push('-');
                (first, chars[mid..].iter().collect())
            }
        };

        for half in [first, second] {
            let half = self.tidy(&half);
            if half.is_empty() {
                continue;
            }
            let half_chars: Vec<char> = half.chars().collect();
            self.split_recursive(&half_chars, out);
        }
    }

    fn wrap_dumb(&self, line: &str, out: &mut Vec<DisplayLine>) {
        let mut buffer = String::new();
        let mut buffer_len = 0usize;
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            if buffer_len > 0 && buffer_len + 1 + word_len > self.max_chars {
                out.push(DisplayLine::new(std::mem::take(&mut buffer)));
                buffer_len = 0;
            }
            if buffer_len > 0 {
                buffer.push(' ');
                buffer_len += 1;
            }
            buffer.push_str(word);
            buffer_len += word_len;
        }
        if !buffer.is_empty() {
            out.push(DisplayLine::new(buffer));
        }
    }
}

/// Find the preferred delimiter within the middle 80% of the line, closest to
/// the midpoint. Returns its char index and the delimiter.
///
/// The first and last characters never qualify, so both halves are non-empty
/// even on lines too short to have a 10% margin.
fn split_point(chars: &[char]) -> Option<(usize, char)> {
    let len = chars.len();
    let margin = (len / 10).max(1);
    let mid = len / 2;
    DELIMITERS.iter().find_map(|&delim| {
        chars
            .iter()
            .enumerate()
            .filter(|&(i, &c)| c == delim && i >= margin && i + margin < len)
            .min_by_key(|&(i, _)| i.abs_diff(mid))
            .map(|(i, _)| (i, delim))
    })
}

/// Upper-case the first character of a line, leaving the rest untouched.
pub fn capitalise_first(line: &str) -> String {
    let mut chars = line.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
