//! Reply formatting
//!
//! Cleans raw model output into plain display text: emphasis and heading
//! markers are removed, blank-line runs are collapsed and bullet lists are
//! either renumbered or stripped depending on [`ListStyle`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static LEADING_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[^\S\n]*(?:#+[^\S\n]*)+").unwrap());
static INLINE_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+(?:#+[^\S\n]+)+").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[*\-•]\s+").unwrap());

/// How bullet lists are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    /// `- a` / `* b` become `1. a` / `2. b`, restarting after each non-bullet line
    #[default]
    Numbered,
    /// Bullet markers are removed and items are left unnumbered
    Strip,
}

impl std::str::FromStr for ListStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numbered" => Ok(ListStyle::Numbered),
            "strip" => Ok(ListStyle::Strip),
            _ => Err(format!("Invalid list style: {}. Must be 'numbered' or 'strip'", s)),
        }
    }
}

/// Format raw model output for display
pub fn format_reply(text: &str, style: ListStyle) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned = strip_markdown(text);
    let listed = match style {
        ListStyle::Numbered => number_bullets(&cleaned),
        ListStyle::Strip => collapse_blank_lines(&strip_bullets(&cleaned)),
    };
    listed.trim().to_string()
}

fn strip_markdown(text: &str) -> String {
    let text = BOLD_RE.replace_all(text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1");
    let text = LEADING_HEADING_RE.replace_all(&text, "");
    let text = INLINE_HEADING_RE.replace_all(&text, " ");
    collapse_blank_lines(&text)
}

fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").trim().to_string()
}

fn number_bullets(text: &str) -> String {
    let mut counter = 0usize;
    text.split('\n')
        .map(|line| match BULLET_RE.find(line) {
            Some(marker) => {
                counter += 1;
                format!("{}. {}", counter, &line[marker.end()..])
            }
            None => {
                counter = 0;
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_bullets(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let mut line = line;
            // Nested markers ("- - a", "- # a") would otherwise surface on the next pass
            loop {
                let stripped = match BULLET_RE.find(line) {
                    Some(marker) => &line[marker.end()..],
                    None => match LEADING_HEADING_RE.find(line) {
                        Some(heading) => &line[heading.end()..],
                        None => line,
                    },
                };
                if stripped.len() == line.len() {
                    break line;
                }
                line = stripped;
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
