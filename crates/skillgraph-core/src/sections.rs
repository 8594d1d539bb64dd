//! # Section Extractor
//!
//! Splits a body into ATX-heading-delimited sections with plain-text
//! previews. Text before the first heading belongs to no section, and a body
//! without headings yields no sections at all.

use crate::primitives::SECTION_PREVIEW_CHARS;
use crate::types::Section;
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)").expect("heading pattern is valid"));

static WIKILINK_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|#]+)(?:#[^\]|]+)?(?:\|([^\]]+))?\]\]")
        .expect("wikilink text pattern is valid")
});

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("markdown link pattern is valid")
});

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`#>]").expect("emphasis pattern is valid"));

/// Extract sections from a markdown body.
#[must_use]
pub fn extract(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(String, u8)> = None;
    let mut content: Vec<String> = Vec::new();

    for line in body.lines() {
        if let Some(caps) = HEADING.captures(line) {
            if let Some((heading, level)) = current.take() {
                sections.push(finish(heading, level, &content));
            }
            current = Some((caps[2].trim().to_string(), caps[1].len() as u8));
            content.clear();
        } else if !line.trim().is_empty() {
            let plain = plain_text(line);
            if !plain.is_empty() {
                content.push(plain);
            }
        }
    }
    if let Some((heading, level)) = current {
        sections.push(finish(heading, level, &content));
    }

    sections
}

fn finish(heading: String, level: u8, content: &[String]) -> Section {
    let joined = content.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    let preview: String = collapsed.chars().take(SECTION_PREVIEW_CHARS).collect();
    Section {
        heading,
        level,
        preview: preview.trim_end().to_string(),
    }
}

/// Reduce one markdown line to plain text.
fn plain_text(line: &str) -> String {
    let unlinked = WIKILINK_TEXT.replace_all(line, |caps: &regex::Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    });
    let unlinked = MARKDOWN_LINK.replace_all(&unlinked, "$1");
    EMPHASIS.replace_all(&unlinked, "").trim().to_string()
}
