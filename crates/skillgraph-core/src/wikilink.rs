//! # Wikilink Extractor
//!
//! Finds `[[target]]`, `[[target#anchor]]`, `[[target|alias]]` and
//! `[[target#anchor|alias]]` references in a document body, together with
//! the sentence each one appears in.

use crate::slug::slugify;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WIKILINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|#\n]+?)(?:#([^\]|\n]+?))?(?:\|([^\]\n]+?))?\]\]")
        .expect("wikilink pattern is valid")
});

/// A cross-reference found in a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink {
    /// Slug-normalized target.
    pub target: String,
    pub anchor: Option<String>,
    pub alias: Option<String>,
    /// The enclosing sentence-like unit, trimmed.
    pub context: String,
}

/// Extract every wikilink in `body`.
///
/// Links whose target normalizes to an empty slug are dropped. The same
/// target in two different sentences yields two links; an exact
/// `(target, context)` repeat is collapsed.
#[must_use]
pub fn extract(body: &str) -> Vec<Wikilink> {
    let mut seen = BTreeSet::new();
    let mut links = Vec::new();

    for unit in sentence_units(body) {
        for caps in WIKILINK.captures_iter(unit) {
            let target = slugify(caps[1].trim());
            if target.is_empty() {
                continue;
            }
            if !seen.insert((target.clone(), unit.to_string())) {
                continue;
            }
            links.push(Wikilink {
                target,
                anchor: caps.get(2).map(|m| m.as_str().trim().to_string()),
                alias: caps.get(3).map(|m| m.as_str().trim().to_string()),
                context: unit.to_string(),
            });
        }
    }

    links
}

/// Split a body into sentence-like units.
///
/// A unit runs up to and including a run of `.`, `!`, `?` or newline.
/// Terminators inside an open `[[ … ]]` do not end a unit (a newline always
/// does). Trailing text without a terminator is a unit of its own.
fn sentence_units(body: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut in_link = false;
    let mut in_terminators = false;
    let mut chars = body.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if in_terminators && !is_terminator(ch) {
            push_unit(&mut units, &body[start..idx]);
            start = idx;
            in_terminators = false;
        }
        match ch {
            '[' if !in_link && chars.peek().is_some_and(|&(_, next)| next == '[') => {
                chars.next();
                in_link = true;
            }
            ']' if in_link && chars.peek().is_some_and(|&(_, next)| next == ']') => {
                chars.next();
                in_link = false;
            }
            '\n' => {
                in_link = false;
                in_terminators = true;
            }
            '.' | '!' | '?' if !in_link => in_terminators = true,
            _ => {}
        }
    }
    push_unit(&mut units, &body[start..]);

    units
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '\n')
}

fn push_unit<'a>(units: &mut Vec<&'a str>, unit: &'a str) {
    let trimmed = unit.trim();
    if !trimmed.is_empty() {
        units.push(trimmed);
    }
}
