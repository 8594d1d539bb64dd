//! # Slug Normalizer
//!
//! Deterministic string → identifier mapping.
//!
//! File names and wikilink targets both pass through [`slugify`], which is
//! what lets `[[Cognitive Restructuring]]` resolve to the node built from
//! `cognitive-restructuring.md`.

/// Normalize an arbitrary string to a slug.
///
/// Lower-cases, strips a trailing `.md`, turns whitespace runs into single
/// hyphens, drops every character outside `[a-z0-9-]`, collapses repeated
/// hyphens and trims hyphens from both ends.
///
/// Total and idempotent: `slugify(&slugify(x)) == slugify(x)` for every `x`.
/// Input made only of disallowed characters yields an empty string.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let stem = lowered.strip_suffix(".md").unwrap_or(&lowered);

    let mut slug = String::with_capacity(stem.len());
    let mut pending_hyphen = false;

    for ch in stem.chars() {
        if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }

    slug
}

/// Last segment of a `/`- or `\`-separated path.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Slug of a document derived from its file name.
#[must_use]
pub fn slug_from_path(path: &str) -> String {
    slugify(file_name(path))
}

/// Human-readable title derived from a file name.
///
/// `cognitive-restructuring.md` becomes `Cognitive Restructuring`.
#[must_use]
pub fn title_from_path(path: &str) -> String {
    let base = file_name(path);
    let stem = if base.to_ascii_lowercase().ends_with(".md") {
        &base[..base.len() - 3]
    } else {
        base
    };

    let mut title = String::with_capacity(stem.len());
    let mut at_word_start = true;
    for ch in stem.chars() {
        let ch = if ch == '-' || ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if at_word_start {
                title.extend(ch.to_uppercase());
            } else {
                title.push(ch);
            }
            at_word_start = false;
        } else {
            title.push(ch);
            at_word_start = true;
        }
    }
    title
}
