//! # Front-Matter Parser
//!
//! Splits a raw markdown document into a key/value metadata map and a body.
//!
//! The block is delimited by `---` lines at the very top of the document and
//! parsed as YAML with `serde_yaml`. Parsing never fails: a block that is not
//! a YAML mapping degrades to a line-based `key: value` scanner, and a
//! document without a block yields empty metadata and the whole input as body.

use regex::Regex;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Marker line opening and closing a front-matter block.
const DELIMITER: &str = "---";

static FALLBACK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w[\w-]*):\s*(.+)").expect("fallback front-matter pattern is valid")
});

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("list separator pattern is valid"));

static MISSING: FieldValue = FieldValue::Missing;

// =============================================================================
// FIELD VALUE
// =============================================================================

/// A front-matter value after coercion.
///
/// YAML scalars of any kind become `Text`; sequences of scalars become
/// `List`. Anything else (null, nested mappings) is `Missing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Missing,
}

impl FieldValue {
    fn from_yaml(value: &YamlValue) -> Self {
        match value {
            YamlValue::Sequence(items) => {
                Self::List(items.iter().filter_map(scalar_to_string).collect())
            }
            YamlValue::Tagged(tagged) => Self::from_yaml(&tagged.value),
            other => scalar_to_string(other).map_or(Self::Missing, Self::Text),
        }
    }
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

// =============================================================================
// FRONT MATTER
// =============================================================================

/// Parsed front-matter metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, FieldValue>,
}

impl FrontMatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        if value != FieldValue::Missing {
            self.fields.insert(key.into(), value);
        }
    }

    /// Get the raw value of a field; absent keys are `Missing`.
    #[must_use]
    pub fn get(&self, key: &str) -> &FieldValue {
        self.fields.get(key).unwrap_or(&MISSING)
    }

    /// A non-empty scalar value.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            FieldValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// A list value; a scalar counts as a one-element list.
    #[must_use]
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            FieldValue::List(items) => items.iter().filter(|s| !s.is_empty()).cloned().collect(),
            FieldValue::Text(s) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// A list value; a scalar is split on commas and whitespace.
    #[must_use]
    pub fn split_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            FieldValue::Text(s) => LIST_SEPARATOR
                .split(s)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => self.list(key),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Result of splitting a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMarkdown {
    pub front_matter: FrontMatter,
    pub body: String,
}

// =============================================================================
// PARSING
// =============================================================================

/// Split a raw document into front matter and body.
#[must_use]
pub fn parse(raw: &str) -> ParsedMarkdown {
    let Some((block, body)) = split_block(raw) else {
        return ParsedMarkdown {
            front_matter: FrontMatter::new(),
            body: raw.to_string(),
        };
    };

    let front_matter = match serde_yaml::from_str::<YamlValue>(block) {
        Ok(YamlValue::Mapping(mapping)) => {
            let mut fm = FrontMatter::new();
            for (key, value) in &mapping {
                if let Some(key) = scalar_to_string(key) {
                    fm.insert(key, FieldValue::from_yaml(value));
                }
            }
            fm
        }
        Ok(YamlValue::Null) => FrontMatter::new(),
        Ok(_) => {
            tracing::debug!("front matter is not a mapping, using line scanner");
            scan_lines(block)
        }
        Err(e) => {
            tracing::debug!(error = %e, "malformed front matter, using line scanner");
            scan_lines(block)
        }
    };

    ParsedMarkdown {
        front_matter,
        body: body.to_string(),
    }
}

/// Locate the delimited block. Returns `(block, body)`.
fn split_block(raw: &str) -> Option<(&str, &str)> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let first_break = text.find('\n')?;
    if text[..first_break].trim_end() != DELIMITER {
        return None;
    }

    let block_start = first_break + 1;
    let mut offset = block_start;
    for line in text[block_start..].split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = text[block_start..offset].trim_end_matches(['\r', '\n']);
            let body = &text[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

/// Best-effort `key: value` scanner for blocks YAML rejects.
fn scan_lines(block: &str) -> FrontMatter {
    let mut fm = FrontMatter::new();
    for line in block.lines() {
        let Some(caps) = FALLBACK_LINE.captures(line) else {
            continue;
        };
        let value = caps[2].trim();
        let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
        let value = value.strip_suffix(['"', '\'']).unwrap_or(value);
        fm.insert(&caps[1], FieldValue::Text(value.to_string()));
    }
    fm
}

// =============================================================================
// TESTS
// =============================================================================
