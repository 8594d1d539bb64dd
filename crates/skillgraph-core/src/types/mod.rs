//! # Core Type Definitions
//!
//! This module contains the canonical graph schema shared by the builder,
//! the validator and the HTTP service:
//! - Closed type sets with an escape variant (`NodeType`, `EdgeType`)
//! - Graph elements (`Node`, `Edge`) and their nested records
//! - Error types (`SkillGraphError`)
//!
//! ## Wire Format
//!
//! Field names serialize in camelCase because the graph document is consumed
//! by browser clients. Every field except `id` (nodes) and `source`/`target`
//! (edges) tolerates being absent or `null` on input, so graphs produced by
//! other tools can still be scored.

use crate::primitives::GRAPH_KIND;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// NODE TYPE
// =============================================================================

/// The kind of knowledge a node carries.
///
/// Values outside the closed set are kept verbatim in `Other` so the
/// validator can report what was actually written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Skill,
    /// Map of Content: a navigational hub.
    Moc,
    Claim,
    Technique,
    Framework,
    Exploration,
    /// Anything else, as written.
    Other(String),
}

impl NodeType {
    /// Parse a type label. Matching is exact; unknown labels become `Other`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "skill" => Self::Skill,
            "moc" => Self::Moc,
            "claim" => Self::Claim,
            "technique" => Self::Technique,
            "framework" => Self::Framework,
            "exploration" => Self::Exploration,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the label as written on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Skill => "skill",
            Self::Moc => "moc",
            Self::Claim => "claim",
            Self::Technique => "technique",
            Self::Framework => "framework",
            Self::Exploration => "exploration",
            Self::Other(label) => label,
        }
    }

    /// Check whether this type belongs to the closed set.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// All members of the closed set, in rubric order.
    #[must_use]
    pub fn known() -> [NodeType; 6] {
        [
            Self::Skill,
            Self::Moc,
            Self::Claim,
            Self::Technique,
            Self::Framework,
            Self::Exploration,
        ]
    }
}

impl From<String> for NodeType {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EDGE TYPE
// =============================================================================

/// The relationship a directed edge expresses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    /// MOC → member.
    Clusters,
    /// Body wikilink from a non-MOC node.
    References,
    /// Front-matter `extends`.
    Extends,
    /// Front-matter `contradicts`.
    Contradicts,
    Other(String),
}

impl EdgeType {
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "CLUSTERS" => Self::Clusters,
            "REFERENCES" => Self::References,
            "EXTENDS" => Self::Extends,
            "CONTRADICTS" => Self::Contradicts,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clusters => "CLUSTERS",
            Self::References => "REFERENCES",
            Self::Extends => "EXTENDS",
            Self::Contradicts => "CONTRADICTS",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for EdgeType {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<EdgeType> for String {
    fn from(edge_type: EdgeType) -> Self {
        match edge_type {
            EdgeType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Provenance of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_path: String,
    /// RFC 3339 timestamp of the build that produced the node.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A heading-delimited block of a document body, reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    /// ATX heading level, 1 through 6.
    pub level: u8,
    pub preview: String,
}

/// Progressive-disclosure content of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "null_as_default")]
    pub full: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
}

/// Computed node metadata.
///
/// `in_degree`/`out_degree` are always derived from the edge list; values
/// supplied on input are ignored by metrics and validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default)]
    pub word_count: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub in_degree: usize,
    #[serde(default)]
    pub out_degree: usize,
}

/// A typed unit of knowledge derived from one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default = "default_kind", deserialize_with = "null_as_kind")]
    pub kind: String,
    /// `None` only for externally supplied nodes that omit the field.
    #[serde(rename = "type", default)]
    pub node_type: Option<NodeType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Content,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: NodeMetadata,
}

impl Node {
    /// Create a bare node with the given id and type.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: Option<NodeType>) -> Self {
        Self {
            id: id.into(),
            kind: default_kind(),
            node_type,
            name: String::new(),
            description: String::new(),
            domain: None,
            tags: BTreeSet::new(),
            source: Source::default(),
            content: Content::default(),
            metadata: NodeMetadata::default(),
        }
    }

    /// Check whether this node is a Map of Content.
    #[must_use]
    pub fn is_moc(&self) -> bool {
        self.node_type == Some(NodeType::Moc)
    }

    /// The file the node came from, or its id when provenance is absent.
    #[must_use]
    pub fn origin(&self) -> &str {
        if self.source.file_path.is_empty() {
            &self.id
        } else {
            &self.source.file_path
        }
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default = "default_kind", deserialize_with = "null_as_kind")]
    pub kind: String,
    #[serde(rename = "type", default)]
    pub edge_type: Option<EdgeType>,
    pub source: String,
    pub target: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// The sentence a wikilink was found in, or a synthetic label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,
}

impl Edge {
    /// Create an edge of the given type between two node ids.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        edge_type: EdgeType,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let weight = if edge_type == EdgeType::Clusters {
            crate::primitives::CLUSTERS_WEIGHT
        } else {
            crate::primitives::DEFAULT_EDGE_WEIGHT
        };
        Self {
            id: id.into(),
            kind: default_kind(),
            edge_type: Some(edge_type),
            source: source.into(),
            target: target.into(),
            label: String::new(),
            context: String::new(),
            weight,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

fn default_kind() -> String {
    GRAPH_KIND.to_string()
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn null_as_kind<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|kind| kind.unwrap_or_else(default_kind))
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the skillgraph system.
///
/// Parsing, building, metrics and scoring are total and never produce these;
/// they arise only at boundaries (corpus admission, request shape, I/O).
#[derive(Debug, Error)]
pub enum SkillGraphError {
    /// No markdown documents survived admission.
    #[error("No .md files found.")]
    NoDocuments,

    /// The corpus holds more documents than a single build accepts.
    #[error("Too many files ({count}). Max is {max}.")]
    TooManyDocuments { count: usize, max: usize },

    /// The cumulative markdown text exceeds the byte ceiling.
    #[error("Total markdown content ({bytes} bytes) exceeds the {max} byte limit.")]
    CorpusTooLarge { bytes: usize, max: usize },

    /// A supplied graph has more nodes than validation accepts.
    #[error("Graph too large for validation endpoint. Max {max} nodes, received {count}.")]
    GraphTooLarge { count: usize, max: usize },

    /// A supplied graph does not have the expected shape.
    #[error("{0}")]
    InvalidGraph(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
