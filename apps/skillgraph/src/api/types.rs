//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use skillgraph_core::{
    Edge, EdgeType, Node, NodeMetadata, NodeType, RubricDescription, SkillGraphError,
    SourceDocument, ValidationReport, primitives::GRAPH_KIND,
};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// =============================================================================
// VALIDATE REQUEST/RESPONSE
// =============================================================================

/// A graph submitted for standalone validation.
///
/// Accepted shapes are `{ "graph": { ... } }` or the graph object itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateRequest {
    /// The submitted `id`, echoed back as `graphId`.
    pub graph_id: Option<Value>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ValidateRequest {
    /// Check the shape of a parsed body and extract the graph.
    ///
    /// # Errors
    /// - `InvalidGraph` for a missing graph, a foreign `kind`, non-array
    ///   `nodes`/`edges`, elements that are not objects or nodes without an id
    /// - `GraphTooLarge` above `max_nodes` nodes
    pub fn from_json(body: Value, max_nodes: usize) -> Result<Self, SkillGraphError> {
        let graph = match body {
            Value::Object(mut map) if map.get("graph").is_some_and(is_truthy) => {
                map.remove("graph").unwrap_or_default()
            }
            other => other,
        };
        let Value::Object(mut graph) = graph else {
            return Err(invalid("Request must include a graph object."));
        };

        match graph.get("kind") {
            Some(Value::String(kind)) if kind != GRAPH_KIND && !kind.is_empty() => {
                return Err(foreign_kind(kind));
            }
            Some(kind) if is_truthy(kind) && !kind.is_string() => {
                return Err(foreign_kind(&kind.to_string()));
            }
            _ => {}
        }

        let Some(Value::Array(nodes)) = graph.remove("nodes") else {
            return Err(invalid("graph.nodes must be an array."));
        };
        let Some(Value::Array(edges)) = graph.remove("edges") else {
            return Err(invalid("graph.edges must be an array."));
        };
        if nodes.len() > max_nodes {
            return Err(SkillGraphError::GraphTooLarge {
                count: nodes.len(),
                max: max_nodes,
            });
        }

        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(index, value)| node_from_value(index, value))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = edges
            .into_iter()
            .enumerate()
            .map(|(index, value)| edge_from_value(index, value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            graph_id: graph.remove("id").filter(is_truthy),
            nodes,
            edges,
        })
    }
}

fn invalid(msg: &str) -> SkillGraphError {
    SkillGraphError::InvalidGraph(msg.to_string())
}

fn foreign_kind(kind: &str) -> SkillGraphError {
    invalid(&format!(
        "Validation is for skill graphs only. Received kind: \"{}\".",
        kind
    ))
}

/// JSON truthiness: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_normal()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// =============================================================================
// ELEMENT DECODING
// =============================================================================
//
// A field of the wrong shape falls back to its default and the validator
// reports whatever that leaves missing. Only an element that is not an
// object, or a node without an id, is refused.

fn node_from_value(index: usize, value: Value) -> Result<Node, SkillGraphError> {
    let Value::Object(mut map) = value else {
        return Err(invalid(&format!(
            "graph.nodes contains an invalid node: element {} is not an object.",
            index
        )));
    };
    let Some(id) = map.remove("id").and_then(scalar_text) else {
        return Err(invalid(&format!(
            "graph.nodes contains an invalid node: element {} has no id.",
            index
        )));
    };

    let node_type = map.remove("type").and_then(type_label).map(NodeType::from);
    let mut node = Node::new(id, node_type);
    if let Some(kind) = field::<String>(&mut map, "kind") {
        node.kind = kind;
    }
    node.name = text_field(&mut map, "name");
    node.description = text_field(&mut map, "description");
    node.domain = field(&mut map, "domain");
    node.tags = list_field(&mut map, "tags").into_iter().collect();
    node.source = field(&mut map, "source").unwrap_or_default();
    node.content = field(&mut map, "content").unwrap_or_default();
    if let Some(Value::Object(mut metadata)) = map.remove("metadata") {
        node.metadata = NodeMetadata {
            word_count: field(&mut metadata, "wordCount").unwrap_or_default(),
            aliases: list_field(&mut metadata, "aliases"),
            in_degree: field(&mut metadata, "inDegree").unwrap_or_default(),
            out_degree: field(&mut metadata, "outDegree").unwrap_or_default(),
        };
    }
    Ok(node)
}

fn edge_from_value(index: usize, value: Value) -> Result<Edge, SkillGraphError> {
    let Value::Object(mut map) = value else {
        return Err(invalid(&format!(
            "graph.edges contains an invalid edge: element {} is not an object.",
            index
        )));
    };

    Ok(Edge {
        id: text_field(&mut map, "id"),
        kind: field(&mut map, "kind").unwrap_or_else(|| GRAPH_KIND.to_string()),
        edge_type: map.remove("type").and_then(type_label).map(EdgeType::from),
        // A missing endpoint becomes "", which no node id matches.
        source: text_field(&mut map, "source"),
        target: text_field(&mut map, "target"),
        label: text_field(&mut map, "label"),
        context: text_field(&mut map, "context"),
        weight: field(&mut map, "weight").unwrap_or_default(),
    })
}

/// Remove `key` and decode it, or `None` when absent or of the wrong shape.
fn field<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.remove(key)?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!(field = key, "Ignoring malformed field: {}", e);
            None
        }
    }
}

fn text_field(map: &mut Map<String, Value>, key: &str) -> String {
    map.remove(key).and_then(scalar_text).unwrap_or_default()
}

/// A single scalar counts as a one-element list.
fn list_field(map: &mut Map<String, Value>, key: &str) -> Vec<String> {
    match map.remove(key) {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Strings as-is, numbers and booleans as their JSON text.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A non-string type keeps its JSON text so it is reported as written.
fn type_label(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Successful validation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub graph_id: Option<Value>,
    pub kind: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

impl ValidateResponse {
    pub fn new(graph_id: Option<Value>, report: ValidationReport) -> Self {
        Self {
            graph_id,
            kind: GRAPH_KIND.to_string(),
            report,
        }
    }
}

// =============================================================================
// RUBRIC RESPONSE
// =============================================================================

/// Service limits advertised by `GET /validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_nodes: usize,
    pub rate_limit: String,
}

/// Documentation of the validation endpoint and its rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricResponse {
    pub endpoint: String,
    pub description: String,
    pub rubric: RubricDescription,
    pub limits: Limits,
}

// =============================================================================
// BUILD REQUEST
// =============================================================================

/// Corpus submitted to `POST /build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub documents: Vec<SourceDocument>,
}
