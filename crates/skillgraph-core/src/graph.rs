//! # Graph Builder
//!
//! Turns a document set into the canonical skill graph document.
//!
//! Building is global: every link is resolved against the slug namespace of
//! the whole set, so documents are first parsed in full, then nodes are
//! emitted, then edges. References that do not resolve never become edges;
//! they are handed to the validator as broken-link records instead.
//!
//! The only impure input is the clock, used for the graph id and provenance
//! timestamps. [`GraphBuilder::build_at`] takes it explicitly.

use crate::frontmatter::{self, FrontMatter};
use crate::ingestor::SourceDocument;
use crate::metrics::{Degrees, Metrics};
use crate::primitives::{DEFAULT_DOMAIN, GRAPH_KIND, NODE_ID_PREFIX, SCHEMA_VERSION};
use crate::slug::{slug_from_path, slugify, title_from_path};
use crate::types::{Content, NodeMetadata, Section, Source};
use crate::validation::{BrokenLink, BuildFindings, ValidationReport, Validator};
use crate::wikilink::{self, Wikilink};
use crate::{Edge, EdgeType, Node, NodeType, sections};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH DOCUMENT
// =============================================================================

/// A built skill graph, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGraph {
    pub id: String,
    pub kind: String,
    pub schema_version: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metrics: Metrics,
    pub validation: ValidationReport,
}

impl SkillGraph {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Outgoing edges of a node, in creation order.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }
}

// =============================================================================
// PARSED DOCUMENT
// =============================================================================

/// Per-document state kept between the parse pass and graph assembly.
struct ParsedDocument {
    path: String,
    slug: String,
    id: String,
    front_matter: FrontMatter,
    body: String,
    word_count: usize,
    links: Vec<Wikilink>,
    sections: Vec<Section>,
}

impl ParsedDocument {
    /// The type written in front matter, if any.
    fn declared_type(&self) -> Option<NodeType> {
        self.front_matter.text("type").map(NodeType::parse)
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds skill graphs and scores them in the same pass.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    validator: Validator,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom validator for the inline quality report.
    #[must_use]
    pub fn with_validator(validator: Validator) -> Self {
        Self { validator }
    }

    /// Build a graph stamped with the current time.
    #[must_use]
    pub fn build(&self, documents: &[SourceDocument]) -> SkillGraph {
        self.build_at(documents, Utc::now())
    }

    /// Build a graph stamped with `now`.
    ///
    /// Output is fully determined by `documents` and `now`.
    #[must_use]
    pub fn build_at(&self, documents: &[SourceDocument], now: DateTime<Utc>) -> SkillGraph {
        let parsed = parse_documents(documents);

        // Bare slug -> first document carrying it
        let mut slug_to_id: BTreeMap<String, String> = BTreeMap::new();
        for doc in &parsed {
            slug_to_id
                .entry(doc.slug.clone())
                .or_insert_with(|| doc.id.clone());
        }

        let updated_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut findings = BuildFindings::default();
        let mut nodes: Vec<Node> = parsed
            .iter()
            .map(|doc| {
                if doc.declared_type().is_none() {
                    findings.untyped_nodes.insert(doc.id.clone());
                }
                node_from(doc, &updated_at)
            })
            .collect();

        let mut assembler = EdgeAssembler::new(&slug_to_id);
        for doc in &parsed {
            assembler.resolve_document(doc);
        }
        let (edges, broken_links) = assembler.finish();
        findings.broken_links = broken_links;

        let degrees = Degrees::compute(&nodes, &edges);
        for node in &mut nodes {
            node.metadata.in_degree = degrees.in_of(&node.id);
            node.metadata.out_degree = degrees.out_of(&node.id);
        }

        let validation = self.validator.validate_build(&nodes, &edges, &findings);
        tracing::info!(
            nodes = nodes.len(),
            edges = edges.len(),
            broken_links = findings.broken_links.len(),
            score = validation.score,
            "skill graph built"
        );

        SkillGraph {
            id: format!("skill-graph-{}", now.timestamp_millis()),
            kind: GRAPH_KIND.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            nodes,
            edges,
            metrics: validation.metrics.clone(),
            validation,
        }
    }
}

/// Parse every document and assign unique node ids.
///
/// A slug already taken gets the first free `-2`, `-3`, ... suffix.
fn parse_documents(documents: &[SourceDocument]) -> Vec<ParsedDocument> {
    let mut taken: BTreeSet<String> = BTreeSet::new();
    documents
        .iter()
        .map(|source| {
            let slug = slug_from_path(&source.path);
            let mut id = format!("{NODE_ID_PREFIX}{slug}");
            let mut suffix = 2;
            while taken.contains(&id) {
                id = format!("{NODE_ID_PREFIX}{slug}-{suffix}");
                suffix += 1;
            }
            taken.insert(id.clone());

            let markdown = frontmatter::parse(&source.content);
            ParsedDocument {
                path: source.path.clone(),
                slug,
                id,
                word_count: markdown.body.split_whitespace().count(),
                links: wikilink::extract(&markdown.body),
                sections: sections::extract(&markdown.body),
                front_matter: markdown.front_matter,
                body: markdown.body,
            }
        })
        .collect()
}

fn node_from(doc: &ParsedDocument, updated_at: &str) -> Node {
    let fm = &doc.front_matter;
    let mut node = Node::new(
        doc.id.clone(),
        Some(doc.declared_type().unwrap_or(NodeType::Skill)),
    );
    node.name = fm
        .text("name")
        .map(str::to_string)
        .unwrap_or_else(|| title_from_path(&doc.path));
    node.description = fm.text("description").unwrap_or_default().to_string();
    node.domain = Some(fm.text("domain").unwrap_or(DEFAULT_DOMAIN).to_string());
    node.tags = fm.split_list("tags").into_iter().collect();
    node.source = Source {
        file_path: doc.path.clone(),
        updated_at: Some(updated_at.to_string()),
    };
    node.content = Content {
        full: doc.body.clone(),
        sections: doc.sections.clone(),
    };
    node.metadata = NodeMetadata {
        word_count: doc.word_count,
        aliases: fm.list("aliases"),
        in_degree: 0,
        out_degree: 0,
    };
    node
}

// =============================================================================
// EDGE ASSEMBLY
// =============================================================================

/// Resolves references into sequentially numbered edges.
struct EdgeAssembler<'a> {
    slug_to_id: &'a BTreeMap<String, String>,
    edges: Vec<Edge>,
    broken: Vec<BrokenLink>,
}

impl<'a> EdgeAssembler<'a> {
    fn new(slug_to_id: &'a BTreeMap<String, String>) -> Self {
        Self {
            slug_to_id,
            edges: Vec::new(),
            broken: Vec::new(),
        }
    }

    fn resolve_document(&mut self, doc: &ParsedDocument) {
        let link_type = if doc.declared_type() == Some(NodeType::Moc) {
            EdgeType::Clusters
        } else {
            EdgeType::References
        };

        for link in &doc.links {
            let label = link.alias.as_deref().unwrap_or(&link.target);
            self.connect(doc, &link.target, link_type.clone(), label, &link.context);
        }

        for raw in doc.front_matter.list("extends") {
            let label = format!("extends {raw}");
            self.connect(doc, &slugify(&raw), EdgeType::Extends, &label, "");
        }
        for raw in doc.front_matter.list("contradicts") {
            let label = format!("contradicts {raw}");
            self.connect(doc, &slugify(&raw), EdgeType::Contradicts, &label, "");
        }
    }

    /// Add an edge to `target_slug`, or record it as broken.
    fn connect(
        &mut self,
        doc: &ParsedDocument,
        target_slug: &str,
        edge_type: EdgeType,
        label: &str,
        context: &str,
    ) {
        let Some(target_id) = self.slug_to_id.get(target_slug) else {
            let context = match edge_type {
                EdgeType::Extends => "frontmatter extends",
                EdgeType::Contradicts => "frontmatter contradicts",
                _ => context,
            };
            tracing::debug!(source = %doc.path, target = target_slug, "unresolved reference");
            self.broken
                .push(BrokenLink::new(&doc.path, target_slug, context));
            return;
        };

        let id = format!("edge-{}", self.edges.len() + 1);
        self.edges.push(
            Edge::new(id, edge_type, &doc.id, target_id)
                .with_label(label)
                .with_context(context),
        );
    }

    fn finish(self) -> (Vec<Edge>, Vec<BrokenLink>) {
        (self.edges, self.broken)
    }
}

// =============================================================================
// TESTS
// =============================================================================
