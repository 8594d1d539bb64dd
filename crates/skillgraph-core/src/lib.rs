//! # skillgraph-core
//!
//! The deterministic skill-graph pipeline - THE LOGIC.
//!
//! Converts a set of interlinked markdown documents (YAML front matter plus
//! `[[wikilink]]` references) into a typed knowledge graph, and scores the
//! structural quality of any such graph.
//!
//! ## Pipeline
//!
//! ```text
//! documents -> Ingestor -> front matter / wikilinks / sections (per document)
//!           -> GraphBuilder (global slug namespace)
//!           -> Degrees + cluster::detect -> Metrics
//!           -> Validator -> SkillGraph
//! ```
//!
//! Metrics, clustering and validation are pure functions of `(nodes, edges)`,
//! so a graph produced elsewhere can be re-scored with [`Validator::validate`].
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no file I/O
//! - `BTreeMap`/`BTreeSet` for every keyed collection
//! - Integer arithmetic for scoring; floats only for presented ratios

// =============================================================================
// MODULES
// =============================================================================

pub mod cluster;
pub mod frontmatter;
pub mod graph;
pub mod ingestor;
pub mod metrics;
pub mod primitives;
pub mod sections;
pub mod slug;
pub mod types;
pub mod validation;
pub mod wikilink;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Content, Edge, EdgeType, Node, NodeMetadata, NodeType, Section, SkillGraphError, Source,
};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use frontmatter::{FieldValue, FrontMatter, ParsedMarkdown};
pub use graph::{GraphBuilder, SkillGraph};
pub use ingestor::{Ingestor, SourceDocument};
pub use metrics::{DegreeExtreme, Degrees, Metrics};
pub use slug::slugify;
pub use wikilink::Wikilink;

// =============================================================================
// RE-EXPORTS: Validation
// =============================================================================

pub use validation::{
    Bonuses, BrokenLink, BuildFindings, Grade, Issues, Rubric, RubricDescription,
    ValidationReport, Validator,
};
