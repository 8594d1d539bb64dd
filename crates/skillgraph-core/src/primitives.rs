//! # Innate Primitives
//!
//! Hardcoded constants shared by the pipeline and the quality rubric.
//!
//! The builder, the validator and the rubric description all read from this
//! module, so the numbers reported by `GET /validate` are the numbers the
//! validator actually applies.

// =============================================================================
// GRAPH IDENTITY
// =============================================================================

/// Discriminator carried by every graph, node and edge of this family.
pub const GRAPH_KIND: &str = "skill";

/// Version of the emitted graph document schema.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Prefix prepended to a document slug to form its node id.
pub const NODE_ID_PREFIX: &str = "skill:";

/// Domain assigned when front matter does not declare one.
///
/// A node carrying this value is still reported as missing its domain.
pub const DEFAULT_DOMAIN: &str = "general";

// =============================================================================
// EDGE WEIGHTS
// =============================================================================

/// Weight of a `CLUSTERS` edge (MOC membership).
pub const CLUSTERS_WEIGHT: f64 = 1.0;

/// Weight of every other edge type.
pub const DEFAULT_EDGE_WEIGHT: f64 = 0.7;

// =============================================================================
// EXTRACTION LIMITS
// =============================================================================

/// Maximum number of characters kept in a section preview.
pub const SECTION_PREVIEW_CHARS: usize = 400;

// =============================================================================
// CORPUS LIMITS (enforced by the Ingestor, never by the builder)
// =============================================================================

/// Maximum number of markdown documents admitted into one build.
pub const MAX_DOCUMENT_COUNT: usize = 500;

/// Maximum cumulative UTF-8 byte length of admitted markdown text (5 MiB).
pub const MAX_TOTAL_TEXT_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of nodes accepted by standalone validation.
pub const MAX_VALIDATION_NODES: usize = 5000;

// =============================================================================
// SCORING RUBRIC
// =============================================================================

/// Score a graph starts from before penalties.
pub const MAX_SCORE: i64 = 100;

/// Penalty per unresolved reference.
pub const BROKEN_LINK_PENALTY: i64 = 10;

/// Penalty per node without a description.
pub const MISSING_DESCRIPTION_PENALTY: i64 = 5;

/// Penalty per node with zero total degree.
pub const ORPHAN_PENALTY: i64 = 3;

/// Penalty per node whose type is absent or outside the closed set.
pub const MISSING_TYPE_PENALTY: i64 = 2;

/// Penalty per unordered node pair linked only to each other.
pub const CIRCULAR_ONLY_PENALTY: i64 = 2;

/// Penalty per node without a meaningful domain.
pub const MISSING_DOMAIN_PENALTY: i64 = 1;

/// Upper bound of each bonus.
pub const MAX_BONUS: i64 = 10;

/// A MOC with fewer CLUSTERS children than this is flagged.
pub const MOC_MIN_CHILDREN: usize = 3;

/// A MOC with more CLUSTERS children than this is flagged.
pub const MOC_MAX_CHILDREN: usize = 20;

/// Nodes with total degree at or below this value count as dead ends.
pub const DEAD_END_DEGREE: usize = 1;
