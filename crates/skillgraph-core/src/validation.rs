//! # Quality Validator
//!
//! Penalty/bonus rubric scoring the structural quality of a skill graph.
//!
//! ## Scoring
//!
//! 1. Start at 100 and subtract every penalty.
//! 2. Clamp to `[0, 100]`.
//! 3. Add the MOC coverage and link-density bonuses (0–10 each).
//! 4. Clamp to `[0, 100]` again.
//!
//! The two clamps mean a heavily penalised graph can claw back up to 20
//! points from bonuses, and small graphs where `max(1, clusters)` hides a
//! zero-cluster case can look better than their defects suggest. This is the
//! rubric as published; it is reported, not corrected.
//!
//! All arithmetic is integer. Bonuses round halves up.
//!
//! ## Modes
//!
//! - [`Validator::validate`] scores an arbitrary `(nodes, edges)` pair; a
//!   broken link is an edge whose target is not a node id.
//! - [`Validator::validate_build`] additionally receives the builder's
//!   [`BuildFindings`]: references that never became edges, and nodes whose
//!   type was defaulted because front matter omitted it.

use crate::cluster;
use crate::metrics::{Degrees, Metrics, div_round};
use crate::primitives::{
    BROKEN_LINK_PENALTY, CIRCULAR_ONLY_PENALTY, DEAD_END_DEGREE, DEFAULT_DOMAIN, MAX_BONUS,
    MAX_SCORE, MISSING_DESCRIPTION_PENALTY, MISSING_DOMAIN_PENALTY, MISSING_TYPE_PENALTY,
    MOC_MAX_CHILDREN, MOC_MIN_CHILDREN, ORPHAN_PENALTY,
};
use crate::{Edge, EdgeType, Node, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// GRADE
// =============================================================================

/// Letter grade derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Minimum score for each passing grade, best first.
    pub const THRESHOLDS: [(Grade, u8); 4] =
        [(Grade::A, 90), (Grade::B, 75), (Grade::C, 60), (Grade::D, 40)];

    #[must_use]
    pub fn from_score(score: u8) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(_, min)| score >= *min)
            .map_or(Grade::F, |(grade, _)| *grade)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// ISSUE RECORDS
// =============================================================================

/// A reference that does not resolve to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    /// Originating file path (inline) or source node id (standalone).
    pub source: String,
    pub target: String,
    pub context: String,
    pub penalty: i64,
}

impl BrokenLink {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            context: context.into(),
            penalty: -BROKEN_LINK_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDescription {
    pub file: String,
    pub node_id: String,
    pub penalty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingType {
    pub file: String,
    pub node_id: String,
    /// The type as written, `None` when it was absent.
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub penalty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDomain {
    pub file: String,
    pub node_id: String,
    pub penalty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Orphan {
    pub node_id: String,
    pub name: String,
    pub penalty: i64,
}

/// Two nodes whose only edges are one each way between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularPair {
    pub node_id: String,
    pub partner_id: String,
    pub penalty: i64,
}

/// Informational: a MOC with too few or too many members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MocWarning {
    pub node_id: String,
    pub name: String,
    pub child_count: usize,
    pub issue: String,
}

/// Every detected issue, by category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issues {
    pub broken_links: Vec<BrokenLink>,
    pub missing_descriptions: Vec<MissingDescription>,
    pub missing_types: Vec<MissingType>,
    pub missing_domains: Vec<MissingDomain>,
    pub orphans: Vec<Orphan>,
    pub circular_only: Vec<CircularPair>,
    pub moc_warnings: Vec<MocWarning>,
}

// =============================================================================
// BONUSES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MocCoverageBonus {
    pub value: i64,
    pub clusters_with_moc: usize,
    pub total_clusters: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDensityBonus {
    pub value: i64,
    pub dead_ends: usize,
    pub total_nodes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bonuses {
    pub moc_coverage: MocCoverageBonus,
    pub link_density_health: LinkDensityBonus,
}

// =============================================================================
// REPORT
// =============================================================================

/// The outcome of scoring a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub score: u8,
    pub max_score: u8,
    pub grade: Grade,
    pub issues: Issues,
    pub bonuses: Bonuses,
    pub metrics: Metrics,
    pub summary: String,
}

/// What the builder learned that the finished graph no longer shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFindings {
    /// References that failed to resolve and produced no edge.
    pub broken_links: Vec<BrokenLink>,
    /// Ids of nodes whose type was absent from front matter.
    pub untyped_nodes: BTreeSet<String>,
}

// =============================================================================
// RUBRIC
// =============================================================================

/// Penalty weights and MOC bounds applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub broken_link: i64,
    pub missing_description: i64,
    pub missing_type: i64,
    pub missing_domain: i64,
    pub orphan: i64,
    pub circular_only: i64,
    pub moc_min_children: usize,
    pub moc_max_children: usize,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            broken_link: BROKEN_LINK_PENALTY,
            missing_description: MISSING_DESCRIPTION_PENALTY,
            missing_type: MISSING_TYPE_PENALTY,
            missing_domain: MISSING_DOMAIN_PENALTY,
            orphan: ORPHAN_PENALTY,
            circular_only: CIRCULAR_ONLY_PENALTY,
            moc_min_children: MOC_MIN_CHILDREN,
            moc_max_children: MOC_MAX_CHILDREN,
        }
    }
}

/// One penalised category of the rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyRule {
    pub issue: String,
    pub points: i64,
    pub description: String,
}

/// One bonus of the rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusRule {
    pub bonus: String,
    pub max_points: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeThreshold {
    pub grade: Grade,
    pub min_score: u8,
}

/// Static, documentation-oriented description of the rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricDescription {
    pub max_score: u8,
    pub penalties: Vec<PenaltyRule>,
    pub bonuses: Vec<BonusRule>,
    pub informational: Vec<String>,
    pub grades: Vec<GradeThreshold>,
    pub valid_types: Vec<String>,
}

impl Rubric {
    /// Describe this rubric for documentation endpoints.
    #[must_use]
    pub fn describe(&self) -> RubricDescription {
        let rule = |issue: &str, points: i64, description: &str| PenaltyRule {
            issue: issue.to_string(),
            points: -points,
            description: description.to_string(),
        };
        RubricDescription {
            max_score: MAX_SCORE as u8,
            penalties: vec![
                rule("brokenLinks", self.broken_link, "References to non-existent nodes"),
                rule("missingDescriptions", self.missing_description, "Nodes without a description"),
                rule("orphans", self.orphan, "Nodes with no connections"),
                rule("missingTypes", self.missing_type, "Nodes with an invalid or missing type"),
                rule("circularOnly", self.circular_only, "Node pairs linked only to each other, per pair"),
                rule("missingDomains", self.missing_domain, "Nodes without a domain"),
            ],
            bonuses: vec![
                BonusRule {
                    bonus: "mocCoverage".to_string(),
                    max_points: MAX_BONUS,
                    description: "Share of clusters containing a MOC node".to_string(),
                },
                BonusRule {
                    bonus: "linkDensityHealth".to_string(),
                    max_points: MAX_BONUS,
                    description: "Balanced degree distribution (few nodes with degree <= 1)"
                        .to_string(),
                },
            ],
            informational: vec![format!(
                "mocWarnings: MOC nodes with fewer than {} or more than {} CLUSTERS children",
                self.moc_min_children, self.moc_max_children
            )],
            grades: Grade::THRESHOLDS
                .iter()
                .map(|(grade, min_score)| GradeThreshold {
                    grade: *grade,
                    min_score: *min_score,
                })
                .collect(),
            valid_types: NodeType::known()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
        }
    }
}

// =============================================================================
// VALIDATOR
// =============================================================================

/// Validator - pure function from a graph to a report.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rubric: Rubric,
}

impl Validator {
    /// Create a validator applying the published rubric.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom weights.
    #[must_use]
    pub fn with_rubric(rubric: Rubric) -> Self {
        Self { rubric }
    }

    #[must_use]
    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Score an arbitrary graph.
    #[must_use]
    pub fn validate(&self, nodes: &[Node], edges: &[Edge]) -> ValidationReport {
        let node_ids: BTreeSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let broken_links = edges
            .iter()
            .filter(|e| !node_ids.contains(e.target.as_str()))
            .map(|e| BrokenLink::new(&e.source, &e.target, &e.context))
            .collect();
        self.score(nodes, edges, broken_links, &BTreeSet::new())
    }

    /// Score a freshly built graph together with what the builder found.
    #[must_use]
    pub fn validate_build(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        findings: &BuildFindings,
    ) -> ValidationReport {
        self.score(
            nodes,
            edges,
            findings.broken_links.clone(),
            &findings.untyped_nodes,
        )
    }

    fn score(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        broken_links: Vec<BrokenLink>,
        untyped: &BTreeSet<String>,
    ) -> ValidationReport {
        let rubric = &self.rubric;
        let degrees = Degrees::compute(nodes, edges);
        let clusters = cluster::detect(nodes, edges);

        let issues = Issues {
            broken_links: broken_links
                .into_iter()
                .map(|link| BrokenLink {
                    penalty: -rubric.broken_link,
                    ..link
                })
                .collect(),
            missing_descriptions: nodes
                .iter()
                .filter(|n| n.description.trim().is_empty())
                .map(|n| MissingDescription {
                    file: n.origin().to_string(),
                    node_id: n.id.clone(),
                    penalty: -rubric.missing_description,
                })
                .collect(),
            missing_types: nodes
                .iter()
                .filter_map(|n| self.type_issue(n, untyped))
                .collect(),
            missing_domains: nodes
                .iter()
                .filter(|n| {
                    n.domain
                        .as_deref()
                        .is_none_or(|d| d.is_empty() || d == DEFAULT_DOMAIN)
                })
                .map(|n| MissingDomain {
                    file: n.origin().to_string(),
                    node_id: n.id.clone(),
                    penalty: -rubric.missing_domain,
                })
                .collect(),
            orphans: nodes
                .iter()
                .filter(|n| degrees.total_of(&n.id) == 0)
                .map(|n| Orphan {
                    node_id: n.id.clone(),
                    name: n.name.clone(),
                    penalty: -rubric.orphan,
                })
                .collect(),
            circular_only: self.circular_pairs(nodes, edges),
            moc_warnings: self.moc_warnings(nodes, edges),
        };

        let bonuses = Bonuses {
            moc_coverage: moc_coverage(nodes, &clusters),
            link_density_health: link_density(nodes, &degrees),
        };

        let penalty_total: i64 = penalty_lines(&issues, rubric)
            .iter()
            .map(|line| line.points)
            .sum();
        let base = (MAX_SCORE - penalty_total).clamp(0, MAX_SCORE);
        let with_bonuses = base
            .saturating_add(bonuses.moc_coverage.value)
            .saturating_add(bonuses.link_density_health.value)
            .clamp(0, MAX_SCORE);
        let score = u8::try_from(with_bonuses).unwrap_or(0);

        let summary = summarize(score, &issues, rubric);
        let metrics = Metrics::from_parts(nodes, edges, &degrees, &clusters);

        ValidationReport {
            score,
            max_score: MAX_SCORE as u8,
            grade: Grade::from_score(score),
            issues,
            bonuses,
            metrics,
            summary,
        }
    }

    fn type_issue(&self, node: &Node, untyped: &BTreeSet<String>) -> Option<MissingType> {
        let written = if untyped.contains(&node.id) {
            None
        } else {
            match &node.node_type {
                Some(t) if t.is_known() => return None,
                Some(t) => Some(t.as_str().to_string()).filter(|s| !s.is_empty()),
                None => None,
            }
        };
        Some(MissingType {
            file: node.origin().to_string(),
            node_id: node.id.clone(),
            node_type: written,
            penalty: -self.rubric.missing_type,
        })
    }

    /// Nodes whose whole edge set is one edge out to B and one edge in from B.
    fn circular_pairs(&self, nodes: &[Node], edges: &[Edge]) -> Vec<CircularPair> {
        let mut out_targets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut in_sources: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for edge in edges {
            out_targets
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
            in_sources
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }

        let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
        let mut pairs = Vec::new();
        for node in nodes {
            let id = node.id.as_str();
            let (Some(outs), Some(ins)) = (out_targets.get(id), in_sources.get(id)) else {
                continue;
            };
            if let ([partner], [back]) = (outs.as_slice(), ins.as_slice()) {
                if partner != back {
                    continue;
                }
                let key = if id <= *partner { (id, *partner) } else { (*partner, id) };
                if seen.insert(key) {
                    pairs.push(CircularPair {
                        node_id: id.to_string(),
                        partner_id: (*partner).to_string(),
                        penalty: -self.rubric.circular_only,
                    });
                }
            }
        }
        pairs
    }

    fn moc_warnings(&self, nodes: &[Node], edges: &[Edge]) -> Vec<MocWarning> {
        let mut warnings = Vec::new();
        for moc in nodes.iter().filter(|n| n.is_moc()) {
            let child_count = edges
                .iter()
                .filter(|e| e.source == moc.id && e.edge_type == Some(EdgeType::Clusters))
                .count();
            let issue = if child_count < self.rubric.moc_min_children {
                format!("Too few children (< {})", self.rubric.moc_min_children)
            } else if child_count > self.rubric.moc_max_children {
                format!(
                    "Too many children (> {}), consider splitting",
                    self.rubric.moc_max_children
                )
            } else {
                continue;
            };
            warnings.push(MocWarning {
                node_id: moc.id.clone(),
                name: moc.name.clone(),
                child_count,
                issue,
            });
        }
        warnings
    }
}

// =============================================================================
// BONUS COMPUTATION
// =============================================================================

fn moc_coverage(nodes: &[Node], clusters: &[Vec<String>]) -> MocCoverageBonus {
    let moc_ids: BTreeSet<&str> = nodes
        .iter()
        .filter(|n| n.is_moc())
        .map(|n| n.id.as_str())
        .collect();
    let clusters_with_moc = clusters
        .iter()
        .filter(|c| c.iter().any(|id| moc_ids.contains(id.as_str())))
        .count();
    let value = div_round(
        MAX_BONUS as u64 * clusters_with_moc as u64,
        clusters.len().max(1) as u64,
    );
    MocCoverageBonus {
        value: value as i64,
        clusters_with_moc,
        total_clusters: clusters.len(),
    }
}

fn link_density(nodes: &[Node], degrees: &Degrees) -> LinkDensityBonus {
    let total_nodes = nodes.len();
    let dead_ends = nodes
        .iter()
        .filter(|n| degrees.total_of(&n.id) <= DEAD_END_DEGREE)
        .count();
    // round(max(0, 10 * (1 - 2 * dead_ends / total)))
    let numerator = MAX_BONUS * total_nodes as i64 - 2 * MAX_BONUS * dead_ends as i64;
    let value = if total_nodes == 0 || numerator <= 0 {
        0
    } else {
        div_round(numerator as u64, total_nodes as u64) as i64
    };
    LinkDensityBonus {
        value,
        dead_ends,
        total_nodes,
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

struct PenaltyLine {
    count: usize,
    singular: &'static str,
    plural: &'static str,
    points: i64,
}

fn penalty_lines(issues: &Issues, rubric: &Rubric) -> Vec<PenaltyLine> {
    let line = |count: usize, singular, plural, weight: i64| PenaltyLine {
        count,
        singular,
        plural,
        points: count as i64 * weight,
    };
    vec![
        line(issues.broken_links.len(), "broken link", "broken links", rubric.broken_link),
        line(
            issues.missing_descriptions.len(),
            "missing description",
            "missing descriptions",
            rubric.missing_description,
        ),
        line(issues.orphans.len(), "orphan node", "orphan nodes", rubric.orphan),
        line(
            issues.missing_types.len(),
            "invalid/missing type",
            "invalid/missing types",
            rubric.missing_type,
        ),
        line(
            issues.circular_only.len(),
            "circular-only pair",
            "circular-only pairs",
            rubric.circular_only,
        ),
        line(
            issues.missing_domains.len(),
            "missing domain",
            "missing domains",
            rubric.missing_domain,
        ),
    ]
}

fn summarize(score: u8, issues: &Issues, rubric: &Rubric) -> String {
    let mut lines: Vec<PenaltyLine> = penalty_lines(issues, rubric)
        .into_iter()
        .filter(|line| line.count > 0)
        .collect();
    if lines.is_empty() {
        return "Perfect score! Graph has no structural issues.".to_string();
    }
    lines.sort_by(|a, b| b.points.cmp(&a.points));

    let parts: Vec<String> = lines
        .iter()
        .map(|line| {
            let label = if line.count == 1 {
                line.singular
            } else {
                line.plural
            };
            format!("{} {} (-{})", line.count, label, line.points)
        })
        .collect();
    format!("Score {}/{}. Fix: {}.", score, MAX_SCORE, parts.join(", "))
}

// =============================================================================
// TESTS
// =============================================================================
