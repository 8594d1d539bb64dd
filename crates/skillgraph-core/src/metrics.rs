//! # Graph Metrics
//!
//! Aggregate statistics over any `(nodes, edges)` pair.
//!
//! Degrees are recomputed from the edge list every time; whatever a caller
//! put in `metadata.inDegree`/`outDegree` is ignored. Ratios are computed in
//! integer fixed point and only turned into `f64` for presentation
//! (density to 4 decimals, average degree to 2).

use crate::cluster;
use crate::{Edge, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bucket used for nodes or edges without a type.
pub const UNKNOWN_BUCKET: &str = "unknown";

const DENSITY_SCALE: u64 = 10_000;
const AVG_DEGREE_SCALE: u64 = 100;

// =============================================================================
// DEGREES
// =============================================================================

/// In/out degree per node id, derived from an edge list.
///
/// An edge contributes to its source's out-degree only if the source is a
/// node, and to its target's in-degree only if the target is a node.
#[derive(Debug, Clone, Default)]
pub struct Degrees {
    in_degree: BTreeMap<String, usize>,
    out_degree: BTreeMap<String, usize>,
}

impl Degrees {
    #[must_use]
    pub fn compute(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut degrees = Self::default();
        for node in nodes {
            degrees.in_degree.insert(node.id.clone(), 0);
            degrees.out_degree.insert(node.id.clone(), 0);
        }
        for edge in edges {
            if let Some(out) = degrees.out_degree.get_mut(&edge.source) {
                *out += 1;
            }
            if let Some(inc) = degrees.in_degree.get_mut(&edge.target) {
                *inc += 1;
            }
        }
        degrees
    }

    #[must_use]
    pub fn in_of(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn out_of(&self, id: &str) -> usize {
        self.out_degree.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_of(&self, id: &str) -> usize {
        self.in_of(id) + self.out_of(id)
    }
}

// =============================================================================
// METRICS
// =============================================================================

/// The node achieving a maximum degree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeExtreme {
    pub node_id: String,
    pub value: usize,
}

/// Graph-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub node_count: usize,
    pub edge_count: usize,
    /// `edges / (nodes * (nodes - 1))`, 0 below two nodes.
    pub density: f64,
    /// Mean of `in + out` over all nodes.
    pub avg_degree: f64,
    /// Distinct non-empty domains in first-seen order.
    pub domains: Vec<String>,
    pub type_breakdown: BTreeMap<String, usize>,
    pub edge_type_breakdown: BTreeMap<String, usize>,
    pub cluster_count: usize,
    pub orphan_count: usize,
    pub moc_count: usize,
    pub max_in_degree: DegreeExtreme,
    pub max_out_degree: DegreeExtreme,
}

impl Metrics {
    /// Compute metrics from scratch.
    #[must_use]
    pub fn compute(nodes: &[Node], edges: &[Edge]) -> Self {
        let degrees = Degrees::compute(nodes, edges);
        let clusters = cluster::detect(nodes, edges);
        Self::from_parts(nodes, edges, &degrees, &clusters)
    }

    /// Compute metrics reusing already derived degrees and clusters.
    #[must_use]
    pub fn from_parts(
        nodes: &[Node],
        edges: &[Edge],
        degrees: &Degrees,
        clusters: &[Vec<String>],
    ) -> Self {
        let node_count = nodes.len();
        let edge_count = edges.len();

        let density = if node_count > 1 {
            let pairs = (node_count as u64).saturating_mul(node_count as u64 - 1);
            let scaled = div_round((edge_count as u64).saturating_mul(DENSITY_SCALE), pairs);
            fixed_to_f64(scaled, DENSITY_SCALE)
        } else {
            0.0
        };

        let degree_sum: u64 = nodes
            .iter()
            .map(|n| degrees.total_of(&n.id) as u64)
            .sum();
        let avg_degree = if node_count > 0 {
            let scaled = div_round(
                degree_sum.saturating_mul(AVG_DEGREE_SCALE),
                node_count as u64,
            );
            fixed_to_f64(scaled, AVG_DEGREE_SCALE)
        } else {
            0.0
        };

        let mut seen_domains = BTreeSet::new();
        let domains = nodes
            .iter()
            .filter_map(|n| n.domain.as_deref())
            .filter(|d| !d.is_empty() && seen_domains.insert(*d))
            .map(str::to_string)
            .collect();

        let mut type_breakdown = BTreeMap::new();
        for node in nodes {
            let label = node
                .node_type
                .as_ref()
                .map(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_BUCKET);
            *type_breakdown.entry(label.to_string()).or_insert(0) += 1;
        }

        let mut edge_type_breakdown = BTreeMap::new();
        for edge in edges {
            let label = edge
                .edge_type
                .as_ref()
                .map(|t| t.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_BUCKET);
            *edge_type_breakdown.entry(label.to_string()).or_insert(0) += 1;
        }

        Self {
            node_count,
            edge_count,
            density,
            avg_degree,
            domains,
            type_breakdown,
            edge_type_breakdown,
            cluster_count: clusters.len(),
            orphan_count: nodes.iter().filter(|n| degrees.total_of(&n.id) == 0).count(),
            moc_count: nodes.iter().filter(|n| n.is_moc()).count(),
            max_in_degree: extreme(nodes, |id| degrees.in_of(id)),
            max_out_degree: extreme(nodes, |id| degrees.out_of(id)),
        }
    }
}

/// First node (in node order) achieving the maximum of `degree`.
fn extreme(nodes: &[Node], degree: impl Fn(&str) -> usize) -> DegreeExtreme {
    let mut best = DegreeExtreme::default();
    for (i, node) in nodes.iter().enumerate() {
        let value = degree(&node.id);
        if i == 0 || value > best.value {
            best = DegreeExtreme {
                node_id: node.id.clone(),
                value,
            };
        }
    }
    best
}

/// Integer division rounding halves up. Returns 0 for a zero denominator.
pub(crate) fn div_round(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    numerator.saturating_mul(2).saturating_add(denominator) / denominator.saturating_mul(2)
}

#[allow(clippy::float_arithmetic)]
fn fixed_to_f64(value: u64, scale: u64) -> f64 {
    value as f64 / scale as f64
}

// =============================================================================
// TESTS
// =============================================================================
