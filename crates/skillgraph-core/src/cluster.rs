//! # Cluster Detector
//!
//! Connected components over the undirected projection of the edge set,
//! computed with a disjoint-set forest (path compression + union by size).
//!
//! Works on any `(nodes, edges)` pair: edges whose endpoints are not node
//! ids are ignored, and a repeated node id is considered once.

use crate::{Edge, Node};
use std::collections::BTreeMap;

/// Disjoint-set forest over dense indices.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    /// Create `n` singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Find the root of `x`, compressing the path behind it.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`. Returns false if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        true
    }
}

/// Detect clusters of size ≥ 2.
///
/// Clusters are ordered by their first member in node order, and members
/// keep node order. Nodes not listed are singletons.
#[must_use]
pub fn detect(nodes: &[Node], edges: &[Edge]) -> Vec<Vec<String>> {
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut ids: Vec<&str> = Vec::new();
    for node in nodes {
        if !index.contains_key(node.id.as_str()) {
            index.insert(node.id.as_str(), ids.len());
            ids.push(node.id.as_str());
        }
    }

    let mut sets = DisjointSet::new(ids.len());
    for edge in edges {
        if let (Some(&a), Some(&b)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            sets.union(a, b);
        }
    }

    let mut slot_by_root: BTreeMap<usize, usize> = BTreeMap::new();
    let mut groups: Vec<Vec<String>> = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let root = sets.find(i);
        let slot = *slot_by_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push((*id).to_string());
    }

    groups.retain(|group| group.len() > 1);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeType, NodeType};

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::new(*id, Some(NodeType::Skill)))
            .collect()
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge::new("e", EdgeType::References, source, target)
    }

    #[test]
    fn singletons_are_filtered() {
        assert!(detect(&nodes(&["a", "b", "c"]), &[]).is_empty());
    }

    #[test]
    fn direction_is_ignored() {
        let clusters = detect(
            &nodes(&["a", "b", "c", "d", "e"]),
            &[edge("b", "a"), edge("c", "b"), edge("d", "e")],
        );
        assert_eq!(
            clusters,
            vec![
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["d".to_string(), "e".to_string()],
            ]
        );
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let clusters = detect(&nodes(&["a", "b"]), &[edge("a", "ghost"), edge("ghost", "b")]);
        assert!(clusters.is_empty());
    }

    #[test]
    fn duplicate_node_ids_counted_once() {
        let clusters = detect(&nodes(&["a", "a", "b"]), &[edge("a", "b")]);
        assert_eq!(clusters, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn disjoint_set_union_find() {
        let mut sets = DisjointSet::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));
        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));
    }
}
