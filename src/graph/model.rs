use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::normalize::{contains_either, fold_key, normalize};
use crate::types::*;

/// Known documents, their derived edges, and the lookup indexes built over
/// them.
///
/// A `ReferenceGraph` is only produced by [`crate::graph::GraphBuilder`] or by
/// loading a snapshot, and is never mutated afterwards, so a shared reference
/// can be handed to any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    /// Nodes in ingestion order (the order alias conflicts are decided in).
    nodes: Vec<DocumentNode>,
    positions: HashMap<String, usize>,
    edges: Vec<ReferenceEdge>,
    /// Normalized canonical identifier -> node id.
    by_canonical_identifier: HashMap<String, String>,
    /// Raw target identifier -> ids of the documents citing it.
    reverse_reference_index: HashMap<String, Vec<String>>,
    /// Case/whitespace-folded target -> raw targets sharing that fold.
    reverse_folded: HashMap<String, Vec<String>>,
    extraction_stats: ExtractionStats,
}

impl ReferenceGraph {
    /// Assembles a graph from nodes already in ingestion order and derives
    /// edges and indexes in a single pass.
    pub(crate) fn from_ordered_nodes(nodes: Vec<DocumentNode>, stats: ExtractionStats) -> Self {
        let mut graph = Self {
            nodes,
            extraction_stats: stats,
            ..Self::default()
        };
        graph.rebuild_indexes();
        graph
    }

    fn rebuild_indexes(&mut self) {
        self.positions.clear();
        self.edges.clear();
        self.by_canonical_identifier.clear();
        self.reverse_reference_index.clear();
        self.reverse_folded.clear();

        for (pos, node) in self.nodes.iter().enumerate() {
            self.positions.insert(node.id.clone(), pos);

            if node.has_known_identifier() {
                let key = normalize(&node.canonical_identifier);
                if let Some(previous) = self.by_canonical_identifier.insert(key, node.id.clone()) {
                    if previous != node.id {
                        warn!(
                            identifier = %node.canonical_identifier,
                            hidden = %previous,
                            winner = %node.id,
                            "canonical identifier claimed by two documents; alias lookup keeps the later one"
                        );
                    }
                }
            }

            for edge in node.edges() {
                let sources = self
                    .reverse_reference_index
                    .entry(edge.target_identifier.clone())
                    .or_default();
                if sources.is_empty() {
                    self.reverse_folded
                        .entry(fold_key(&edge.target_identifier))
                        .or_default()
                        .push(edge.target_identifier.clone());
                }
                sources.push(node.id.clone());
                self.edges.push(edge);
            }
        }
    }

    /// Returns the node with exactly this id.
    pub fn node(&self, id: &str) -> Option<&DocumentNode> {
        self.positions.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Returns the node whose canonical identifier normalizes to the same key
    /// as `identifier`.
    pub fn node_by_alias(&self, identifier: &str) -> Option<&DocumentNode> {
        let key = normalize(identifier);
        if key.is_empty() {
            return None;
        }
        self.by_canonical_identifier
            .get(&key)
            .and_then(|id| self.node(id))
    }

    /// Exact id first, then alias. Never fuzzy.
    pub fn lookup_node(&self, identifier: &str) -> Option<&DocumentNode> {
        self.node(identifier)
            .or_else(|| self.node_by_alias(identifier))
    }

    /// Ids of known documents citing `identifier`, compared case- and
    /// whitespace-insensitively against the raw targets. Sorted, no duplicates.
    pub fn citing_documents(&self, identifier: &str) -> Vec<String> {
        let Some(raw_targets) = self.reverse_folded.get(&fold_key(identifier)) else {
            return Vec::new();
        };
        let sources: BTreeSet<&String> = raw_targets
            .iter()
            .filter_map(|raw| self.reverse_reference_index.get(raw))
            .flatten()
            .collect();
        sources.into_iter().cloned().collect()
    }

    /// Ids of nodes whose normalized canonical identifier contains, or is
    /// contained in, `normalized`. Sorted.
    pub fn fuzzy_matches(&self, normalized: &str) -> Vec<String> {
        let mut matches: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.has_known_identifier())
            .filter(|node| contains_either(normalized, &normalize(&node.canonical_identifier)))
            .map(|node| node.id.clone())
            .collect();
        matches.sort();
        matches
    }

    /// Nodes in ingestion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> &[ReferenceEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn canonical_index(&self) -> &HashMap<String, String> {
        &self.by_canonical_identifier
    }

    pub fn reverse_index(&self) -> &HashMap<String, Vec<String>> {
        &self.reverse_reference_index
    }

    pub fn extraction_stats(&self) -> ExtractionStats {
        self.extraction_stats
    }
}
