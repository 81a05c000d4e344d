use std::collections::{BTreeSet, HashMap};

use crate::graph::model::ReferenceGraph;
use crate::normalize::normalize;
use crate::types::*;

/// Citation counts around a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetrics {
    /// Number of references the document makes.
    pub outgoing_count: usize,
    /// Known documents citing this one (by id or normalized identifier).
    pub cited_by: Vec<String>,
}

/// Provides analytical query operations over the citation graph.
pub struct GraphQueryManager<'a> {
    graph: &'a ReferenceGraph,
}

impl<'a> GraphQueryManager<'a> {
    /// Creates a new `GraphQueryManager` over the given graph.
    pub fn new(graph: &'a ReferenceGraph) -> Self {
        Self { graph }
    }

    /// Raw target identifiers ordered by how many documents cite them.
    ///
    /// Targets are counted exactly as written; spelling variants of the same
    /// circular are separate entries. Ties are ordered by identifier.
    pub fn most_referenced(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .graph
            .reverse_index()
            .iter()
            .map(|(target, sources)| (target.clone(), sources.len()))
            .collect();
        sort_by_count(&mut counts);
        counts.truncate(limit);
        counts
    }

    /// Canonical identifiers of the documents making the most references.
    pub fn most_outgoing(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .graph
            .nodes()
            .map(|node| (node.canonical_identifier.clone(), node.reference_count))
            .collect();
        sort_by_count(&mut counts);
        counts.truncate(limit);
        counts
    }

    /// Aggregate statistics with top-`top_n` rankings.
    pub fn statistics(&self, top_n: usize) -> GraphStats {
        let total_nodes = self.graph.node_count();
        let total_edges = self.graph.edge_count();
        let avg = if total_nodes == 0 {
            0.0
        } else {
            (total_edges as f64 / total_nodes as f64 * 100.0).round() / 100.0
        };

        GraphStats {
            total_nodes,
            total_edges,
            avg_references_per_document: avg,
            extraction_stats: self.graph.extraction_stats(),
            most_referenced: self.most_referenced(top_n),
            most_outgoing: self.most_outgoing(top_n),
        }
    }

    /// Computes citation metrics for the document with the given id.
    ///
    /// Returns `None` if no such document exists.
    pub fn document_metrics(&self, node_id: &str) -> Option<DocumentMetrics> {
        let node = self.graph.node(node_id)?;
        let own_key = node
            .has_known_identifier()
            .then(|| normalize(&node.canonical_identifier));

        let mut cited_by: BTreeSet<&str> = BTreeSet::new();
        for (target, sources) in self.graph.reverse_index() {
            let hits_id = target == &node.id;
            let hits_identifier = own_key
                .as_deref()
                .is_some_and(|key| normalize(target) == key);
            if hits_id || hits_identifier {
                cited_by.extend(sources.iter().map(String::as_str));
            }
        }
        cited_by.remove(node.id.as_str());

        Some(DocumentMetrics {
            outgoing_count: node.reference_count,
            cited_by: cited_by.into_iter().map(str::to_string).collect(),
        })
    }

    /// Number of distinct raw targets per resolution class: known by exact
    /// id or alias, versus cited but absent from the corpus.
    pub fn coverage(&self) -> HashMap<&'static str, usize> {
        let mut coverage: HashMap<&'static str, usize> = HashMap::new();
        for target in self.graph.reverse_index().keys() {
            let class = if self.graph.lookup_node(target).is_some() {
                "in_graph"
            } else {
                "external"
            };
            *coverage.entry(class).or_default() += 1;
        }
        coverage
    }
}

fn sort_by_count(counts: &mut [(String, usize)]) {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}
