use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::errors::{CiteGraphError, Result};
use crate::graph::model::ReferenceGraph;
use crate::normalize::canonical_or_sentinel;
use crate::types::*;

/// Accumulates extracted documents and produces a [`ReferenceGraph`].
///
/// Ingestion order does not matter except for two documents sharing a
/// canonical identifier, where the later one owns the alias. Re-ingesting an
/// id replaces the earlier node outright.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Node id -> (ingestion sequence, node).
    nodes: HashMap<String, (u64, DocumentNode)>,
    next_seq: u64,
    stats: ExtractionStats,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one document. A document without an id is rejected with
    /// `MalformedInput`; the builder stays usable.
    ///
    /// A blank or `"Unknown"` canonical identifier is replaced by the
    /// `UNKNOWN_<id>` sentinel.
    pub fn ingest(&mut self, mut doc: ExtractedDocument) -> Result<()> {
        if doc.document_id.trim().is_empty() {
            return Err(CiteGraphError::MalformedInput {
                document_id: doc.canonical_identifier.clone(),
                field: "document_id".to_string(),
            });
        }

        doc.canonical_identifier = canonical_or_sentinel(&doc.canonical_identifier, &doc.document_id);

        let node = DocumentNode::from_extracted(doc);
        debug!(
            id = %node.id,
            identifier = %node.canonical_identifier,
            references = node.reference_count,
            "ingested document"
        );

        let seq = self.next_seq;
        self.next_seq += 1;
        if self.nodes.insert(node.id.clone(), (seq, node)).is_some() {
            debug!("replaced previously ingested document");
        }
        Ok(())
    }

    /// Ingests every document, logging and skipping malformed ones.
    /// Returns the number rejected.
    pub fn ingest_all<I>(&mut self, documents: I) -> usize
    where
        I: IntoIterator<Item = ExtractedDocument>,
    {
        let mut rejected = 0;
        for doc in documents {
            if let Err(e) = self.ingest(doc) {
                warn!("skipping document: {}", e);
                rejected += 1;
            }
        }
        rejected
    }

    pub fn record_attempt(&mut self) {
        self.stats.attempted += 1;
    }

    pub fn record_success(&mut self) {
        self.stats.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.stats.failed += 1;
    }

    /// Replaces the run counters wholesale (used when restoring a snapshot).
    pub fn with_stats(mut self, stats: ExtractionStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finishes the build: orders nodes by ingestion and derives edges and
    /// both indexes.
    pub fn build(self) -> ReferenceGraph {
        let mut ordered: Vec<(u64, DocumentNode)> = self.nodes.into_values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        let nodes: Vec<DocumentNode> = ordered.into_iter().map(|(_, node)| node).collect();

        let graph = ReferenceGraph::from_ordered_nodes(nodes, self.stats);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built reference graph"
        );
        graph
    }
}

/// Builds a graph from a stream of extracted documents, skipping malformed
/// ones.
pub fn build_graph<I>(documents: I) -> ReferenceGraph
where
    I: IntoIterator<Item = ExtractedDocument>,
{
    let mut builder = GraphBuilder::new();
    builder.ingest_all(documents);
    builder.build()
}
