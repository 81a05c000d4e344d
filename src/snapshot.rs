//! Flat import/export of a [`ReferenceGraph`].
//!
//! The JSON snapshot is the only persisted form of a graph. Indexes are never
//! written; importing replays the nodes through [`GraphBuilder`] so edges and
//! indexes are rebuilt exactly as they were derived originally. GraphML and
//! Cytoscape exports are one-way, for external visualization tools.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config;
use crate::errors::{CiteGraphError, Result};
use crate::graph::{GraphBuilder, GraphQueryManager, ReferenceGraph};
use crate::types::*;

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    /// SHA-256 over the node contents; see [`fingerprint`].
    pub fingerprint: String,
    pub nodes: Vec<DocumentNode>,
    pub edges: Vec<ReferenceEdge>,
    pub statistics: GraphStats,
}

/// Computes a content fingerprint of the graph's nodes, independent of
/// ingestion order.
pub fn fingerprint(graph: &ReferenceGraph) -> String {
    let mut nodes: Vec<&DocumentNode> = graph.nodes().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut hasher = Sha256::new();
    for node in nodes {
        hasher.update(node.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(node.canonical_identifier.as_bytes());
        hasher.update([0u8]);
        for reference in &node.outgoing_references {
            hasher.update(reference.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([1u8]);
    }
    hex::encode(hasher.finalize())
}

/// Captures a graph as a snapshot, with top-`top_n` statistics.
pub fn export_snapshot(graph: &ReferenceGraph, top_n: usize) -> GraphSnapshot {
    GraphSnapshot {
        version: SNAPSHOT_VERSION,
        fingerprint: fingerprint(graph),
        nodes: graph.nodes().cloned().collect(),
        edges: graph.edges().to_vec(),
        statistics: GraphQueryManager::new(graph).statistics(top_n),
    }
}

/// Rebuilds a graph from a snapshot.
///
/// Nodes are re-ingested in their stored order, so alias conflicts resolve
/// the same way as in the exported graph. Stored edges are only checked
/// against the derived ones.
pub fn import_snapshot(snapshot: GraphSnapshot) -> ReferenceGraph {
    let mut builder = GraphBuilder::new().with_stats(snapshot.statistics.extraction_stats);
    let stored_edges = snapshot.edges.len();
    let expected_fingerprint = snapshot.fingerprint;

    builder.ingest_all(snapshot.nodes.into_iter().map(|node| ExtractedDocument {
        document_id: node.id,
        canonical_identifier: node.canonical_identifier,
        references: node.outgoing_references,
        title: node.title,
        date: node.date,
    }));
    let graph = builder.build();

    if graph.edge_count() != stored_edges {
        warn!(
            stored = stored_edges,
            derived = graph.edge_count(),
            "snapshot edge list disagrees with node references; using derived edges"
        );
    }
    if !expected_fingerprint.is_empty() && fingerprint(&graph) != expected_fingerprint {
        warn!("snapshot fingerprint mismatch; the file was modified after export");
    }
    graph
}

/// Writes the JSON snapshot atomically (temp file, then rename).
pub fn save_snapshot(path: &Path, graph: &ReferenceGraph, top_n: usize) -> Result<()> {
    let snapshot = export_snapshot(graph, top_n);
    let json = serde_json::to_string_pretty(&snapshot)?;
    write_atomic(path, &json)?;
    info!(path = %path.display(), nodes = graph.node_count(), "saved graph snapshot");
    Ok(())
}

/// Loads a graph snapshot.
///
/// A missing or unreadable snapshot is an `UnknownGraph` error: there is no
/// graph to resolve against, and an empty one must not be substituted.
pub fn load_snapshot(path: &Path) -> Result<ReferenceGraph> {
    let unknown = |message: String| CiteGraphError::UnknownGraph {
        message,
        path: path.display().to_string(),
    };

    if !path.exists() {
        return Err(unknown(
            "no graph snapshot found; run 'citegraph index' first".to_string(),
        ));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| unknown(format!("failed to read snapshot: {}", e)))?;
    let snapshot: GraphSnapshot = serde_json::from_str(&contents)
        .map_err(|e| unknown(format!("failed to parse snapshot: {}", e)))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(unknown(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    let graph = import_snapshot(snapshot);
    info!(path = %path.display(), nodes = graph.node_count(), "loaded graph snapshot");
    Ok(graph)
}

/// Renders the graph as GraphML.
pub fn to_graphml(graph: &ReferenceGraph) -> String {
    let mut lines: Vec<String> = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">"#.to_string(),
        r#"  <key id="canonical_identifier" for="node" attr.name="canonical_identifier" attr.type="string"/>"#.to_string(),
        r#"  <key id="title" for="node" attr.name="title" attr.type="string"/>"#.to_string(),
        r#"  <key id="date" for="node" attr.name="date" attr.type="string"/>"#.to_string(),
        r#"  <key id="reference_count" for="node" attr.name="reference_count" attr.type="int"/>"#.to_string(),
        r#"  <key id="target_identifier" for="edge" attr.name="target_identifier" attr.type="string"/>"#.to_string(),
        r#"  <graph id="G" edgedefault="directed">"#.to_string(),
    ];

    for node in graph.nodes() {
        lines.push(format!(r#"    <node id="{}">"#, escape_xml(&node.id)));
        lines.push(format!(
            r#"      <data key="canonical_identifier">{}</data>"#,
            escape_xml(&node.canonical_identifier)
        ));
        lines.push(format!(
            r#"      <data key="title">{}</data>"#,
            escape_xml(node.title.as_deref().unwrap_or(""))
        ));
        lines.push(format!(
            r#"      <data key="date">{}</data>"#,
            escape_xml(node.date.as_deref().unwrap_or(""))
        ));
        lines.push(format!(
            r#"      <data key="reference_count">{}</data>"#,
            node.reference_count
        ));
        lines.push("    </node>".to_string());
    }

    for (i, edge) in graph.edges().iter().enumerate() {
        lines.push(format!(
            r#"    <edge id="e{}" source="{}" target="{}">"#,
            i,
            escape_xml(&edge.source),
            escape_xml(&edge.target_identifier)
        ));
        lines.push(format!(
            r#"      <data key="target_identifier">{}</data>"#,
            escape_xml(&edge.target_identifier)
        ));
        lines.push("    </edge>".to_string());
    }

    lines.push("  </graph>".to_string());
    lines.push("</graphml>".to_string());
    lines.join("\n")
}

/// Renders the graph as Cytoscape.js elements.
pub fn to_cytoscape(graph: &ReferenceGraph) -> Value {
    let nodes: Vec<Value> = graph
        .nodes()
        .map(|node| {
            json!({
                "data": {
                    "id": node.id,
                    "label": node.canonical_identifier,
                    "title": node.title.as_deref().unwrap_or(""),
                    "date": node.date.as_deref().unwrap_or(""),
                    "reference_count": node.reference_count,
                }
            })
        })
        .collect();

    let edges: Vec<Value> = graph
        .edges()
        .iter()
        .enumerate()
        .map(|(i, edge)| {
            json!({
                "data": {
                    "id": format!("e{}", i),
                    "source": edge.source,
                    "target": edge.target_identifier,
                    "label": "references",
                }
            })
        })
        .collect();

    json!({ "elements": { "nodes": nodes, "edges": edges } })
}

/// Writes the graph to `path` in the requested format.
pub fn export_to_file(
    graph: &ReferenceGraph,
    format: ExportFormat,
    path: &Path,
    top_n: usize,
) -> Result<()> {
    let contents = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&export_snapshot(graph, top_n))?,
        ExportFormat::GraphMl => to_graphml(graph),
        ExportFormat::Cytoscape => serde_json::to_string_pretty(&to_cytoscape(graph))?,
    };
    write_atomic(path, &contents)?;
    info!(path = %path.display(), format = format.as_str(), "exported graph");
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    config::write_atomic(path, contents).map_err(|e| CiteGraphError::Snapshot {
        message: format!("failed to write file: {}", e),
        path: path.display().to_string(),
    })
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
