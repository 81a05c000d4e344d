use std::fs;

use citegraph::errors::CiteGraphError;
use citegraph::graph::{build_graph, GraphBuilder, ReferenceGraph};
use citegraph::snapshot::*;
use citegraph::types::*;
use tempfile::TempDir;

fn sample_graph() -> ReferenceGraph {
    let mut builder = GraphBuilder::new();
    builder.record_attempt();
    builder.record_attempt();
    builder.record_success();
    builder.record_failure();
    builder.ingest_all(vec![
        ExtractedDocument::new("a.pdf", "CIR/1", ["CIR/2", "EXT/<9>"]),
        ExtractedDocument::new("b.pdf", "CIR/2", ["CIR/1"]),
        ExtractedDocument::new("c.pdf", "cir 2", Vec::<String>::new()),
    ]);
    builder.build()
}

#[test]
fn test_snapshot_roundtrip_preserves_graph() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("graph.json");
    let graph = sample_graph();

    save_snapshot(&path, &graph, 10).unwrap();
    let loaded = load_snapshot(&path).unwrap();

    assert_eq!(
        loaded.nodes().collect::<Vec<_>>(),
        graph.nodes().collect::<Vec<_>>()
    );
    assert_eq!(loaded.edges(), graph.edges());
    assert_eq!(loaded.extraction_stats(), graph.extraction_stats());
    assert_eq!(fingerprint(&loaded), fingerprint(&graph));
}

#[test]
fn test_snapshot_roundtrip_keeps_alias_winner() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("graph.json");
    let graph = sample_graph();
    assert_eq!(graph.node_by_alias("CIR/2").unwrap().id, "c.pdf");

    save_snapshot(&path, &graph, 10).unwrap();
    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded.node_by_alias("CIR/2").unwrap().id, "c.pdf");
}

#[test]
fn test_load_missing_snapshot_is_unknown_graph() {
    let tmp = TempDir::new().unwrap();
    let err = load_snapshot(&tmp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, CiteGraphError::UnknownGraph { .. }));
}

#[test]
fn test_load_corrupt_snapshot_is_unknown_graph() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("graph.json");
    fs::write(&path, "{ not json").unwrap();

    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, CiteGraphError::UnknownGraph { .. }));
}

#[test]
fn test_load_future_version_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("graph.json");
    let mut snapshot = export_snapshot(&sample_graph(), 5);
    snapshot.version = SNAPSHOT_VERSION + 1;
    fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(err, CiteGraphError::UnknownGraph { .. }));
}

#[test]
fn test_import_rebuilds_edges_from_nodes() {
    let mut snapshot = export_snapshot(&sample_graph(), 5);
    snapshot.edges.clear();

    let graph = import_snapshot(snapshot);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.citing_documents("CIR/1"), vec!["b.pdf"]);
}

#[test]
fn test_fingerprint_ignores_ingestion_order() {
    let docs = vec![
        ExtractedDocument::new("a.pdf", "CIR/1", ["CIR/2"]),
        ExtractedDocument::new("b.pdf", "CIR/2", ["CIR/1"]),
    ];
    let forward = build_graph(docs.clone());
    let backward = build_graph(docs.into_iter().rev());
    assert_eq!(fingerprint(&forward), fingerprint(&backward));

    let changed = build_graph(vec![
        ExtractedDocument::new("a.pdf", "CIR/1", ["CIR/3"]),
        ExtractedDocument::new("b.pdf", "CIR/2", ["CIR/1"]),
    ]);
    assert_ne!(fingerprint(&forward), fingerprint(&changed));
    assert_eq!(fingerprint(&forward).len(), 64);
}

#[test]
fn test_snapshot_statistics_included() {
    let snapshot = export_snapshot(&sample_graph(), 1);
    assert_eq!(snapshot.statistics.total_nodes, 3);
    assert_eq!(snapshot.statistics.total_edges, 3);
    assert_eq!(snapshot.statistics.most_referenced.len(), 1);
}

#[test]
fn test_graphml_escapes_identifiers() {
    let xml = to_graphml(&sample_graph());
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(r#"<node id="a.pdf">"#));
    assert!(xml.contains("EXT/&lt;9&gt;"));
    assert!(!xml.contains("EXT/<9>"));
    assert_eq!(xml.matches("<edge ").count(), 3);
    assert!(xml.trim_end().ends_with("</graphml>"));
}

#[test]
fn test_cytoscape_elements() {
    let value = to_cytoscape(&sample_graph());
    let nodes = value["elements"]["nodes"].as_array().unwrap();
    let edges = value["elements"]["edges"].as_array().unwrap();

    assert_eq!(nodes.len(), 3);
    assert_eq!(edges.len(), 3);
    assert_eq!(nodes[0]["data"]["id"], "a.pdf");
    assert_eq!(nodes[0]["data"]["label"], "CIR/1");
    assert_eq!(edges[0]["data"]["source"], "a.pdf");
    assert_eq!(edges[0]["data"]["label"], "references");
}

#[test]
fn test_export_to_file_each_format() {
    let tmp = TempDir::new().unwrap();
    let graph = sample_graph();

    let json_path = tmp.path().join("out/graph.json");
    export_to_file(&graph, ExportFormat::Json, &json_path, 5).unwrap();
    let snapshot: GraphSnapshot =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(snapshot.nodes.len(), 3);

    let graphml_path = tmp.path().join("graph.graphml");
    export_to_file(&graph, ExportFormat::GraphMl, &graphml_path, 5).unwrap();
    assert!(fs::read_to_string(&graphml_path).unwrap().contains("<graphml"));

    let cy_path = tmp.path().join("graph.cyjs");
    export_to_file(&graph, ExportFormat::Cytoscape, &cy_path, 5).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&cy_path).unwrap()).unwrap();
    assert!(value["elements"]["nodes"].is_array());

    assert!(!tmp.path().join("graph.tmp").exists());
}
