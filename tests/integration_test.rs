use std::fs;
use std::path::Path;

use citegraph::citegraph::CiteGraph;
use citegraph::errors::CiteGraphError;
use citegraph::report::{format_query_as_json, format_query_as_text};
use citegraph::types::*;
use tempfile::TempDir;

/// Creates a project with two manifests:
/// - `2024/batch.json`: three circulars citing each other in a chain, plus
///   one malformed record.
/// - `2023/old.jsonl`: one older circular and a line that is not JSON.
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    CiteGraph::init(dir.path()).unwrap();

    let manifests = dir.path().join("manifests");
    fs::create_dir_all(manifests.join("2024")).unwrap();
    fs::create_dir_all(manifests.join("2023")).unwrap();

    fs::write(
        manifests.join("2024/batch.json"),
        r#"[
            {
                "document_id": "circ_a.pdf",
                "canonical_identifier": "SEBI/HO/MRD/2024/10",
                "title": "Trading hours",
                "date": "2024-03-01",
                "references": ["SEBI HO MRD 2023 7", "NSE/CIR/2015/1"]
            },
            {
                "document_id": "circ_b.pdf",
                "canonical_identifier": "SEBI/HO/MRD/2023/7",
                "references": ["SEBI/HO/MRD/2020/2"]
            },
            {
                "canonical_identifier": "SEBI/HO/MRD/2022/1",
                "references": []
            }
        ]"#,
    )
    .unwrap();

    fs::write(
        manifests.join("2023/old.jsonl"),
        concat!(
            r#"{"document_id": "circ_c.pdf", "canonical_identifier": "SEBI/HO/MRD/2020/2", "references": ["RBI/1999/4"]}"#,
            "\n",
            "{ broken\n",
        ),
    )
    .unwrap();

    dir
}

fn write_query(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_init_creates_layout_without_graph() {
    let dir = TempDir::new().unwrap();
    let cg = CiteGraph::init(dir.path()).unwrap();

    assert!(dir.path().join(".citegraph/config.json").exists());
    assert!(dir.path().join("manifests").is_dir());
    assert!(!CiteGraph::is_indexed(dir.path()));
    assert!(matches!(cg.graph(), Err(CiteGraphError::UnknownGraph { .. })));
}

#[test]
fn test_analyze_before_index_is_unknown_graph() {
    let dir = setup_project();
    let cg = CiteGraph::open(dir.path()).unwrap();

    let err = cg.analyze(["SEBI/HO/MRD/2023/7"], "X/1", None).unwrap_err();
    assert!(matches!(err, CiteGraphError::UnknownGraph { .. }));
}

#[test]
fn test_index_all_builds_and_saves() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    let result = cg.index_all().unwrap();

    assert_eq!(result.file_count, 2);
    assert_eq!(result.document_count, 3);
    assert_eq!(result.edge_count, 4);
    assert_eq!(result.failed_count, 2);
    assert!(CiteGraph::is_indexed(dir.path()));

    let stats = cg.get_stats().unwrap();
    assert_eq!(stats.extraction_stats.attempted, 5);
    assert_eq!(stats.extraction_stats.succeeded, 3);
    assert_eq!(stats.extraction_stats.failed, 2);

    let node = cg.get_node("circ_a.pdf").unwrap().unwrap();
    assert_eq!(node.title.as_deref(), Some("Trading hours"));
}

#[test]
fn test_open_reloads_snapshot() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    let reopened = CiteGraph::open(dir.path()).unwrap();
    let graph = reopened.graph().unwrap();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.node_by_alias("sebi/ho/mrd/2023/7").unwrap().id, "circ_b.pdf");
}

#[test]
fn test_corrupt_snapshot_fails_open() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();
    fs::write(dir.path().join(".citegraph/graph.json"), "garbage").unwrap();

    let err = CiteGraph::open(dir.path()).err().unwrap();
    assert!(matches!(err, CiteGraphError::UnknownGraph { .. }));
}

#[test]
fn test_analyze_end_to_end() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    let result = cg
        .analyze(
            ["SEBI/HO/MRD/2024/10", "SEBI HO MRD 2023 7", "NSE/CIR/2015/1", "BSE/9", "MRD/2020"],
            "SEBI/HO/MRD/2025/1",
            None,
        )
        .unwrap();

    let outcome = |candidate: &str| {
        result
            .direct
            .iter()
            .find(|e| e.candidate == candidate)
            .map(|e| e.outcome)
    };
    assert_eq!(outcome("SEBI/HO/MRD/2024/10"), Some(ResolutionOutcome::AliasNode));
    assert_eq!(outcome("SEBI HO MRD 2023 7"), Some(ResolutionOutcome::AliasNode));
    assert_eq!(outcome("NSE/CIR/2015/1"), Some(ResolutionOutcome::ExternallyReferenced));
    assert_eq!(outcome("BSE/9"), Some(ResolutionOutcome::Unresolved));
    assert_eq!(outcome("MRD/2020"), Some(ResolutionOutcome::FuzzyMatch));

    // circ_a's own references are direct candidates already; circ_b leads to
    // circ_c, which cites an external circular.
    assert_eq!(result.indirect.sorted_level(2), vec!["SEBI/HO/MRD/2020/2"]);
    assert_eq!(result.indirect.sorted_level(3), vec!["RBI/1999/4"]);

    let summary = result.summary();
    assert_eq!(summary.direct, 5);
    assert_eq!(summary.indirect, 2);
    assert_eq!(summary.max_depth, 3);
    assert_eq!(summary.in_graph, 3);

    let shallow = cg
        .analyze(["SEBI/HO/MRD/2023/7"], "SEBI/HO/MRD/2025/1", Some(2))
        .unwrap();
    assert_eq!(shallow.indirect.total(), 1);

    let err = cg.analyze(["SEBI/HO/MRD/2023/7"], "X", Some(0)).unwrap_err();
    assert!(matches!(err, CiteGraphError::InvalidDepth { depth: 0 }));
}

#[test]
fn test_analyze_manifest_filters_self_reference() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    let query = write_query(
        dir.path(),
        "query.json",
        r#"{
            "document_id": "new.pdf",
            "canonical_identifier": "SEBI/HO/MRD/2020/2",
            "references": ["SEBI-HO-MRD-2020-2", "SEBI/HO/MRD/2024/10"]
        }"#,
    );
    let results = cg.analyze_manifest(&query, None).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.identifier, "SEBI/HO/MRD/2020/2");
    assert_eq!(result.direct.len(), 1);
    assert_eq!(result.direct[0].candidate, "SEBI/HO/MRD/2024/10");

    // circ_a -> circ_b -> (query document itself, excluded).
    assert!(result.indirect.contains(2, "SEBI HO MRD 2023 7"));
    assert!(result.indirect.contains(2, "NSE/CIR/2015/1"));
    assert_eq!(result.indirect.total(), 2);
}

#[test]
fn test_analyze_manifest_rejects_empty_or_unsupported() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    let bad = write_query(dir.path(), "bad.json", r#"[{"canonical_identifier": "X/1"}]"#);
    let err = cg.analyze_manifest(&bad, None).unwrap_err();
    assert!(matches!(err, CiteGraphError::Extraction { .. }));

    let txt = write_query(dir.path(), "query.txt", "SEBI/HO/MRD/2023/7");
    let err = cg.analyze_manifest(&txt, None).unwrap_err();
    assert!(matches!(err, CiteGraphError::Extraction { .. }));
}

#[test]
fn test_reports_render() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    let result = cg
        .analyze(["SEBI/HO/MRD/2024/10", "BSE/9"], "SEBI/HO/MRD/2025/1", None)
        .unwrap();
    let text = format_query_as_text(&result, cg.graph().unwrap());
    assert!(text.contains("## Citation Analysis"));
    assert!(text.contains("SEBI/HO/MRD/2024/10"));
    assert!(text.contains("### Summary"));

    let json: serde_json::Value = serde_json::from_str(&format_query_as_json(&result)).unwrap();
    assert_eq!(json["identifier"], "SEBI/HO/MRD/2025/1");
    assert_eq!(json["direct"].as_array().unwrap().len(), 2);
}

#[test]
fn test_export_all_formats() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    for (format, name) in [
        (ExportFormat::Json, "out.json"),
        (ExportFormat::GraphMl, "out.graphml"),
        (ExportFormat::Cytoscape, "out.cyjs"),
    ] {
        let path = dir.path().join("exports").join(name);
        cg.export(format, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }
}

#[test]
fn test_reindex_replaces_graph() {
    let dir = setup_project();
    let mut cg = CiteGraph::open(dir.path()).unwrap();
    cg.index_all().unwrap();

    fs::remove_file(dir.path().join("manifests/2023/old.jsonl")).unwrap();
    let result = cg.index_all().unwrap();
    assert_eq!(result.document_count, 2);
    assert!(cg.get_node("circ_c.pdf").unwrap().is_none());

    let reopened = CiteGraph::open(dir.path()).unwrap();
    assert_eq!(reopened.graph().unwrap().node_count(), 2);
}
