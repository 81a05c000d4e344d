use serde::Serialize;

use crate::graph::{GraphTraverser, ReferenceGraph};
use crate::types::*;

/// How many citing documents or third-level references are listed before
/// the rest is summarized.
const PREVIEW_LIMIT: usize = 3;

/// What the graph knows about one identifier, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceDetails {
    pub identifier: String,
    /// Id of the known document, `None` if the identifier is not in the graph.
    pub node_id: Option<String>,
    pub canonical_identifier: String,
    pub reference_count: usize,
}

/// Looks up `identifier` by exact id or alias, falling back to a placeholder
/// for identifiers outside the graph.
pub fn reference_details(graph: &ReferenceGraph, identifier: &str) -> ReferenceDetails {
    match graph.lookup_node(identifier) {
        Some(node) => ReferenceDetails {
            identifier: identifier.to_string(),
            node_id: Some(node.id.clone()),
            canonical_identifier: node.canonical_identifier.clone(),
            reference_count: node.reference_count,
        },
        None => ReferenceDetails {
            identifier: identifier.to_string(),
            node_id: None,
            canonical_identifier: identifier.to_string(),
            reference_count: 0,
        },
    }
}

/// Formats a `QueryResult` as a plain-text report: direct references with
/// how each was matched, indirect references per level, a reference tree and
/// a summary.
///
/// All listings are sorted lexicographically so the report is reproducible.
pub fn format_query_as_text(result: &QueryResult, graph: &ReferenceGraph) -> String {
    let mut out = String::new();

    out.push_str("## Citation Analysis\n");
    out.push_str(&format!("**Document:** {}\n\n", result.identifier));

    // Direct references
    out.push_str("### Direct References (Level 1)\n");
    if result.direct.is_empty() {
        out.push_str("_No references found._\n\n");
    } else {
        for (i, entry) in result.direct.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, entry.candidate));
            push_entry_details(&mut out, entry, graph);
            out.push('\n');
        }
    }

    // Indirect references
    out.push_str("### Indirect References (Level 2+)\n");
    if result.indirect.is_empty() {
        out.push_str("_None found._\n\n");
    } else {
        let level_count = result.indirect.levels().count();
        out.push_str(&format!(
            "Found {} across {} level(s)\n\n",
            result.indirect.total(),
            level_count
        ));
        for level in result.indirect.levels() {
            let refs = result.indirect.sorted_level(level);
            out.push_str(&format!("Level {}: {}\n", level, refs.len()));
            for reference in refs {
                out.push_str(&format!("  -> {}\n", reference));
                let details = reference_details(graph, reference);
                if let Some(node_id) = &details.node_id {
                    out.push_str(&format!(
                        "     {} ({} references)\n",
                        node_id, details.reference_count
                    ));
                }
            }
            out.push('\n');
        }
    }

    out.push_str("### Reference Tree\n");
    out.push_str(&format_reference_tree(result, graph));
    out.push('\n');

    let summary = result.summary();
    out.push_str("### Summary\n");
    out.push_str(&format!("- Document: {}\n", result.identifier));
    out.push_str(&format!("- Direct: {}\n", summary.direct));
    out.push_str(&format!("- Indirect: {}\n", summary.indirect));
    out.push_str(&format!("- Total: {}\n", summary.total));
    out.push_str(&format!("- Max depth: {}\n", summary.max_depth));
    out.push_str(&format!("- In graph: {}/{}\n", summary.in_graph, summary.direct));

    out
}

fn push_entry_details(out: &mut String, entry: &ResolutionEntry, graph: &ReferenceGraph) {
    match entry.outcome {
        ResolutionOutcome::ExactNode | ResolutionOutcome::AliasNode => {
            if let Some(node) = entry.followable_node_id().and_then(|id| graph.node(id)) {
                let how = if entry.outcome == ResolutionOutcome::ExactNode {
                    "exact"
                } else {
                    "alias"
                };
                out.push_str(&format!("   In graph ({}): {}\n", how, node.id));
                out.push_str(&format!("   References: {} circulars\n", node.reference_count));
            }
        }
        ResolutionOutcome::ExternallyReferenced => {
            out.push_str(&format!(
                "   Referenced by {} circular(s) in graph\n",
                entry.referenced_by.len()
            ));
            for source in entry.referenced_by.iter().take(PREVIEW_LIMIT) {
                let label = graph
                    .node(source)
                    .map(|n| n.canonical_identifier.as_str())
                    .unwrap_or(source.as_str());
                out.push_str(&format!("     -> {}\n", label));
            }
            if entry.referenced_by.len() > PREVIEW_LIMIT {
                out.push_str(&format!(
                    "     ... +{} more\n",
                    entry.referenced_by.len() - PREVIEW_LIMIT
                ));
            }
        }
        ResolutionOutcome::FuzzyMatch => {
            out.push_str(&format!(
                "   Fuzzy match: {} node(s)\n",
                entry.resolved_node_ids.len()
            ));
            for id in &entry.resolved_node_ids {
                let label = graph
                    .node(id)
                    .map(|n| n.canonical_identifier.as_str())
                    .unwrap_or(id.as_str());
                out.push_str(&format!("     -> {}\n", label));
            }
        }
        ResolutionOutcome::Unresolved => {
            out.push_str("   External (not in graph)\n");
        }
    }
}

/// Renders the first levels of the reference tree: the query document, its
/// direct references, the references of those that are known documents, and
/// up to three references below each of those.
pub fn format_reference_tree(result: &QueryResult, graph: &ReferenceGraph) -> String {
    let traverser = GraphTraverser::new(graph);
    let mut out = format!("{}\n", result.identifier);

    let mut direct: Vec<&ResolutionEntry> = result.direct.iter().collect();
    direct.sort_by(|a, b| a.candidate.cmp(&b.candidate));

    for (i, entry) in direct.iter().enumerate() {
        let prefix = push_branch(&mut out, "", &entry.candidate, i + 1 == direct.len());

        let Some(node) = entry.followable_node_id().and_then(|id| graph.node(id)) else {
            continue;
        };
        let second = &node.outgoing_references;
        for (j, level2) in second.iter().enumerate() {
            let inner = push_branch(&mut out, &prefix, level2, j + 1 == second.len());

            if !result.indirect.contains(2, level2) {
                continue;
            }
            let Some(third) = traverser.references_of(level2) else {
                continue;
            };
            let shown: Vec<&String> = third.iter().take(PREVIEW_LIMIT).collect();
            for (k, level3) in shown.iter().enumerate() {
                push_branch(&mut out, &inner, level3, k + 1 == shown.len());
            }
        }
    }

    out
}

/// Appends one tree line and returns the prefix for its children.
fn push_branch(out: &mut String, prefix: &str, label: &str, is_last: bool) -> String {
    let connector = if is_last { "└── " } else { "├── " };
    out.push_str(&format!("{}{}{}\n", prefix, connector, label));
    format!("{}{}", prefix, if is_last { "    " } else { "│   " })
}

/// Formats a `QueryResult` as pretty-printed JSON.
pub fn format_query_as_json(result: &QueryResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_default()
}

/// Formats graph statistics for terminal output.
pub fn format_stats_as_text(stats: &GraphStats, limit: usize) -> String {
    let mut out = String::new();
    out.push_str("CiteGraph Status\n");
    out.push_str(&format!("  Documents:  {}\n", stats.total_nodes));
    out.push_str(&format!("  References: {}\n", stats.total_edges));
    out.push_str(&format!(
        "  Avg references per document: {}\n",
        stats.avg_references_per_document
    ));
    out.push_str(&format!(
        "  Extraction: {} attempted, {} succeeded, {} failed\n",
        stats.extraction_stats.attempted,
        stats.extraction_stats.succeeded,
        stats.extraction_stats.failed
    ));

    if !stats.most_referenced.is_empty() {
        out.push_str("\n  Most referenced:\n");
        for (i, (reference, count)) in stats.most_referenced.iter().take(limit).enumerate() {
            out.push_str(&format!("    {}. {} ({}x)\n", i + 1, reference, count));
        }
    }
    if !stats.most_outgoing.is_empty() {
        out.push_str("\n  Most outgoing references:\n");
        for (i, (identifier, count)) in stats.most_outgoing.iter().take(limit).enumerate() {
            out.push_str(&format!("    {}. {} ({}x)\n", i + 1, identifier, count));
        }
    }
    out
}
