use tracing::info;

use crate::errors::Result;
use crate::graph::{GraphTraverser, ReferenceGraph};
use crate::resolution::ReferenceResolver;
use crate::types::*;

/// Resolves a query document's candidate references and expands them into
/// indirect references up to `max_depth`.
///
/// `self_identifier` is the document's own canonical identifier (or its
/// sentinel); it is filtered from the direct references and never reported
/// as an indirect one.
pub fn analyze<I, S>(
    graph: &ReferenceGraph,
    candidates: I,
    self_identifier: &str,
    max_depth: u32,
) -> Result<QueryResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let direct = ReferenceResolver::new(graph).resolve_all(candidates, self_identifier);
    let indirect =
        GraphTraverser::new(graph).expand_excluding(&direct, max_depth, Some(self_identifier))?;

    let result = QueryResult {
        identifier: self_identifier.to_string(),
        direct,
        indirect,
    };

    let summary = result.summary();
    info!(
        identifier = %self_identifier,
        direct = summary.direct,
        indirect = summary.indirect,
        in_graph = summary.in_graph,
        "analyzed document"
    );
    Ok(result)
}

/// Analyzes an extracted document.
pub fn analyze_document(
    graph: &ReferenceGraph,
    doc: &ExtractedDocument,
    max_depth: u32,
) -> Result<QueryResult> {
    analyze(graph, &doc.references, &doc.canonical_identifier, max_depth)
}
