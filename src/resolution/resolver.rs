use std::collections::BTreeSet;

use tracing::debug;

use crate::graph::ReferenceGraph;
use crate::normalize::normalize;
use crate::types::*;

/// Classifies candidate references against a built graph.
///
/// Holds only a shared borrow of the graph; resolution has no side effects.
pub struct ReferenceResolver<'a> {
    graph: &'a ReferenceGraph,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over the given graph.
    pub fn new(graph: &'a ReferenceGraph) -> Self {
        Self { graph }
    }

    /// Resolves a single candidate.
    ///
    /// Strategies are tried in order, first match wins:
    /// 1. **Exact node** -- the candidate is a node id verbatim.
    /// 2. **Alias node** -- the normalized candidate is a known canonical
    ///    identifier.
    /// 3. **Externally referenced** -- some known document cites the
    ///    candidate (case/whitespace-insensitive), but no document declares it.
    /// 4. **Fuzzy match** -- the normalized candidate and a node's normalized
    ///    canonical identifier contain one another.
    /// 5. **Unresolved** otherwise.
    pub fn resolve_one(&self, candidate: &str) -> ResolutionEntry {
        if let Some(node) = self.graph.node(candidate) {
            return self.single(candidate, ResolutionOutcome::ExactNode, &node.id);
        }

        if let Some(node) = self.graph.node_by_alias(candidate) {
            return self.single(candidate, ResolutionOutcome::AliasNode, &node.id);
        }

        let citing = self.graph.citing_documents(candidate);
        if !citing.is_empty() {
            return ResolutionEntry {
                candidate: candidate.to_string(),
                outcome: ResolutionOutcome::ExternallyReferenced,
                resolved_node_ids: Vec::new(),
                referenced_by: citing,
            };
        }

        let matches = self.graph.fuzzy_matches(&normalize(candidate));
        if !matches.is_empty() {
            return ResolutionEntry {
                candidate: candidate.to_string(),
                outcome: ResolutionOutcome::FuzzyMatch,
                resolved_node_ids: matches,
                referenced_by: Vec::new(),
            };
        }

        ResolutionEntry::unresolved(candidate)
    }

    /// Resolves every candidate of a query document.
    ///
    /// Candidates that normalize to the document's own identifier are dropped.
    /// Every other distinct candidate yields exactly one entry; entries are
    /// ordered by candidate.
    pub fn resolve_all<I, S>(&self, candidates: I, self_identifier: &str) -> Vec<ResolutionEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let own_key = normalize(self_identifier);
        let unique: BTreeSet<String> = candidates
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();

        let mut entries = Vec::with_capacity(unique.len());
        for candidate in &unique {
            if !own_key.is_empty() && normalize(candidate) == own_key {
                debug!(candidate = %candidate, "dropping self-reference");
                continue;
            }
            let entry = self.resolve_one(candidate);
            debug!(
                candidate = %candidate,
                outcome = entry.outcome.as_str(),
                "resolved candidate"
            );
            entries.push(entry);
        }
        entries
    }

    // ------------------------------------------------------------------
    // Private helpers
    // ------------------------------------------------------------------

    fn single(&self, candidate: &str, outcome: ResolutionOutcome, node_id: &str) -> ResolutionEntry {
        ResolutionEntry {
            candidate: candidate.to_string(),
            outcome,
            resolved_node_ids: vec![node_id.to_string()],
            referenced_by: Vec::new(),
        }
    }
}

/// Resolves `candidates` for the document identified by `self_identifier`.
/// See [`ReferenceResolver::resolve_all`].
pub fn resolve<I, S>(candidates: I, graph: &ReferenceGraph, self_identifier: &str) -> Vec<ResolutionEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ReferenceResolver::new(graph).resolve_all(candidates, self_identifier)
}
