use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::errors::{CiteGraphError, Result};
use crate::graph::model::ReferenceGraph;
use crate::normalize::normalize;
use crate::types::*;

/// First hop level held by a [`LeveledReferenceSet`]; level 1 is the query
/// document's own direct references.
pub const FIRST_INDIRECT_LEVEL: u32 = 2;

/// Computes indirect references by walking outgoing references level by
/// level.
pub struct GraphTraverser<'a> {
    graph: &'a ReferenceGraph,
}

impl<'a> GraphTraverser<'a> {
    /// Creates a new `GraphTraverser` over the given graph.
    pub fn new(graph: &'a ReferenceGraph) -> Self {
        Self { graph }
    }

    /// Expands `direct` into indirect references up to `max_depth`.
    ///
    /// Only exact and alias matches are followed, both as seeds and
    /// mid-traversal. Each identifier (by normalized form) is reported at
    /// most once, at the shallowest level it is reached, and never if it is
    /// itself a direct candidate. Items at `max_depth` are reported but not
    /// expanded.
    ///
    /// `max_depth == 1` yields an empty set; `0` is rejected.
    pub fn expand(
        &self,
        direct: &[ResolutionEntry],
        max_depth: u32,
    ) -> Result<LeveledReferenceSet> {
        self.expand_excluding(direct, max_depth, None)
    }

    /// Like [`GraphTraverser::expand`], but also keeps the query document's
    /// own identifier out of the result, so a citation cycle back to the
    /// query document is not reported as an indirect reference.
    pub fn expand_excluding(
        &self,
        direct: &[ResolutionEntry],
        max_depth: u32,
        self_identifier: Option<&str>,
    ) -> Result<LeveledReferenceSet> {
        if max_depth < 1 {
            return Err(CiteGraphError::InvalidDepth { depth: max_depth });
        }

        let mut result = LeveledReferenceSet::new();
        if max_depth < FIRST_INDIRECT_LEVEL {
            return Ok(result);
        }

        let mut visited: HashSet<String> = direct.iter().map(|e| normalize(&e.candidate)).collect();
        if let Some(key) = self_identifier.map(normalize).filter(|k| !k.is_empty()) {
            visited.insert(key);
        }

        // Queue holds (raw identifier, level).
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();

        for entry in direct {
            let Some(node) = entry.followable_node_id().and_then(|id| self.graph.node(id)) else {
                continue;
            };
            for next in &node.outgoing_references {
                if visited.insert(normalize(next)) {
                    result.insert(FIRST_INDIRECT_LEVEL, next.clone());
                    queue.push_back((next.clone(), FIRST_INDIRECT_LEVEL));
                }
            }
        }

        while let Some((current, level)) = queue.pop_front() {
            if level >= max_depth {
                continue;
            }

            let Some(node) = self.graph.lookup_node(&current) else {
                continue;
            };

            for next in &node.outgoing_references {
                if visited.insert(normalize(next)) {
                    result.insert(level + 1, next.clone());
                    queue.push_back((next.clone(), level + 1));
                }
            }
        }

        debug!(
            indirect = result.total(),
            depth = result.max_level().unwrap_or(1),
            "expanded indirect references"
        );
        Ok(result)
    }

    /// Raw outgoing references of the document `identifier` names (exact id
    /// or alias), if it is known.
    pub fn references_of(&self, identifier: &str) -> Option<&'a [String]> {
        self.graph
            .lookup_node(identifier)
            .map(|node| node.outgoing_references.as_slice())
    }
}

/// Expands `direct` over `graph` up to `max_depth`. See
/// [`GraphTraverser::expand`].
pub fn expand(
    direct: &[ResolutionEntry],
    graph: &ReferenceGraph,
    max_depth: u32,
) -> Result<LeveledReferenceSet> {
    GraphTraverser::new(graph).expand(direct, max_depth)
}
