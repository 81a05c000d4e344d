use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::normalize::{is_unknown_identifier, normalize};

/// A known document in the citation graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Stable handle supplied by the extraction step (usually the filename).
    pub id: String,
    /// The document's own declared identifier, or the `UNKNOWN_<id>` sentinel.
    pub canonical_identifier: String,
    /// Raw identifier strings this document cites, sorted and deduplicated.
    pub outgoing_references: Vec<String>,
    /// Number of entries in `outgoing_references`.
    pub reference_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl DocumentNode {
    /// Creates a node from an extracted document. Duplicate references
    /// collapse and `reference_count` is derived.
    pub fn from_extracted(doc: ExtractedDocument) -> Self {
        let outgoing_references: Vec<String> = doc
            .references
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self {
            reference_count: outgoing_references.len(),
            id: doc.document_id,
            canonical_identifier: doc.canonical_identifier,
            outgoing_references,
            title: doc.title,
            date: doc.date,
        }
    }

    /// Returns `false` when the canonical identifier is the unknown sentinel
    /// or normalizes to nothing.
    pub fn has_known_identifier(&self) -> bool {
        !is_unknown_identifier(&self.canonical_identifier, &self.id)
            && !normalize(&self.canonical_identifier).is_empty()
    }

    /// The edges derived from this node's outgoing references.
    pub fn edges(&self) -> impl Iterator<Item = ReferenceEdge> + '_ {
        self.outgoing_references.iter().map(|target| ReferenceEdge {
            source: self.id.clone(),
            target_identifier: target.clone(),
        })
    }
}

/// A directed "references" edge from a known document to a raw identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source: String,
    pub target_identifier: String,
}

/// One document as produced by an extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document_id: String,
    pub canonical_identifier: String,
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ExtractedDocument {
    pub fn new<I, S>(document_id: &str, canonical_identifier: &str, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document_id: document_id.to_string(),
            canonical_identifier: canonical_identifier.to_string(),
            references: references.into_iter().map(Into::into).collect(),
            title: None,
            date: None,
        }
    }
}

/// Result of running an extraction collaborator over one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub documents: Vec<ExtractedDocument>,
    pub errors: Vec<String>,
}

/// Run-level counters supplied by the caller while building a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// How a candidate reference was matched against the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionOutcome {
    ExactNode,
    AliasNode,
    ExternallyReferenced,
    FuzzyMatch,
    Unresolved,
}

#[allow(clippy::should_implement_trait)]
impl ResolutionOutcome {
    /// Returns the string representation of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionOutcome::ExactNode => "exact_node",
            ResolutionOutcome::AliasNode => "alias_node",
            ResolutionOutcome::ExternallyReferenced => "externally_referenced",
            ResolutionOutcome::FuzzyMatch => "fuzzy_match",
            ResolutionOutcome::Unresolved => "unresolved",
        }
    }

    /// Parses a string into a `ResolutionOutcome`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<ResolutionOutcome> {
        match s {
            "exact_node" => Some(ResolutionOutcome::ExactNode),
            "alias_node" => Some(ResolutionOutcome::AliasNode),
            "externally_referenced" => Some(ResolutionOutcome::ExternallyReferenced),
            "fuzzy_match" => Some(ResolutionOutcome::FuzzyMatch),
            "unresolved" => Some(ResolutionOutcome::Unresolved),
            _ => None,
        }
    }

    /// Outcomes that point at a single known node whose outgoing references
    /// can be followed.
    pub fn is_in_graph_node(&self) -> bool {
        matches!(
            self,
            ResolutionOutcome::ExactNode | ResolutionOutcome::AliasNode
        )
    }
}

/// The resolution of one candidate reference for a query document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    pub candidate: String,
    pub outcome: ResolutionOutcome,
    /// One id for exact/alias matches, one or more for fuzzy matches.
    pub resolved_node_ids: Vec<String>,
    /// Known documents citing the candidate, for externally referenced ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<String>,
}

impl ResolutionEntry {
    pub fn unresolved(candidate: &str) -> Self {
        Self {
            candidate: candidate.to_string(),
            outcome: ResolutionOutcome::Unresolved,
            resolved_node_ids: Vec::new(),
            referenced_by: Vec::new(),
        }
    }

    /// The node whose references continue the traversal, if any.
    pub fn followable_node_id(&self) -> Option<&str> {
        if self.outcome.is_in_graph_node() {
            self.resolved_node_ids.first().map(String::as_str)
        } else {
            None
        }
    }
}

/// Indirect references grouped by hop level (level 2 and deeper).
///
/// Sets are unordered; [`LeveledReferenceSet::sorted_level`] gives the
/// lexicographic order used for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveledReferenceSet {
    levels: BTreeMap<u32, HashSet<String>>,
}

impl LeveledReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `identifier` at `level`. Returns `false` if it was already there.
    pub fn insert(&mut self, level: u32, identifier: String) -> bool {
        self.levels.entry(level).or_default().insert(identifier)
    }

    pub fn get(&self, level: u32) -> Option<&HashSet<String>> {
        self.levels.get(&level)
    }

    /// Levels that hold at least one identifier, ascending.
    pub fn levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels
            .iter()
            .filter(|(_, refs)| !refs.is_empty())
            .map(|(level, _)| *level)
    }

    /// Identifiers at `level`, sorted lexicographically.
    pub fn sorted_level(&self, level: u32) -> Vec<&str> {
        let mut refs: Vec<&str> = self
            .levels
            .get(&level)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        refs.sort_unstable();
        refs
    }

    pub fn contains(&self, level: u32, identifier: &str) -> bool {
        self.levels
            .get(&level)
            .is_some_and(|set| set.contains(identifier))
    }

    /// Total number of indirect identifiers across all levels.
    pub fn total(&self) -> usize {
        self.levels.values().map(HashSet::len).sum()
    }

    /// Deepest level holding an identifier.
    pub fn max_level(&self) -> Option<u32> {
        self.levels().last()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &HashSet<String>)> {
        self.levels
            .iter()
            .filter(|(_, refs)| !refs.is_empty())
            .map(|(level, refs)| (*level, refs))
    }
}

/// Everything computed for one query document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The query document's own identifier (or sentinel).
    pub identifier: String,
    pub direct: Vec<ResolutionEntry>,
    pub indirect: LeveledReferenceSet,
}

/// Summary counts for a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySummary {
    pub direct: usize,
    pub indirect: usize,
    pub total: usize,
    /// Deepest level reached; 1 when there are no indirect references.
    pub max_depth: u32,
    /// Direct references matched to at least one known document.
    pub in_graph: usize,
}

impl QueryResult {
    pub fn summary(&self) -> QuerySummary {
        let direct = self.direct.len();
        let indirect = self.indirect.total();
        let in_graph = self
            .direct
            .iter()
            .filter(|e| {
                e.outcome.is_in_graph_node() || e.outcome == ResolutionOutcome::FuzzyMatch
            })
            .count();
        QuerySummary {
            direct,
            indirect,
            total: direct + indirect,
            max_depth: self.indirect.max_level().unwrap_or(1),
            in_graph,
        }
    }
}

/// Aggregate statistics about a citation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub avg_references_per_document: f64,
    pub extraction_stats: ExtractionStats,
    /// Raw target identifiers with the most citing documents.
    pub most_referenced: Vec<(String, usize)>,
    /// Canonical identifiers of the documents citing the most references.
    pub most_outgoing: Vec<(String, usize)>,
}

/// Export formats for a whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    GraphMl,
    Cytoscape,
}

#[allow(clippy::should_implement_trait)]
impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::GraphMl => "graphml",
            Self::Cytoscape => "cytoscape",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "graphml" => Some(Self::GraphMl),
            "cytoscape" => Some(Self::Cytoscape),
            _ => None,
        }
    }
}

/// Output format for single-query reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}
