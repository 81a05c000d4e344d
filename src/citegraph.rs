use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{get_snapshot_path, load_config, save_config, should_include_file, CiteGraphConfig};
use crate::errors::{CiteGraphError, Result};
use crate::extraction::ExtractorRegistry;
use crate::graph::{GraphBuilder, GraphQueryManager, ReferenceGraph};
use crate::query;
use crate::snapshot;
use crate::types::*;

/// Central orchestrator tying configuration, extraction, graph building,
/// snapshots and queries together for one project directory.
pub struct CiteGraph {
    /// `None` until the project has been indexed or a snapshot loaded.
    graph: Option<ReferenceGraph>,
    config: CiteGraphConfig,
    project_root: PathBuf,
    registry: ExtractorRegistry,
}

/// Result of a full indexing operation.
pub struct IndexResult {
    /// Number of manifests read.
    pub file_count: usize,
    /// Documents that made it into the graph.
    pub document_count: usize,
    /// Total number of reference edges.
    pub edge_count: usize,
    /// Documents or manifests that could not be ingested.
    pub failed_count: usize,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of extracting one manifest: its path and either the extracted
/// documents or the read error.
type ManifestOutcome = (String, std::result::Result<ExtractionResult, String>);

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl CiteGraph {
    /// Initializes a new CiteGraph project at the given root.
    ///
    /// Creates the `.citegraph` directory and writes a default configuration.
    /// No graph exists until [`CiteGraph::index_all`] runs.
    pub fn init(project_root: &Path) -> Result<Self> {
        let config = CiteGraphConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..CiteGraphConfig::default()
        };
        save_config(project_root, &config)?;
        std::fs::create_dir_all(project_root.join(&config.manifest_dir))?;

        Ok(Self {
            graph: None,
            config,
            project_root: project_root.to_path_buf(),
            registry: ExtractorRegistry::new(),
        })
    }

    /// Opens an existing project, loading its snapshot when one exists.
    ///
    /// A snapshot that exists but cannot be loaded is an error; a project
    /// that has never been indexed opens without a graph.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        let snapshot_path = get_snapshot_path(project_root, &config);

        let graph = if snapshot_path.exists() {
            Some(snapshot::load_snapshot(&snapshot_path)?)
        } else {
            debug!(path = %snapshot_path.display(), "no snapshot yet");
            None
        };

        Ok(Self {
            graph,
            config,
            project_root: project_root.to_path_buf(),
            registry: ExtractorRegistry::new(),
        })
    }

    /// Returns `true` if a graph snapshot has been written for the project.
    pub fn is_indexed(project_root: &Path) -> bool {
        load_config(project_root)
            .map(|config| get_snapshot_path(project_root, &config).exists())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

impl CiteGraph {
    /// Reads every manifest under the manifest directory, builds a fresh
    /// graph and saves its snapshot.
    ///
    /// Manifests are read and parsed in parallel; the graph and its indexes
    /// are assembled afterwards on the calling thread.
    pub fn index_all(&mut self) -> Result<IndexResult> {
        let start = Instant::now();
        let manifest_root = self.project_root.join(&self.config.manifest_dir);
        let files = self.scan_manifests(&manifest_root);
        info!(count = files.len(), dir = %manifest_root.display(), "found manifests");

        let registry = &self.registry;
        let outcomes: Vec<ManifestOutcome> = files
            .par_iter()
            .map(|rel| {
                let outcome = std::fs::read_to_string(manifest_root.join(rel))
                    .map_err(|e| format!("{}: {}", rel, e))
                    .and_then(|source| match registry.extractor_for_file(rel) {
                        Some(extractor) => Ok(extractor.extract(rel, &source)),
                        None => Err(format!("{}: no extractor for this file type", rel)),
                    });
                (rel.clone(), outcome)
            })
            .collect();

        let mut builder = GraphBuilder::new();
        let mut failed = 0;
        for (path, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    for error in &result.errors {
                        warn!("{}", error);
                        builder.record_attempt();
                        builder.record_failure();
                        failed += 1;
                    }
                    for doc in result.documents {
                        builder.record_attempt();
                        match builder.ingest(doc) {
                            Ok(()) => builder.record_success(),
                            Err(e) => {
                                warn!(path = %path, "skipping document: {}", e);
                                builder.record_failure();
                                failed += 1;
                            }
                        }
                    }
                }
                Err(message) => {
                    warn!("failed to read manifest {}", message);
                    builder.record_attempt();
                    builder.record_failure();
                    failed += 1;
                }
            }
        }

        let graph = builder.build();
        let snapshot_path = get_snapshot_path(&self.project_root, &self.config);
        snapshot::save_snapshot(&snapshot_path, &graph, self.config.top_n)?;

        let result = IndexResult {
            file_count: files.len(),
            document_count: graph.node_count(),
            edge_count: graph.edge_count(),
            failed_count: failed,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.graph = Some(graph);
        Ok(result)
    }

    /// Scans the manifest directory, respecting the configured include and
    /// exclude patterns and max file size. Paths are relative and sorted.
    fn scan_manifests(&self, manifest_root: &Path) -> Vec<String> {
        let mut files = Vec::new();
        for entry in WalkDir::new(manifest_root).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            e.depth() == 0 || !name.starts_with('.')
        }) {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if let Ok(relative) = path.strip_prefix(manifest_root) {
                let rel_str = relative.to_string_lossy().replace('\\', "/");
                if !should_include_file(&rel_str, &self.config) {
                    continue;
                }
                if let Ok(metadata) = std::fs::metadata(path) {
                    if metadata.len() <= self.config.max_file_size {
                        files.push(rel_str);
                    } else {
                        warn!(path = %rel_str, size = metadata.len(), "manifest too large, skipping");
                    }
                }
            }
        }
        files.sort();
        files
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl CiteGraph {
    /// Returns the loaded graph, or `UnknownGraph` if the project has not
    /// been indexed.
    pub fn graph(&self) -> Result<&ReferenceGraph> {
        self.graph.as_ref().ok_or_else(|| CiteGraphError::UnknownGraph {
            message: "project has not been indexed; run 'citegraph index' first".to_string(),
            path: get_snapshot_path(&self.project_root, &self.config)
                .display()
                .to_string(),
        })
    }

    /// Resolves and expands the references of one query document.
    ///
    /// `max_depth` defaults to the configured depth.
    pub fn analyze<I, S>(
        &self,
        candidates: I,
        self_identifier: &str,
        max_depth: Option<u32>,
    ) -> Result<QueryResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let graph = self.graph()?;
        query::analyze(
            graph,
            candidates,
            self_identifier,
            max_depth.unwrap_or(self.config.max_depth),
        )
    }

    /// Analyzes every document in an extraction manifest.
    pub fn analyze_manifest(&self, path: &Path, max_depth: Option<u32>) -> Result<Vec<QueryResult>> {
        let graph = self.graph()?;
        let path_str = path.to_string_lossy().to_string();
        let extractor =
            self.registry
                .extractor_for_file(&path_str)
                .ok_or_else(|| CiteGraphError::Extraction {
                    message: format!(
                        "unsupported manifest type (expected one of: {})",
                        self.registry.supported_extensions().join(", ")
                    ),
                    path: path_str.clone(),
                })?;

        let source = std::fs::read_to_string(path)?;
        let extracted = extractor.extract(&path_str, &source);
        if extracted.documents.is_empty() {
            return Err(CiteGraphError::Extraction {
                message: if extracted.errors.is_empty() {
                    "manifest contains no documents".to_string()
                } else {
                    extracted.errors.join("; ")
                },
                path: path_str,
            });
        }
        for error in &extracted.errors {
            warn!("{}", error);
        }

        let depth = max_depth.unwrap_or(self.config.max_depth);
        extracted
            .documents
            .iter()
            .map(|doc| query::analyze_document(graph, doc, depth))
            .collect()
    }

    /// Returns aggregate statistics about the graph.
    pub fn get_stats(&self) -> Result<GraphStats> {
        Ok(GraphQueryManager::new(self.graph()?).statistics(self.config.top_n))
    }

    /// Retrieves a single document by id.
    pub fn get_node(&self, id: &str) -> Result<Option<&DocumentNode>> {
        Ok(self.graph()?.node(id))
    }

    /// Writes the graph to `path` in the given format.
    pub fn export(&self, format: ExportFormat, path: &Path) -> Result<()> {
        snapshot::export_to_file(self.graph()?, format, path, self.config.top_n)
    }

    /// Returns a reference to the current configuration.
    pub fn get_config(&self) -> &CiteGraphConfig {
        &self.config
    }

    /// Returns the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}
