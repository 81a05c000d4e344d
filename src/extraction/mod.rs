/// Extraction collaborators.
///
/// Turning a circular into `(document id, canonical identifier, candidate
/// references)` happens outside this crate (PDF text extraction followed by
/// pattern matching or a language model). The collaborators here read the
/// manifests those steps leave behind.
mod manifest;

pub use manifest::{JsonLinesExtractor, JsonManifestExtractor, ManifestRecord};

use crate::types::ExtractionResult;

/// Trait for manifest-format-specific extractors.
///
/// Each implementation handles one file format and never reaches outside
/// the source text it is handed.
pub trait ReferenceExtractor: Send + Sync {
    /// File extensions this extractor handles (without leading dot).
    fn extensions(&self) -> &[&str];

    /// Human-readable format name.
    fn format_name(&self) -> &str;

    /// Extract documents from one manifest.
    ///
    /// `file_path` is used in error messages and as the fallback document id.
    /// Malformed records are reported in `errors`; the rest still come back.
    fn extract(&self, file_path: &str, source: &str) -> ExtractionResult;
}

/// Registry of all available extractors.
///
/// Dispatches to the correct extractor based on file extension.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ReferenceExtractor>>,
}

impl ExtractorRegistry {
    /// Creates a new registry with all built-in extractors.
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(JsonManifestExtractor), Box::new(JsonLinesExtractor)],
        }
    }

    /// Returns the extractor for a file path based on its extension.
    pub fn extractor_for_file(&self, path: &str) -> Option<&dyn ReferenceExtractor> {
        let ext = path.rsplit('.').next()?;
        self.extractors
            .iter()
            .find(|e| e.extensions().contains(&ext))
            .map(|e| e.as_ref())
    }

    /// Returns all supported file extensions across all extractors.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extractors
            .iter()
            .flat_map(|e| e.extensions().iter().copied())
            .collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
