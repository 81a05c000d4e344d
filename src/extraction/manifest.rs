use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{CiteGraphError, Result};
use crate::extraction::ReferenceExtractor;
use crate::normalize::canonical_or_sentinel;
use crate::types::{ExtractedDocument, ExtractionResult};

/// One document record as written by an upstream extraction step.
///
/// Every field is optional at the serde level so that a record with a missing
/// field is reported as malformed rather than failing the whole manifest.
/// Node records of graph exports are accepted too: those carry the id twice
/// (`id` and `filename`), name the identifier `circular_no`, and may list
/// references as `outgoing_references`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, alias = "circular_no")]
    pub canonical_identifier: Option<String>,
    #[serde(default, alias = "outgoing_references")]
    pub references: Option<Vec<String>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl ManifestRecord {
    /// Validates the record into an [`ExtractedDocument`].
    ///
    /// `document_id` and `references` are required (an empty reference list
    /// is fine). A missing canonical identifier becomes the unknown sentinel.
    pub fn into_document(self, origin: &str) -> Result<ExtractedDocument> {
        let document_id = [&self.document_id, &self.id, &self.filename]
            .into_iter()
            .filter_map(|field| field.as_deref().map(str::trim))
            .find(|id| !id.is_empty());
        let document_id = match document_id {
            Some(id) => id.to_string(),
            _ => {
                return Err(CiteGraphError::MalformedInput {
                    document_id: origin.to_string(),
                    field: "document_id".to_string(),
                })
            }
        };

        let Some(references) = self.references else {
            return Err(CiteGraphError::MalformedInput {
                document_id,
                field: "references".to_string(),
            });
        };

        let canonical_identifier =
            canonical_or_sentinel(self.canonical_identifier.as_deref().unwrap_or(""), &document_id);

        Ok(ExtractedDocument {
            references: references
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            document_id,
            canonical_identifier,
            title: non_blank(self.title),
            date: non_blank(self.date),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("unknown"))
}

/// Collects one parsed JSON value into `result`, recording a malformed record
/// as an error instead of a document.
fn collect_record(value: Value, origin: &str, result: &mut ExtractionResult) {
    let record: ManifestRecord = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            result.errors.push(format!("{}: invalid record: {}", origin, e));
            return;
        }
    };
    match record.into_document(origin) {
        Ok(doc) => result.documents.push(doc),
        Err(e) => result.errors.push(e.to_string()),
    }
}

fn collect_records(items: Vec<Value>, origin: &str, result: &mut ExtractionResult) {
    for (index, item) in items.into_iter().enumerate() {
        collect_record(item, &format!("{}[{}]", origin, index), result);
    }
}

/// Reads `.json` manifests holding one document object, an array of them,
/// or a graph export whose `nodes` array holds them.
pub struct JsonManifestExtractor;

impl ReferenceExtractor for JsonManifestExtractor {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn format_name(&self) -> &str {
        "json"
    }

    fn extract(&self, file_path: &str, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        let value: Value = match serde_json::from_str(source) {
            Ok(v) => v,
            Err(e) => {
                result.errors.push(format!("{}: {}", file_path, e));
                return result;
            }
        };

        match value {
            Value::Array(items) => collect_records(items, file_path, &mut result),
            Value::Object(mut object) if object.get("nodes").is_some_and(Value::is_array) => {
                if let Some(Value::Array(nodes)) = object.remove("nodes") {
                    collect_records(nodes, &format!("{}:nodes", file_path), &mut result);
                }
            }
            other => collect_record(other, file_path, &mut result),
        }

        debug!(
            path = file_path,
            documents = result.documents.len(),
            errors = result.errors.len(),
            "read json manifest"
        );
        result
    }
}

/// Reads `.jsonl` manifests with one document object per line. Blank lines
/// are skipped.
pub struct JsonLinesExtractor;

impl ReferenceExtractor for JsonLinesExtractor {
    fn extensions(&self) -> &[&str] {
        &["jsonl"]
    }

    fn format_name(&self) -> &str {
        "jsonl"
    }

    fn extract(&self, file_path: &str, source: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for (line_no, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let origin = format!("{}:{}", file_path, line_no + 1);
            match serde_json::from_str::<Value>(line) {
                Ok(value) => collect_record(value, &origin, &mut result),
                Err(e) => result.errors.push(format!("{}: {}", origin, e)),
            }
        }

        debug!(
            path = file_path,
            documents = result.documents.len(),
            errors = result.errors.len(),
            "read jsonl manifest"
        );
        result
    }
}
