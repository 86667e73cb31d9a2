use crate::error::ExtractError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// One document handed to the pipeline. Consumed once per invocation; the
/// graph store holds the only durable record of what was extracted.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub source_path: PathBuf,
    pub format: DocumentFormat,
    pub title: String,
}

impl RawDocument {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .ok_or_else(|| ExtractError::UnsupportedFormat(path.display().to_string()))?;

        let title = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ExtractError::MissingFileName(path.display().to_string()))?
            .to_string();

        Ok(Self {
            source_path: path.to_path_buf(),
            format,
            title,
        })
    }
}

/// Closed set of entity labels the recognizer can produce. The planner
/// matches exhaustively over this, so adding a label forces a decision on
/// its graph schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Department,
    Major,
    MoneyAmount,
    Year,
    Course,
    College,
}

impl EntityLabel {
    /// Graph node label for entities of this kind. Amounts never become
    /// standalone nodes; they only materialize through fee relations.
    pub fn node_label(self) -> Option<&'static str> {
        match self {
            Self::Department => Some("Department"),
            Self::Major => Some("Major"),
            Self::Year => Some("Year"),
            Self::Course => Some("Course"),
            Self::College => Some("College"),
            Self::MoneyAmount => None,
        }
    }
}

/// A typed text span. `start`/`end` are character offsets into the text the
/// recognizer ran over; downstream heuristics measure distance in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

impl ExtractedEntity {
    pub fn new(text: impl Into<String>, label: EntityLabel, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            label,
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationType {
    OffersMajor,
    HasFeeStandardForYear,
    CoversCourse,
    ReferencesDocument,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffersMajor => "OFFERS_MAJOR",
            Self::HasFeeStandardForYear => "HAS_FEE_STANDARD_FOR_YEAR",
            Self::CoversCourse => "COVERS_COURSE",
            Self::ReferencesDocument => "REFERENCES_DOCUMENT",
        }
    }
}

/// Derived target for a fee relation: the standard is keyed by major and
/// year rather than by any literal span in the source text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeStandardInfo {
    pub major_name: String,
    pub year: i64,
    pub amount: i64,
    pub fee_standard_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelationTarget {
    Entity(ExtractedEntity),
    FeeStandard(FeeStandardInfo),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedRelation {
    pub rel_type: RelationType,
    pub source: ExtractedEntity,
    pub target: RelationTarget,
}

/// One idempotent create-or-match instruction: a parameterized Cypher MERGE,
/// never a raw insert. Re-applying the same mutation is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphMutation {
    pub statement: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub doc_id: String,
    pub title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// Everything one pipeline run produced before touching the store.
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    pub fingerprint: DocumentFingerprint,
    pub sentence_count: usize,
    pub entities: Vec<ExtractedEntity>,
    pub relations: Vec<ExtractedRelation>,
    pub mutations: Vec<GraphMutation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IngestStatus {
    Processed,
    Failed,
}

/// Terminal per-document result for the caller to persist. The pipeline
/// always produces one of these; it never loses a document silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub status: IngestStatus,
    pub entity_count: usize,
    pub relation_count: usize,
    pub mutations_applied: usize,
    pub note: String,
}

impl IngestOutcome {
    pub fn failed(note: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Failed,
            entity_count: 0,
            relation_count: 0,
            mutations_applied: 0,
            note: note.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(
            DocumentFormat::from_extension("markdown"),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(DocumentFormat::from_extension("docx"), None);
    }

    #[test]
    fn raw_document_rejects_unknown_extension() {
        let result = RawDocument::from_path(Path::new("/tmp/fees.docx"));
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn money_amount_has_no_node_label() {
        assert_eq!(EntityLabel::MoneyAmount.node_label(), None);
        assert_eq!(EntityLabel::Major.node_label(), Some("Major"));
    }
}
