use crate::error::ExtractError;
use crate::models::{DocumentFingerprint, DocumentFormat, IngestOutcome, RawDocument};
use crate::orchestrator::KnowledgePipeline;
use crate::traits::GraphSink;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Recursively finds documents with a supported extension, sorted for a
/// stable processing order.
pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .is_some();

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Stable identity for a document: the id is derived from the path, the
/// checksum from the content, so re-ingesting the same file merges into the
/// same PolicyDocument node.
pub fn fingerprint_document(document: &RawDocument) -> Result<DocumentFingerprint, ExtractError> {
    let checksum = digest_file(&document.source_path)?;

    let mut hasher = Sha256::new();
    hasher.update(document.source_path.to_string_lossy().as_bytes());
    let doc_id = format!("{:x}", hasher.finalize());

    Ok(DocumentFingerprint {
        doc_id,
        title: document.title.clone(),
        source_path: document.source_path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

pub struct FolderReport {
    pub outcomes: Vec<(PathBuf, IngestOutcome)>,
}

/// Best-effort batch ingest: every discovered document gets a terminal
/// outcome; one failing document never stops the rest.
pub async fn ingest_folder<S>(
    pipeline: &KnowledgePipeline,
    folder: &Path,
    sink: &S,
) -> Result<FolderReport, ExtractError>
where
    S: GraphSink + Sync,
{
    let files = discover_documents(folder);
    if files.is_empty() {
        return Err(ExtractError::InvalidArgument(format!(
            "no supported documents found in {}",
            folder.display()
        )));
    }

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match RawDocument::from_path(&path) {
            Ok(document) => pipeline.run(&document, sink).await,
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "document skipped");
                IngestOutcome::failed(error.to_string())
            }
        };
        outcomes.push((path, outcome));
    }

    Ok(FolderReport { outcomes })
}
