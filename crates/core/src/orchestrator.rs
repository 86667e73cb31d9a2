use crate::error::ExtractError;
use crate::extractor::extract_text;
use crate::importer::import_mutations;
use crate::ingest::fingerprint_document;
use crate::models::{DocumentExtraction, IngestOutcome, IngestStatus, RawDocument};
use crate::normalize::TextNormalizer;
use crate::planner::GraphMutationPlanner;
use crate::recognize::EntityRecognizer;
use crate::relations::RelationExtractor;
use crate::traits::GraphSink;
use std::collections::HashSet;
use tracing::{info, warn};

/// Owns the pipeline stages. Construction compiles the normalizer patterns
/// and the recognizer lexicon, so a pipeline is built once per process and
/// reused across documents; the store handle is injected per run, never
/// held globally.
pub struct KnowledgePipeline {
    normalizer: TextNormalizer,
    recognizer: EntityRecognizer,
    relations: RelationExtractor,
}

impl KnowledgePipeline {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            recognizer: EntityRecognizer::with_default_config()?,
            relations: RelationExtractor::default(),
        })
    }

    pub fn with_components(
        normalizer: TextNormalizer,
        recognizer: EntityRecognizer,
        relations: RelationExtractor,
    ) -> Self {
        Self {
            normalizer,
            recognizer,
            relations,
        }
    }

    /// Pure part of the pipeline: load, clean, recognize over the whole
    /// cleaned text (the department-context rule spans sentences, so
    /// recognition is not per-sentence), derive relations, plan mutations.
    /// No external effect happens here.
    pub fn process_document(
        &self,
        document: &RawDocument,
    ) -> Result<DocumentExtraction, ExtractError> {
        let raw = extract_text(document)?;
        let cleaned = self.normalizer.clean(&raw);
        if cleaned.is_empty() {
            return Err(ExtractError::EmptyContent(
                document.source_path.display().to_string(),
            ));
        }

        let sentences = self.normalizer.segment(&cleaned);
        let entities = self.recognizer.recognize(&cleaned);
        let relations = self.relations.extract(&cleaned, &entities);
        let fingerprint = fingerprint_document(document)?;

        // Document node first, then entities, then relations: relation
        // templates MATCH the nodes the entity templates merge, and batches
        // apply in order. Each name-keyed entity then gets one provenance
        // edge back to the document, deduplicated across repeat mentions.
        let mut mutations = vec![GraphMutationPlanner::plan_document(&fingerprint)];
        mutations.extend(entities.iter().filter_map(GraphMutationPlanner::plan_entity));
        mutations.extend(
            relations
                .iter()
                .filter_map(GraphMutationPlanner::plan_relation),
        );
        let mut referenced = HashSet::new();
        mutations.extend(entities.iter().filter_map(|entity| {
            let label = entity.label.node_label()?;
            if !referenced.insert((label, entity.text.clone())) {
                return None;
            }
            GraphMutationPlanner::plan_document_reference(entity, &fingerprint)
        }));

        info!(
            document = %document.title,
            sentences = sentences.len(),
            entities = entities.len(),
            relations = relations.len(),
            mutations = mutations.len(),
            "document processed"
        );

        Ok(DocumentExtraction {
            fingerprint,
            sentence_count: sentences.len(),
            entities,
            relations,
            mutations,
        })
    }

    /// Full run including the one external effect. Always yields a terminal
    /// outcome: extraction failures and store unavailability become a
    /// `Failed` status with a reason, never a crash.
    pub async fn run<S>(&self, document: &RawDocument, sink: &S) -> IngestOutcome
    where
        S: GraphSink + Sync,
    {
        let extraction = match self.process_document(document) {
            Ok(extraction) => extraction,
            Err(error) => {
                warn!(document = %document.title, reason = %error, "extraction failed");
                return IngestOutcome::failed(format!("extraction failed: {error}"));
            }
        };

        if let Err(error) = sink.verify_connectivity().await {
            warn!(document = %document.title, reason = %error, "graph store unavailable");
            return IngestOutcome {
                status: IngestStatus::Failed,
                entity_count: extraction.entities.len(),
                relation_count: extraction.relations.len(),
                mutations_applied: 0,
                note: format!("graph store unavailable, import skipped: {error}"),
            };
        }

        match import_mutations(sink, &extraction.mutations).await {
            Ok(applied) => IngestOutcome {
                status: IngestStatus::Processed,
                entity_count: extraction.entities.len(),
                relation_count: extraction.relations.len(),
                mutations_applied: applied,
                note: format!(
                    "extracted {} entities and {} relations, applied {} mutations",
                    extraction.entities.len(),
                    extraction.relations.len(),
                    applied
                ),
            },
            Err(error) => IngestOutcome {
                status: IngestStatus::Failed,
                entity_count: extraction.entities.len(),
                relation_count: extraction.relations.len(),
                mutations_applied: match &error {
                    crate::error::GraphError::BatchCommit { applied, .. } => *applied,
                    _ => 0,
                },
                note: format!("import failed: {error}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::models::GraphMutation;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeSink {
        reachable: bool,
        applied: Mutex<Vec<GraphMutation>>,
    }

    impl FakeSink {
        fn new(reachable: bool) -> Self {
            Self {
                reachable,
                applied: Mutex::new(Vec::new()),
            }
        }

        fn applied(&self) -> Vec<GraphMutation> {
            self.applied.lock().expect("lock is never poisoned").clone()
        }
    }

    #[async_trait]
    impl GraphSink for FakeSink {
        async fn verify_connectivity(&self) -> Result<(), GraphError> {
            if self.reachable {
                Ok(())
            } else {
                Err(GraphError::Unavailable("connection refused".to_string()))
            }
        }

        async fn apply_batch(&self, mutations: &[GraphMutation]) -> Result<(), GraphError> {
            self.applied
                .lock()
                .expect("lock is never poisoned")
                .extend_from_slice(mutations);
            Ok(())
        }
    }

    fn fee_table_document(dir: &std::path::Path) -> RawDocument {
        let path = dir.join("收费标准.md");
        std::fs::write(
            &path,
            "# 2024年收费标准\n\n| 系别 | 专业 | 学费 |\n| --- | --- | --- |\n| 信息技术系 | 计算机科学与技术 | 20000元 |\n| | 网络工程 | 18000元 |\n",
        )
        .expect("fixture is writable");
        RawDocument::from_path(&path).expect("markdown is supported")
    }

    #[tokio::test]
    async fn fee_table_flows_through_to_applied_mutations() {
        let dir = tempdir().expect("tempdir");
        let document = fee_table_document(dir.path());
        let pipeline = KnowledgePipeline::new().expect("default pipeline builds");
        let sink = FakeSink::new(true);

        let outcome = pipeline.run(&document, &sink).await;

        assert_eq!(outcome.status, IngestStatus::Processed);
        assert!(outcome.entity_count >= 4);
        // Both majors link to the department (context carry across rows)
        // and both carry a fee standard.
        assert!(outcome.relation_count >= 4);
        assert!(outcome.mutations_applied > 0);

        let applied = sink.applied();
        assert!(applied
            .iter()
            .any(|m| m.statement.contains("PolicyDocument")));
        assert!(applied
            .iter()
            .any(|m| m.statement.contains("OFFERS_MAJOR")));
        assert!(applied
            .iter()
            .any(|m| m.statement.contains("FeeStandard")));
        assert!(applied
            .iter()
            .any(|m| m.statement.contains("REFERENCES_DOCUMENT")));
    }

    #[tokio::test]
    async fn each_named_entity_references_the_document_once() {
        let dir = tempdir().expect("tempdir");
        let document = fee_table_document(dir.path());
        let pipeline = KnowledgePipeline::new().expect("default pipeline builds");

        let extraction = pipeline
            .process_document(&document)
            .expect("processing succeeds");

        let references: Vec<_> = extraction
            .mutations
            .iter()
            .filter(|m| m.statement.contains("REFERENCES_DOCUMENT"))
            .collect();

        // One edge per distinct name-keyed entity: the department and the
        // two majors. Years and amounts never anchor a reference.
        assert_eq!(references.len(), 3);
        for mutation in &references {
            assert_eq!(mutation.parameters["doc_id"], extraction.fingerprint.doc_id);
            assert!(!mutation.statement.contains("(s:Year"));
        }
    }

    #[tokio::test]
    async fn reprocessing_plans_identical_mutations() {
        let dir = tempdir().expect("tempdir");
        let document = fee_table_document(dir.path());
        let pipeline = KnowledgePipeline::new().expect("default pipeline builds");

        let first = pipeline
            .process_document(&document)
            .expect("processing succeeds");
        let second = pipeline
            .process_document(&document)
            .expect("processing succeeds");

        let strip_timestamps = |mutations: &[GraphMutation]| {
            mutations
                .iter()
                .filter(|m| !m.statement.contains("$ingested_at"))
                .cloned()
                .collect::<Vec<_>>()
        };

        // Everything except the ingest timestamp on the document node is
        // byte-identical, so a replay merges into the same graph.
        assert_eq!(strip_timestamps(&first.mutations), strip_timestamps(&second.mutations));
    }

    #[tokio::test]
    async fn unavailable_store_skips_import_without_crashing() {
        let dir = tempdir().expect("tempdir");
        let document = fee_table_document(dir.path());
        let pipeline = KnowledgePipeline::new().expect("default pipeline builds");
        let sink = FakeSink::new(false);

        let outcome = pipeline.run(&document, &sink).await;

        assert_eq!(outcome.status, IngestStatus::Failed);
        assert_eq!(outcome.mutations_applied, 0);
        assert!(outcome.note.contains("unavailable"));
        // Counts still reflect what was extracted before the store check.
        assert!(outcome.entity_count > 0);
        assert!(sink.applied().is_empty());
    }

    #[tokio::test]
    async fn unreadable_document_fails_with_a_reason() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%broken").expect("fixture is writable");
        let document = RawDocument::from_path(&path).expect("pdf extension is supported");

        let pipeline = KnowledgePipeline::new().expect("default pipeline builds");
        let sink = FakeSink::new(true);

        let outcome = pipeline.run(&document, &sink).await;

        assert_eq!(outcome.status, IngestStatus::Failed);
        assert!(outcome.note.contains("extraction failed"));
        assert!(sink.applied().is_empty());
    }
}
