pub mod error;
pub mod extractor;
pub mod importer;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod planner;
pub mod recognize;
pub mod relations;
pub mod stores;
pub mod traits;

pub use error::{ExtractError, GraphError};
pub use extractor::{extract_text, flatten_markdown};
pub use importer::{import_mutations, BATCH_SIZE};
pub use ingest::{discover_documents, fingerprint_document, ingest_folder, FolderReport};
pub use models::{
    DocumentExtraction, DocumentFingerprint, DocumentFormat, EntityLabel, ExtractedEntity,
    ExtractedRelation, FeeStandardInfo, GraphMutation, IngestOutcome, IngestStatus, RawDocument,
    RelationTarget, RelationType,
};
pub use normalize::TextNormalizer;
pub use orchestrator::KnowledgePipeline;
pub use planner::GraphMutationPlanner;
pub use recognize::EntityRecognizer;
pub use relations::{KeywordRule, RelationExtractor, FEE_AMOUNT_THRESHOLD, FEE_REFERENCE_YEAR};
pub use stores::Neo4jStore;
pub use traits::GraphSink;
