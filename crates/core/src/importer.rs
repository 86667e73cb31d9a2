use crate::error::GraphError;
use crate::models::GraphMutation;
use crate::traits::GraphSink;
use tracing::debug;

/// Mutations per transaction. Atomicity is guaranteed per batch, not for
/// the whole import: committed batches stay committed when a later one
/// fails.
pub const BATCH_SIZE: usize = 50;

/// Applies planned mutations in bounded transactional batches, sequentially
/// and fail-fast. Later batches may reference nodes merged by earlier ones,
/// so batches are never reordered or run concurrently.
///
/// Returns the number of mutations committed. On a batch failure the error
/// names the failing batch and how many mutations were already committed;
/// remaining batches are abandoned.
pub async fn import_mutations<S>(
    sink: &S,
    mutations: &[GraphMutation],
) -> Result<usize, GraphError>
where
    S: GraphSink + Sync,
{
    if mutations.is_empty() {
        return Ok(0);
    }

    let mut applied = 0;
    for (index, batch) in mutations.chunks(BATCH_SIZE).enumerate() {
        sink.apply_batch(batch)
            .await
            .map_err(|error| GraphError::BatchCommit {
                batch: index + 1,
                applied,
                details: error.to_string(),
            })?;

        applied += batch.len();
        debug!(batch = index + 1, size = batch.len(), "graph batch committed");
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Fake sink that records batch sizes and can be told to fail on one
    /// batch.
    struct RecordingSink {
        batches: Mutex<Vec<usize>>,
        fail_on_batch: Option<usize>,
    }

    impl RecordingSink {
        fn new(fail_on_batch: Option<usize>) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_on_batch,
            }
        }

        fn recorded(&self) -> Vec<usize> {
            self.batches.lock().expect("lock is never poisoned").clone()
        }
    }

    #[async_trait]
    impl GraphSink for RecordingSink {
        async fn verify_connectivity(&self) -> Result<(), GraphError> {
            Ok(())
        }

        async fn apply_batch(&self, mutations: &[GraphMutation]) -> Result<(), GraphError> {
            let mut batches = self.batches.lock().expect("lock is never poisoned");
            let batch_number = batches.len() + 1;
            if self.fail_on_batch == Some(batch_number) {
                return Err(GraphError::BackendResponse {
                    backend: "fake".to_string(),
                    details: "malformed operation".to_string(),
                });
            }
            batches.push(mutations.len());
            Ok(())
        }
    }

    fn mutations(count: usize) -> Vec<GraphMutation> {
        (0..count)
            .map(|index| GraphMutation {
                statement: "MERGE (m:Major {name: $name})".to_string(),
                parameters: json!({ "name": format!("major-{index}") }),
            })
            .collect()
    }

    #[tokio::test]
    async fn mutations_are_grouped_into_fixed_size_batches() {
        let sink = RecordingSink::new(None);
        let applied = import_mutations(&sink, &mutations(120))
            .await
            .expect("import succeeds");

        assert_eq!(applied, 120);
        assert_eq!(sink.recorded(), vec![50, 50, 20]);
    }

    #[tokio::test]
    async fn failing_batch_aborts_the_rest_but_keeps_prior_commits() {
        let sink = RecordingSink::new(Some(2));
        let error = import_mutations(&sink, &mutations(120))
            .await
            .expect_err("batch 2 must fail");

        match error {
            GraphError::BatchCommit { batch, applied, .. } => {
                assert_eq!(batch, 2);
                assert_eq!(applied, 50);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Batch 1 committed, batch 3 never attempted.
        assert_eq!(sink.recorded(), vec![50]);
    }

    #[tokio::test]
    async fn empty_import_applies_nothing() {
        let sink = RecordingSink::new(None);
        let applied = import_mutations(&sink, &[]).await.expect("empty import is fine");

        assert_eq!(applied, 0);
        assert!(sink.recorded().is_empty());
    }
}
