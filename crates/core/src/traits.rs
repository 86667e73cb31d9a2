use crate::error::GraphError;
use crate::models::GraphMutation;
use async_trait::async_trait;

/// Write seam to the graph store. One `apply_batch` call is one
/// transaction: everything in the slice commits together or nothing does.
#[async_trait]
pub trait GraphSink {
    /// Checks the store is reachable before any write is attempted. A
    /// failure here means the whole import is skipped for this run.
    async fn verify_connectivity(&self) -> Result<(), GraphError>;

    async fn apply_batch(&self, mutations: &[GraphMutation]) -> Result<(), GraphError>;
}
