use async_trait::async_trait;

use crate::errors::RagResult;
use crate::search::types::{BulkResult, DocumentRecord, IndexDescriptor, SearchHit};

/// Index administration on the search service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Returns `RagError::IndexNotFound` when the service has no index by that name.
    async fn get_index(&self, name: &str) -> RagResult<IndexDescriptor>;

    async fn create_index(&self, descriptor: &IndexDescriptor) -> RagResult<()>;

    async fn delete_index(&self, name: &str) -> RagResult<()>;
}

/// Document operations against one index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Uploads all records in a single request. Any per-document failure fails the whole call.
    async fn upload_documents(&self, records: Vec<DocumentRecord>) -> RagResult<BulkResult>;

    /// Nearest-neighbour search, hits in relevance order.
    async fn search(&self, vector: Vec<f32>, top_k: usize) -> RagResult<Vec<SearchHit>>;

    async fn get_document_count(&self) -> RagResult<u64>;
}
