use async_trait::async_trait;

use crate::errors::RagResult;
use crate::llm::types::{EmbeddingRequest, EmbeddingResponse};

/// Embedding model capability. One call per text; callers use the first vector of `data`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingsClient: Send + Sync {
    async fn embed(&self, request: EmbeddingRequest) -> RagResult<EmbeddingResponse>;
}
