use std::path::Path;
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use crate::config::AppConfig;
use crate::errors::{RagError, RagResult};
use crate::llm::embeddings::EmbeddingsClient;
use crate::llm::providers::openai_compatible::OpenAiCompatibleEmbeddings;
use crate::llm::types::{ChatRequest, EmbeddingRequest};
use crate::rag::dimensions::{check_embedding, resolve_dimensions};
use crate::rag::table::{self, TableRow};
use crate::search::azure::AzureSearchService;
use crate::search::client::{SearchClient, SearchIndexClient};
use crate::search::types::{BulkResult, DocumentRecord, IndexDescriptor};

/// Nearest neighbours requested per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Joins retrieved passages. The chat prompt format depends on this exact string.
pub const RESULT_SEPARATOR: &str = "\n------\n";

const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

#[derive(Debug, Clone)]
pub struct RagHelperConfig {
    pub endpoint: String,
    pub index_name: String,
    pub dimensions: Option<usize>,
    pub model: String,
}

/// Manages one search index and serves passages from it to the chat pipeline.
///
/// `create_index_maybe` must succeed before ingestion, query or deletion;
/// those fail with [`RagError::IndexAbsent`] otherwise.
pub struct RagHelper {
    endpoint: String,
    index_name: String,
    dimensions: Option<usize>,
    model: String,
    top_k: usize,
    embeddings_client: Arc<dyn EmbeddingsClient>,
    index_client: Arc<dyn SearchIndexClient>,
    search_client: Arc<dyn SearchClient>,
    /// Present exactly while the index is known to exist.
    index: Option<IndexDescriptor>,
}

impl RagHelper {
    pub fn new(
        config: RagHelperConfig,
        embeddings_client: Arc<dyn EmbeddingsClient>,
        index_client: Arc<dyn SearchIndexClient>,
        search_client: Arc<dyn SearchClient>,
    ) -> Self {
        Self {
            endpoint: config.endpoint,
            index_name: config.index_name,
            dimensions: config.dimensions,
            model: config.model,
            top_k: DEFAULT_TOP_K,
            embeddings_client,
            index_client,
            search_client,
            index: None,
        }
    }

    /// Wires the HTTP clients described by `config.toml`.
    pub fn from_config(config: &AppConfig) -> RagResult<Self> {
        let service = AzureSearchService::new(
            config.search.endpoint.clone(),
            config.search.api_version.clone(),
            config.search.credential()?,
        );
        let embeddings = OpenAiCompatibleEmbeddings::new(
            config.embeddings.api_base.clone(),
            config.embeddings.api_key(),
        );
        let helper = Self::new(
            RagHelperConfig {
                endpoint: config.search.endpoint.clone(),
                index_name: config.search.index_name.clone(),
                dimensions: config.embeddings.dimensions,
                model: config.embeddings.model.clone(),
            },
            Arc::new(embeddings),
            Arc::new(service.index_client()),
            Arc::new(service.search_client(&config.search.index_name)),
        );
        Ok(helper.with_top_k(config.search.top_k))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn descriptor(&self) -> Option<&IndexDescriptor> {
        self.index.as_ref()
    }

    /// `Ok(false)` only for the service's not-found signal; every other failure propagates.
    pub async fn index_exists(index_client: &dyn SearchIndexClient, index_name: &str) -> RagResult<bool> {
        match index_client.get_index(index_name).await {
            Ok(_) => Ok(true),
            Err(RagError::IndexNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Confirms the index with one `get_index`, creating it only when the service reports it missing.
    pub async fn get_or_create_search_index(
        index_client: &dyn SearchIndexClient,
        endpoint: &str,
        index_name: &str,
        dimensions: usize,
    ) -> RagResult<IndexDescriptor> {
        match index_client.get_index(index_name).await {
            Ok(existing) => {
                if existing.vector_dimension != dimensions {
                    tracing::warn!(
                        index = %index_name,
                        existing = existing.vector_dimension,
                        requested = dimensions,
                        "index exists with a different vector dimension; keeping it"
                    );
                }
                tracing::debug!(index = %index_name, "index already exists");
                Ok(existing)
            }
            Err(RagError::IndexNotFound(_)) => {
                let descriptor = IndexDescriptor {
                    name: index_name.to_string(),
                    vector_dimension: dimensions,
                    search_endpoint: endpoint.to_string(),
                };
                index_client.create_index(&descriptor).await?;
                tracing::info!(index = %index_name, dimensions, "index created");
                Ok(descriptor)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_index_maybe(&mut self, dimensions_override: Option<usize>) -> RagResult<()> {
        let dimensions = resolve_dimensions(self.dimensions, dimensions_override)?;
        if self.index.is_some() {
            tracing::debug!(index = %self.index_name, "index already confirmed");
            return Ok(());
        }
        let descriptor = Self::get_or_create_search_index(
            self.index_client.as_ref(),
            &self.endpoint,
            &self.index_name,
            dimensions,
        )
        .await?;
        self.dimensions = Some(dimensions);
        self.index = Some(descriptor);
        tracing::info!(index = %self.index_name, dimensions, "index ready");
        Ok(())
    }

    /// Sets the index flag when the service already has the index. Never creates it.
    pub async fn attach_existing_index(&mut self) -> RagResult<bool> {
        if self.index.is_some() {
            return Ok(true);
        }
        match self.index_client.get_index(&self.index_name).await {
            Ok(descriptor) => {
                if let Some(d) = self.dimensions.filter(|d| *d != descriptor.vector_dimension) {
                    tracing::warn!(
                        index = %self.index_name,
                        configured = d,
                        existing = descriptor.vector_dimension,
                        "configured dimensions differ from the existing index"
                    );
                }
                self.dimensions.get_or_insert(descriptor.vector_dimension);
                self.index = Some(descriptor);
                Ok(true)
            }
            Err(RagError::IndexNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_index(&mut self) -> RagResult<()> {
        self.require_index()?;
        self.index_client.delete_index(&self.index_name).await?;
        self.index = None;
        tracing::info!(index = %self.index_name, "index deleted");
        Ok(())
    }

    /// Embeds rows that lack a vector and sends every row in one bulk upload.
    pub async fn upload_documents(&self, source_path: impl AsRef<Path>) -> RagResult<BulkResult> {
        let expected = self.require_index()?.vector_dimension;
        let rows = table::read_table(source_path.as_ref())?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let embedding = match row.embedding {
                Some(embedding) => {
                    check_embedding(expected, &embedding)?;
                    embedding
                }
                None => self.embed(&row.content, Some(expected)).await?,
            };
            records.push(DocumentRecord {
                id: i.to_string(),
                content: row.content,
                embedding,
            });
        }

        let total = records.len();
        let result = self.search_client.upload_documents(records).await?;
        tracing::info!(
            index = %self.index_name,
            rows = total,
            succeeded = result.succeeded,
            "documents uploaded"
        );
        Ok(result)
    }

    /// Returns the top matches for the latest message, joined by [`RESULT_SEPARATOR`].
    pub async fn search(&self, chat_request: &ChatRequest) -> RagResult<String> {
        let expected = self.require_index()?.vector_dimension;
        let query = chat_request
            .last_content()
            .ok_or_else(|| RagError::InvalidRequest("chat request has no messages".into()))?;

        let vector = self.embed(query, Some(expected)).await?;
        let hits = self.search_client.search(vector, self.top_k).await?;
        tracing::debug!(index = %self.index_name, hits = hits.len(), "search complete");

        let passages: Vec<String> = hits.into_iter().map(|h| h.token).collect();
        Ok(passages.join(RESULT_SEPARATOR))
    }

    pub async fn is_index_empty(&self) -> RagResult<bool> {
        self.require_index()?;
        let count = self.search_client.get_document_count().await?;
        tracing::debug!(index = %self.index_name, count, "document count");
        Ok(count == 0)
    }

    /// Embeds every text document under `input_directory` (one row per file)
    /// and writes an embeddings table for [`RagHelper::upload_documents`].
    /// Does not touch the index. Returns the number of rows written.
    pub async fn build_embeddings_file(
        &self,
        input_directory: impl AsRef<Path>,
        output_file: impl AsRef<Path>,
    ) -> RagResult<usize> {
        let input_directory = input_directory.as_ref();
        let output_file = output_file.as_ref();
        // A previous table written inside the input tree must not be embedded as a document.
        let existing_output = output_file.canonicalize().ok();
        let dimensions = self
            .index
            .as_ref()
            .map(|d| d.vector_dimension)
            .or(self.dimensions);
        let mut rows = Vec::new();

        for entry in WalkDir::new(input_directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !has_text_extension(path) {
                continue;
            }
            if existing_output.is_some() && path.canonicalize().ok() == existing_output {
                continue;
            }

            let bytes = std::fs::read(path)?;
            let Ok(text) = String::from_utf8(bytes) else {
                tracing::warn!(path = %path.display(), "skipping non-UTF-8 document");
                continue;
            };
            let content = text.trim();
            if content.is_empty() {
                continue;
            }

            let embedding = self.embed(content, dimensions).await?;
            rows.push(TableRow {
                content: content.to_string(),
                embedding: Some(embedding),
            });
        }

        table::write_table(output_file, &rows)?;
        tracing::info!(
            input = %input_directory.display(),
            output = %output_file.display(),
            rows = rows.len(),
            "embeddings file built"
        );
        Ok(rows.len())
    }

    fn require_index(&self) -> RagResult<&IndexDescriptor> {
        self.index
            .as_ref()
            .ok_or_else(|| RagError::IndexAbsent(self.index_name.clone()))
    }

    /// One embeddings call; checks the vector length when `expected` is known.
    async fn embed(&self, text: &str, expected: Option<usize>) -> RagResult<Vec<f32>> {
        let response = self
            .embeddings_client
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                input: vec![text.to_string()],
                dimensions: expected,
            })
            .await?;
        let embedding = response
            .into_first()
            .ok_or_else(|| RagError::Embeddings("response contained no embeddings".into()))?;
        if let Some(expected) = expected {
            check_embedding(expected, &embedding)?;
        }
        Ok(embedding)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
