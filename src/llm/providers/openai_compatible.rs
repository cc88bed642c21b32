use async_trait::async_trait;

use crate::errors::{RagError, RagResult};
use crate::llm::embeddings::EmbeddingsClient;
use crate::llm::types::{EmbeddingRequest, EmbeddingResponse};

pub struct OpenAiCompatibleEmbeddings {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleEmbeddings {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            api_base,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingsClient for OpenAiCompatibleEmbeddings {
    async fn embed(&self, request: EmbeddingRequest) -> RagResult<EmbeddingResponse> {
        tracing::debug!(
            model = %request.model,
            inputs = request.input.len(),
            dimensions = ?request.dimensions,
            "sending embeddings request"
        );

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(RagError::Embeddings(format!("{}: {}", status, err_body)));
        }

        let body: EmbeddingResponse = response.json().await?;
        tracing::debug!(vectors = body.data.len(), "embeddings response received");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_embeddings_once() {
        let client = OpenAiCompatibleEmbeddings::new("https://host/v1/".into(), String::new());
        assert_eq!(client.url(), "https://host/v1/embeddings");
    }

    #[test]
    fn parses_openai_response_shape() {
        let body = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.5,-0.25]}],"model":"m"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_first(), Some(vec![0.5, -0.25]));
    }
}
