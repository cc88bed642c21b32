//! REST adapters for Azure AI Search.
//!
//! The index schema is fixed: `id` (key), `token` (searchable text) and
//! `embedding` (vector field searched with an HNSW profile).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{RagError, RagResult};
use crate::search::client::{SearchClient, SearchIndexClient};
use crate::search::credential::Credential;
use crate::search::types::{BulkResult, DocumentRecord, IndexDescriptor, SearchHit};

const KEY_FIELD: &str = "id";
const CONTENT_FIELD: &str = "token";
const VECTOR_FIELD: &str = "embedding";
const VECTOR_PROFILE: &str = "embedding-profile";
const VECTOR_ALGORITHM: &str = "embedding-hnsw";

/// Connection settings shared by both clients.
#[derive(Debug, Clone)]
pub struct AzureSearchService {
    endpoint: String,
    api_version: String,
    credential: Credential,
    client: reqwest::Client,
}

impl AzureSearchService {
    pub fn new(endpoint: String, api_version: String, credential: Credential) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version,
            credential,
            client: reqwest::Client::new(),
        }
    }

    pub fn index_client(&self) -> AzureSearchIndexClient {
        AzureSearchIndexClient {
            service: self.clone(),
        }
    }

    pub fn search_client(&self, index_name: &str) -> AzureSearchClient {
        AzureSearchClient {
            service: self.clone(),
            index_name: index_name.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}?api-version={}", self.endpoint, path, self.api_version)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        self.credential.apply(builder)
    }
}

/// Turns a non-success response into `RagError::SearchService`.
async fn ensure_success(response: reqwest::Response) -> RagResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RagError::SearchService {
        status: status.as_u16(),
        message: service_error_message(&body),
    })
}

/// Pulls `error.message` out of the service's error envelope, falling back to the raw body.
fn service_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// 404 is the service's not-found signal; every other failure status stays a service error.
fn get_index_failure(status: StatusCode, name: &str, body: &str) -> RagError {
    if status == StatusCode::NOT_FOUND {
        return RagError::IndexNotFound(name.to_string());
    }
    RagError::SearchService {
        status: status.as_u16(),
        message: service_error_message(body),
    }
}

pub struct AzureSearchIndexClient {
    service: AzureSearchService,
}

fn index_definition(descriptor: &IndexDescriptor) -> Value {
    json!({
        "name": descriptor.name,
        "fields": [
            { "name": KEY_FIELD, "type": "Edm.String", "key": true, "filterable": true },
            { "name": CONTENT_FIELD, "type": "Edm.String", "searchable": true, "retrievable": true },
            {
                "name": VECTOR_FIELD,
                "type": "Collection(Edm.Single)",
                "searchable": true,
                "retrievable": false,
                "dimensions": descriptor.vector_dimension,
                "vectorSearchProfile": VECTOR_PROFILE,
            },
        ],
        "vectorSearch": {
            "algorithms": [ { "name": VECTOR_ALGORITHM, "kind": "hnsw" } ],
            "profiles": [ { "name": VECTOR_PROFILE, "algorithm": VECTOR_ALGORITHM } ],
        },
    })
}

fn descriptor_from_definition(definition: &Value, endpoint: &str) -> RagResult<IndexDescriptor> {
    let name = definition["name"].as_str().unwrap_or_default().to_string();
    let dimension = definition["fields"]
        .as_array()
        .and_then(|fields| fields.iter().find(|f| f["name"] == VECTOR_FIELD))
        .and_then(|field| field["dimensions"].as_u64())
        .ok_or_else(|| RagError::SearchService {
            status: StatusCode::OK.as_u16(),
            message: format!("index '{name}' has no '{VECTOR_FIELD}' vector field"),
        })?;
    Ok(IndexDescriptor {
        name,
        vector_dimension: dimension as usize,
        search_endpoint: endpoint.to_string(),
    })
}

#[async_trait]
impl SearchIndexClient for AzureSearchIndexClient {
    async fn get_index(&self, name: &str) -> RagResult<IndexDescriptor> {
        tracing::debug!(index = %name, "fetching index definition");
        let response = self
            .service
            .request(reqwest::Method::GET, &format!("indexes/{name}"))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(get_index_failure(status, name, &body));
        }
        let definition: Value = response.json().await?;
        descriptor_from_definition(&definition, &self.service.endpoint)
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> RagResult<()> {
        tracing::debug!(
            index = %descriptor.name,
            dimensions = descriptor.vector_dimension,
            "creating index"
        );
        let response = self
            .service
            .request(reqwest::Method::POST, "indexes")
            .json(&index_definition(descriptor))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> RagResult<()> {
        tracing::debug!(index = %name, "deleting index");
        let response = self
            .service
            .request(reqwest::Method::DELETE, &format!("indexes/{name}"))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

pub struct AzureSearchClient {
    service: AzureSearchService,
    index_name: String,
}

#[derive(Debug, Deserialize)]
struct IndexingResponse {
    value: Vec<IndexingResult>,
}

#[derive(Debug, Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<SearchHit>,
}

fn upload_batch(records: Vec<DocumentRecord>) -> Value {
    let value: Vec<Value> = records
        .into_iter()
        .map(|r| {
            let mut doc = serde_json::Map::new();
            doc.insert("@search.action".into(), json!("upload"));
            doc.insert(KEY_FIELD.into(), json!(r.id));
            doc.insert(CONTENT_FIELD.into(), json!(r.content));
            doc.insert(VECTOR_FIELD.into(), json!(r.embedding));
            Value::Object(doc)
        })
        .collect();
    json!({ "value": value })
}

fn vector_query(vector: Vec<f32>, top_k: usize) -> Value {
    json!({
        "select": CONTENT_FIELD,
        "top": top_k,
        "vectorQueries": [
            { "kind": "vector", "vector": vector, "k": top_k, "fields": VECTOR_FIELD },
        ],
    })
}

fn summarize_indexing(results: Vec<IndexingResult>) -> RagResult<BulkResult> {
    let total = results.len();
    let failures: Vec<&IndexingResult> = results.iter().filter(|r| !r.status).collect();
    if let Some(first) = failures.first() {
        return Err(RagError::BulkUpload {
            failed: failures.len(),
            total,
            first_error: format!(
                "document '{}': {}",
                first.key,
                first.error_message.as_deref().unwrap_or("unknown error")
            ),
        });
    }
    Ok(BulkResult { succeeded: total })
}

fn parse_count(body: &str) -> RagResult<u64> {
    body.trim_start_matches('\u{feff}')
        .trim()
        .parse()
        .map_err(|_| RagError::SearchService {
            status: StatusCode::OK.as_u16(),
            message: format!("unexpected document count body: {body:?}"),
        })
}

#[async_trait]
impl SearchClient for AzureSearchClient {
    async fn upload_documents(&self, records: Vec<DocumentRecord>) -> RagResult<BulkResult> {
        let total = records.len();
        tracing::debug!(index = %self.index_name, documents = total, "uploading documents");
        let response = self
            .service
            .request(
                reqwest::Method::POST,
                &format!("indexes/{}/docs/index", self.index_name),
            )
            .json(&upload_batch(records))
            .send()
            .await?;
        let body: IndexingResponse = ensure_success(response).await?.json().await?;
        summarize_indexing(body.value)
    }

    async fn search(&self, vector: Vec<f32>, top_k: usize) -> RagResult<Vec<SearchHit>> {
        tracing::debug!(index = %self.index_name, top_k, "vector search");
        let response = self
            .service
            .request(
                reqwest::Method::POST,
                &format!("indexes/{}/docs/search", self.index_name),
            )
            .json(&vector_query(vector, top_k))
            .send()
            .await?;
        let body: SearchResponse = ensure_success(response).await?.json().await?;
        Ok(body.value)
    }

    async fn get_document_count(&self) -> RagResult<u64> {
        let response = self
            .service
            .request(
                reqwest::Method::GET,
                &format!("indexes/{}/docs/$count", self.index_name),
            )
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        parse_count(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> IndexDescriptor {
        IndexDescriptor {
            name: "products".into(),
            vector_dimension: 100,
            search_endpoint: "https://example.search.windows.net".into(),
        }
    }

    #[test]
    fn url_carries_api_version() {
        let service = AzureSearchService::new(
            "https://example.search.windows.net/".into(),
            "2024-07-01".into(),
            Credential::ApiKey("k".into()),
        );
        assert_eq!(
            service.url("indexes/products"),
            "https://example.search.windows.net/indexes/products?api-version=2024-07-01"
        );
    }

    #[test]
    fn definition_round_trips_dimension() {
        let def = index_definition(&descriptor());
        assert_eq!(def["fields"][2]["dimensions"], 100);
        assert_eq!(def["fields"][0]["key"], true);
        let back = descriptor_from_definition(&def, "https://example.search.windows.net").unwrap();
        assert_eq!(back, descriptor());
    }

    #[test]
    fn definition_without_vector_field_is_an_error() {
        let def = json!({ "name": "plain", "fields": [ { "name": "id" } ] });
        assert!(descriptor_from_definition(&def, "e").is_err());
    }

    #[test]
    fn upload_batch_uses_index_field_names() {
        let batch = upload_batch(vec![DocumentRecord {
            id: "0".into(),
            content: "sleeping bag".into(),
            embedding: vec![0.5, 1.0],
        }]);
        let doc = &batch["value"][0];
        assert_eq!(doc["@search.action"], "upload");
        assert_eq!(doc["id"], "0");
        assert_eq!(doc["token"], "sleeping bag");
        assert_eq!(doc["embedding"], json!([0.5, 1.0]));
    }

    #[test]
    fn vector_query_requests_top_k() {
        let q = vector_query(vec![0.1], 3);
        assert_eq!(q["vectorQueries"][0]["k"], 3);
        assert_eq!(q["vectorQueries"][0]["fields"], "embedding");
        assert_eq!(q["select"], "token");
    }

    #[test]
    fn partial_indexing_failure_is_aggregated() {
        let body = r#"{"value":[
            {"key":"0","status":true,"errorMessage":null,"statusCode":201},
            {"key":"1","status":false,"errorMessage":"bad vector","statusCode":400}
        ]}"#;
        let parsed: IndexingResponse = serde_json::from_str(body).unwrap();
        match summarize_indexing(parsed.value) {
            Err(RagError::BulkUpload { failed, total, first_error }) => {
                assert_eq!((failed, total), (1, 2));
                assert!(first_error.contains("bad vector"));
            }
            other => panic!("expected bulk upload error, got {other:?}"),
        }
    }

    #[test]
    fn search_hits_keep_service_order() {
        let body = r#"{"value":[{"@search.score":0.9,"token":"a"},{"@search.score":0.5,"token":"b"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let tokens: Vec<_> = parsed.value.into_iter().map(|h| h.token).collect();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn count_tolerates_bom_and_whitespace() {
        assert_eq!(parse_count("\u{feff}42\n").unwrap(), 42);
        assert!(parse_count("forty-two").is_err());
    }

    #[test]
    fn error_envelope_message_is_extracted() {
        let body = r#"{"error":{"code":"","message":"Invalid api-key"}}"#;
        assert_eq!(service_error_message(body), "Invalid api-key");
        assert_eq!(service_error_message("plain"), "plain");
    }

    #[test]
    fn missing_index_is_the_not_found_signal() {
        let err = get_index_failure(StatusCode::NOT_FOUND, "products", "");
        assert!(matches!(err, RagError::IndexNotFound(ref name) if name == "products"));
    }

    #[test]
    fn other_get_index_failures_stay_service_errors() {
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let err = get_index_failure(status, "products", r#"{"error":{"message":"nope"}}"#);
            match err {
                RagError::SearchService { status: code, message } => {
                    assert_eq!(code, status.as_u16());
                    assert_eq!(message, "nope");
                }
                other => panic!("expected service error, got {other:?}"),
            }
        }
    }
}
