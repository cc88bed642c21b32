pub mod azure;
pub mod client;
pub mod credential;
pub mod types;

pub use client::{SearchClient, SearchIndexClient};
pub use credential::Credential;
pub use types::{BulkResult, DocumentRecord, IndexDescriptor, SearchHit};
