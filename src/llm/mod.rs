pub mod embeddings;
pub mod providers;
pub mod types;
