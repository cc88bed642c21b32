//! Retrieval-augmented generation over a single search index.
//!
//! - `RagHelper`: index lifecycle, document ingestion and query-time retrieval
//! - `dimensions`: vector dimension resolution and checks
//! - `table`: the CSV embeddings table shared by ingestion and the offline builder

pub mod dimensions;
pub mod helper;
pub mod table;

pub use helper::{RagHelper, RagHelperConfig, DEFAULT_TOP_K, RESULT_SEPARATOR};
