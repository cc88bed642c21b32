pub mod config;
pub mod errors;
pub mod llm;
pub mod rag;
pub mod search;

pub use errors::{RagError, RagResult};
pub use llm::types::{ChatRequest, Message};
pub use rag::{RagHelper, RagHelperConfig};

/// Installs the `fmt` subscriber; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
