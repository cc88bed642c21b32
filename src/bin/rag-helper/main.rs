use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use rag_helper::config::{self, AppConfig};
use rag_helper::{ChatRequest, Message, RagHelper};

#[derive(Parser)]
#[command(name = "rag-helper", about = "Manage and query the RAG search index", version)]
struct Cli {
    /// Path to config.toml (default: next to the executable, then the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the index unless it already exists
    Create {
        /// Vector dimension; must match `embeddings.dimensions` when both are set
        #[arg(long)]
        dimensions: Option<usize>,
    },

    /// Upload an embeddings table (CSV with `token` and `embedding` columns)
    Upload {
        source: PathBuf,
    },

    /// Embed every text document in a directory and write an embeddings table
    BuildEmbeddings {
        input_directory: PathBuf,
        output_file: PathBuf,
    },

    /// Print the passages retrieved for a query
    Search {
        query: String,
    },

    /// Report whether the index holds any documents
    IsEmpty,

    /// Delete the index
    Delete,
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let cfg = match path {
        Some(p) => config::load_config_from(p),
        None => config::load_config(),
    };
    cfg.context("failed to load configuration")
}

async fn attach(rag: &mut RagHelper) -> anyhow::Result<()> {
    if !rag.attach_existing_index().await? {
        bail!(
            "index '{}' does not exist; run `rag-helper create` first",
            rag.index_name()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();
    rag_helper::init_tracing();

    let cli = Cli::parse();
    let cfg = load(cli.config.as_ref())?;
    let mut rag = RagHelper::from_config(&cfg)?;

    match cli.command {
        Command::Create { dimensions } => {
            rag.create_index_maybe(dimensions).await?;
            println!("index '{}' ready", rag.index_name());
        }
        Command::Upload { source } => {
            attach(&mut rag).await?;
            let result = rag.upload_documents(&source).await?;
            println!("uploaded {} documents", result.succeeded);
        }
        Command::BuildEmbeddings {
            input_directory,
            output_file,
        } => {
            let rows = rag.build_embeddings_file(&input_directory, &output_file).await?;
            println!("wrote {rows} rows to {}", output_file.display());
        }
        Command::Search { query } => {
            attach(&mut rag).await?;
            let context = rag
                .search(&ChatRequest::new(vec![Message::user(query)]))
                .await?;
            println!("{context}");
        }
        Command::IsEmpty => {
            attach(&mut rag).await?;
            println!("{}", rag.is_index_empty().await?);
        }
        Command::Delete => {
            attach(&mut rag).await?;
            rag.delete_index().await?;
            println!("index '{}' deleted", rag.index_name());
        }
    }
    Ok(())
}
