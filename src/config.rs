use std::path::PathBuf;

use clap::Parser;

use crate::chunking::{ChunkConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::ConfigError;
use crate::storage;

/// Prepare a chunked knowledge base for retrieval-augmented generation.
///
/// Loads documents (built-in medical samples unless --input is given), splits
/// them into overlapping sentence-aligned chunks and writes knowledge_base.json,
/// summary.json and a SQLite copy of the knowledge base.
#[derive(Parser, Debug)]
#[command(name = "rag-prep", version, about)]
pub struct Cli {
    /// JSON array of {id?, title, content, source, category} records; `-` reads stdin
    #[arg(long, env = "RAG_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory for knowledge_base.json and summary.json
    #[arg(long, env = "RAG_DATA_DIR", default_value = "./rag_data")]
    pub output_dir: PathBuf,

    /// Word budget per chunk
    #[arg(long, env = "RAG_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Trailing sentences repeated at the start of the next chunk
    #[arg(long, env = "RAG_OVERLAP", default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Only keep documents in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// SQLite knowledge base path (default: ~/.rag-prep/data/knowledge.db)
    #[arg(long, env = "RAG_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Skip writing the SQLite knowledge base
    #[arg(long)]
    pub no_db: bool,

    /// Knowledge base file name inside the output dir
    #[arg(long, default_value = crate::processor::KNOWLEDGE_BASE_FILE)]
    pub output_file: String,
}

impl Cli {
    pub fn chunk_config(&self) -> Result<ChunkConfig, ConfigError> {
        ChunkConfig::new(self.chunk_size, self.overlap)
    }

    /// Resolved DB path, or `None` when persistence is disabled
    pub fn db_path(&self) -> Option<PathBuf> {
        if self.no_db {
            return None;
        }
        Some(
            self.db
                .clone()
                .unwrap_or_else(|| storage::default_db_path(&self.output_dir)),
        )
    }
}
