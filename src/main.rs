use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use rag_prep::config::Cli;
use rag_prep::source::{DocumentSource, FilteredSource, JsonSource, SampleSource};
use rag_prep::{storage, RagDataProcessor, TextChunker};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = cli.chunk_config().context("invalid chunker configuration")?;
    let chunker = TextChunker::new(config);

    info!("RAG data preparation starting...");
    info!(
        "Chunking: {} words per chunk, {} sentences overlap",
        config.chunk_size(),
        config.overlap()
    );

    let mut processor = RagDataProcessor::new(&cli.output_dir, chunker)?;

    let base: Box<dyn DocumentSource> = match &cli.input {
        Some(path) => Box::new(JsonSource::new(path)),
        None => Box::new(SampleSource),
    };
    let added = match cli.category.as_deref() {
        Some(category) => processor.add_documents(&FilteredSource::new(base.as_ref(), category))?,
        None => processor.add_documents(base.as_ref())?,
    };
    if added == 0 {
        warn!("No documents to process");
    }

    processor.process_documents().await?;
    processor.save_to_json(&cli.output_file)?;
    let summary = processor.generate_summary()?;

    if let Some(db_path) = cli.db_path() {
        let mut conn = storage::init_db(&db_path)?;
        for doc in processor.documents() {
            storage::upsert_document(&mut conn, doc)
                .with_context(|| format!("storing {}", doc.id))?;
        }
        let stats = storage::get_stats(&conn)
            .with_context(|| format!("reading stats from {}", db_path.display()))?;
        info!(
            "Knowledge DB: {} ({} sources, {} chunks)",
            db_path.display(),
            stats.total,
            stats.chunks
        );
    }

    info!(
        "Done: {} documents, {} chunks",
        summary.total_documents, summary.total_chunks
    );
    Ok(())
}
