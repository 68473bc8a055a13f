use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunking::TextChunker;
use crate::document::MedicalDocument;
use crate::source::DocumentSource;

/// Knowledge base file name written by [`RagDataProcessor::save_to_json`] by default
pub const KNOWLEDGE_BASE_FILE: &str = "knowledge_base.json";

pub const SUMMARY_FILE: &str = "summary.json";

/// Collects documents, chunks them and writes the knowledge base files
pub struct RagDataProcessor {
    output_dir: PathBuf,
    chunker: TextChunker,
    documents: Vec<MedicalDocument>,
}

impl RagDataProcessor {
    pub fn new(output_dir: impl AsRef<Path>, chunker: TextChunker) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output dir {}", output_dir.display()))?;
        Ok(Self {
            output_dir,
            chunker,
            documents: Vec::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn documents(&self) -> &[MedicalDocument] {
        &self.documents
    }

    /// Appends every record from `source`; returns how many were added
    pub fn add_documents(&mut self, source: &dyn DocumentSource) -> Result<usize> {
        let records = source
            .load()
            .with_context(|| format!("loading documents from {}", source.name()))?;
        let count = records.len();
        self.documents.extend(records.into_iter().map(MedicalDocument::from));
        info!("Loaded {} documents from {}", count, source.name());
        Ok(count)
    }

    pub fn add_document(&mut self, doc: MedicalDocument) {
        self.documents.push(doc);
    }

    /// Chunks all documents on the blocking pool, replacing earlier chunks.
    ///
    /// Document order is preserved regardless of which task finishes first.
    pub async fn process_documents(&mut self) -> Result<()> {
        let chunker = self.chunker;
        let handles: Vec<_> = self
            .documents
            .iter()
            .map(|doc| {
                let mut doc = doc.clone();
                tokio::task::spawn_blocking(move || {
                    doc.process(&chunker);
                    doc.chunks
                })
            })
            .collect();

        for (doc, handle) in self.documents.iter_mut().zip(handles) {
            doc.chunks = handle
                .await
                .with_context(|| format!("chunking task for {} failed", doc.id))?;
            info!("Processed: {} ({} chunks)", doc.title, doc.chunks.len());
        }

        Ok(())
    }

    /// Writes the knowledge base as pretty JSON and returns its path
    pub fn save_to_json(&self, filename: &str) -> Result<PathBuf> {
        let output_file = self.output_dir.join(filename);
        let json = serde_json::to_string_pretty(&self.documents)?;
        std::fs::write(&output_file, json)
            .with_context(|| format!("writing {}", output_file.display()))?;
        info!("Knowledge base saved to {}", output_file.display());
        Ok(output_file)
    }

    /// Builds the processing summary and writes it to `summary.json`
    pub fn generate_summary(&self) -> Result<Summary> {
        let summary = self.summary();
        let summary_file = self.output_dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&summary_file, json)
            .with_context(|| format!("writing {}", summary_file.display()))?;

        info!(
            "Summary: {} documents, {} chunks",
            summary.total_documents, summary.total_chunks
        );
        debug!("Summary written to {}", summary_file.display());
        Ok(summary)
    }

    fn summary(&self) -> Summary {
        let config = self.chunker.config();
        Summary {
            total_documents: self.documents.len(),
            total_chunks: self.documents.iter().map(|d| d.chunks.len()).sum(),
            chunk_size: config.chunk_size(),
            overlap: config.overlap(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            documents: self
                .documents
                .iter()
                .map(|d| DocumentSummary {
                    id: d.id.clone(),
                    title: d.title.clone(),
                    source: d.source.clone(),
                    category: d.category.clone(),
                    chunks_count: d.chunks.len(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    pub generated_at: String,
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub source: String,
    pub category: String,
    pub chunks_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;

    fn processor(dir: &Path) -> RagDataProcessor {
        RagDataProcessor::new(dir, TextChunker::with_sizes(12, 1).unwrap()).unwrap()
    }

    #[test]
    fn test_new_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("rag_data");
        let p = processor(&out);
        assert!(out.is_dir());
        assert_eq!(p.output_dir(), out.as_path());
    }

    #[test]
    fn test_add_documents_leaves_chunks_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = processor(dir.path());
        assert_eq!(p.add_documents(&SampleSource).unwrap(), 2);
        assert!(p.documents().iter().all(|d| d.chunks.is_empty()));
    }

    #[tokio::test]
    async fn test_process_documents_preserves_order_and_matches_chunker() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = processor(dir.path());
        p.add_documents(&SampleSource).unwrap();
        p.add_document(MedicalDocument::new("x", "Blank", " \n ", "test", "none"));
        p.process_documents().await.unwrap();

        let chunker = TextChunker::with_sizes(12, 1).unwrap();
        let docs = p.documents();
        assert_eq!(docs[0].id, "doc_0");
        assert_eq!(docs[1].id, "doc_1");
        assert_eq!(docs[0].chunks, chunker.chunk(&docs[0].content));
        assert!(docs[0].chunks.len() > 1);
        assert!(docs[2].chunks.is_empty());
    }

    #[tokio::test]
    async fn test_process_twice_does_not_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = processor(dir.path());
        p.add_documents(&SampleSource).unwrap();
        p.process_documents().await.unwrap();
        let first: Vec<usize> = p.documents().iter().map(|d| d.chunks.len()).collect();
        p.process_documents().await.unwrap();
        let second: Vec<usize> = p.documents().iter().map(|d| d.chunks.len()).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_to_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = processor(dir.path());
        p.add_document(MedicalDocument::new(
            "ar",
            "مرض السكري",
            "النص الأول. النص الثاني.",
            "MedlinePlus",
            "Endocrine System",
        ));
        p.process_documents().await.unwrap();

        let path = p.save_to_json(KNOWLEDGE_BASE_FILE).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        // Non-ASCII text is written as-is, not escaped
        assert!(raw.contains("مرض السكري"));

        let loaded: Vec<MedicalDocument> = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded, p.documents());
    }

    #[tokio::test]
    async fn test_generate_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = processor(dir.path());
        p.add_documents(&SampleSource).unwrap();
        p.process_documents().await.unwrap();

        let summary = p.generate_summary().unwrap();
        let expected: usize = p.documents().iter().map(|d| d.chunks.len()).sum();
        assert_eq!(summary.total_documents, 2);
        assert_eq!(summary.total_chunks, expected);
        assert_eq!(summary.chunk_size, 12);
        assert_eq!(summary.overlap, 1);
        assert_eq!(summary.documents[1].category, "Blood, Heart and Circulation");

        let raw = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        let on_disk: Summary = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.total_chunks, expected);
        assert!(chrono::DateTime::parse_from_rfc3339(&on_disk.generated_at).is_ok());
    }
}
