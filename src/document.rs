use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chunking::TextChunker;

/// Raw record produced by a document source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub category: String,
}

/// Document in the knowledge base.
///
/// `chunks` stays empty until [`MedicalDocument::process`] runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl MedicalDocument {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            source: source.into(),
            category: category.into(),
            chunks: Vec::new(),
        }
    }

    /// Re-chunks the content, replacing any previous chunks.
    pub fn process(&mut self, chunker: &TextChunker) {
        self.chunks = chunker.chunk(&self.content);
    }
}

impl From<DocumentRecord> for MedicalDocument {
    fn from(record: DocumentRecord) -> Self {
        let id = match record.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_id(&record.source, &record.title, &record.content),
        };
        Self::new(id, record.title, record.content, record.source, record.category)
    }
}

/// Stable document ID (sha256[:16] of source:title:content)
pub fn generate_id(source: &str, title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", source, title, content).as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
