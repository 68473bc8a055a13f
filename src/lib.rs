//! Knowledge-base preparation for RAG pipelines.
//!
//! Documents are normalized, split into sentence-aligned chunks bounded by a
//! word budget, and neighbouring chunks share their boundary sentences:
//!
//! ```rust
//! use rag_prep::TextChunker;
//!
//! let chunker = TextChunker::with_sizes(10, 1).unwrap();
//! let chunks = chunker.chunk("A cat sat. It was happy. The dog ran fast today in the park.");
//! assert_eq!(chunks[0], "A cat sat. It was happy.");
//! assert_eq!(chunks[1], "It was happy. The dog ran fast today in the park.");
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod error;
pub mod normalize;
pub mod processor;
pub mod source;
pub mod storage;

pub use chunking::{chunk_text, split_sentences, word_count, ChunkConfig, TextChunker};
pub use document::{DocumentRecord, MedicalDocument};
pub use error::{ConfigError, SourceError};
pub use normalize::normalize_text;
pub use processor::{RagDataProcessor, Summary};
pub use source::{DocumentSource, JsonSource, SampleSource};
