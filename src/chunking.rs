use crate::error::ConfigError;
use crate::normalize::normalize_text;

/// Default word budget per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Default number of trailing sentences carried into the next chunk
pub const DEFAULT_OVERLAP: usize = 50;

/// Chunker configuration, validated at construction.
///
/// `chunk_size` is a soft word budget: a single sentence longer than the budget
/// is still emitted whole. `overlap` counts sentences, not words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Sentence-aware chunker with sentence overlap between neighbouring chunks.
///
/// Holds only its configuration, so one instance can be shared freely across
/// threads and reused for any number of documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn with_sizes(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        Ok(Self::new(ChunkConfig::new(chunk_size, overlap)?))
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// Splits `text` into ordered chunks of whole sentences.
    ///
    /// Sentences accumulate greedily until the next one would push the word
    /// count past `chunk_size`; the buffer is then flushed and restarted from
    /// its last `overlap` sentences. Empty or whitespace-only input yields no
    /// chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = normalize_text(text);
        if text.is_empty() {
            return Vec::new();
        }

        let overlap = self.config.overlap;
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_length = 0usize;

        for sentence in split_sentences(&text) {
            let sentence_length = word_count(sentence);

            if current_length + sentence_length > self.config.chunk_size && !current.is_empty() {
                chunks.push(current.join(" "));
                // Fewer than `overlap` sentences: carry the whole buffer
                if current.len() > overlap {
                    let dropped = current.len() - overlap;
                    current.drain(..dropped);
                }
                current_length = current.iter().map(|s| word_count(s)).sum();
            }

            current.push(sentence);
            current_length += sentence_length;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        tracing::trace!(
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            overlap,
            "text chunked"
        );
        chunks
    }
}

/// Chunks `text` with a one-off configuration.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ConfigError> {
    Ok(TextChunker::with_sizes(chunk_size, overlap)?.chunk(text))
}

/// Whitespace-delimited word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits after `.`, `!` or `?` when followed by whitespace.
///
/// Naive on purpose: "Dr. Smith" and "3. 5" both split. The whitespace run
/// between sentences is dropped; empty pieces are never returned.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next_c)) = chars.peek() else {
            break;
        };
        if !next_c.is_whitespace() {
            continue;
        }

        let end = i + c.len_utf8();
        let sentence = &text[start..end];
        if !sentence.trim().is_empty() {
            sentences.push(sentence);
        }

        // Skip the whitespace run
        start = next_i;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            start = j + w.len_utf8();
            chars.next();
        }
    }

    let tail = &text[start..];
    if !tail.trim().is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str =
        "A cat sat. It was happy. The dog ran fast today in the park. It barked loudly.";

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences(SCENARIO);
        assert_eq!(
            sentences,
            vec![
                "A cat sat.",
                "It was happy.",
                "The dog ran fast today in the park.",
                "It barked loudly.",
            ]
        );
        let counts: Vec<usize> = sentences.iter().map(|s| word_count(s)).collect();
        assert_eq!(counts, vec![3, 3, 8, 3]);
    }

    #[test]
    fn test_split_sentences_all_terminators() {
        let sentences = split_sentences("Is it? Yes! It is. Done");
        assert_eq!(sentences, vec!["Is it?", "Yes!", "It is.", "Done"]);
    }

    #[test]
    fn test_split_requires_following_whitespace() {
        // No whitespace after the dot: version numbers and URLs stay whole
        let sentences = split_sentences("Version 1.2.3 is out. See example.com now.");
        assert_eq!(sentences, vec!["Version 1.2.3 is out.", "See example.com now."]);
    }

    #[test]
    fn test_split_mis_splits_abbreviations() {
        // Known limitation of the punctuation heuristic
        let sentences = split_sentences("Ask Dr. Smith today.");
        assert_eq!(sentences, vec!["Ask Dr.", "Smith today."]);
    }

    #[test]
    fn test_split_drops_whitespace_runs() {
        let sentences = split_sentences("One.  \n\t Two.\n");
        assert_eq!(sentences, vec!["One.", "Two."]);
    }

    #[test]
    fn test_split_multibyte_text() {
        let sentences = split_sentences("Café au lait. Größe passt! Ça va?");
        assert_eq!(sentences, vec!["Café au lait.", "Größe passt!", "Ça va?"]);
    }

    #[test]
    fn test_scenario_greedy_flush_and_carry_one() {
        let chunker = TextChunker::with_sizes(10, 1).unwrap();
        let chunks = chunker.chunk(SCENARIO);
        assert_eq!(
            chunks,
            vec![
                "A cat sat. It was happy.",
                "It was happy. The dog ran fast today in the park.",
                "The dog ran fast today in the park. It barked loudly.",
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = TextChunker::with_sizes(10, 1).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n\t  ").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk("hello world foo bar");
        assert_eq!(chunks, vec!["hello world foo bar"]);
    }

    #[test]
    fn test_input_is_normalized() {
        let chunker = TextChunker::with_sizes(100, 1).unwrap();
        let chunks = chunker.chunk("  First line.\n\n\n  Second   line.\n");
        assert_eq!(chunks, vec!["First line. Second line."]);
    }

    #[test]
    fn test_oversized_sentence_is_not_split() {
        let long = (0..25).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let text = format!("Short one. {long}. Tail here.");
        let chunker = TextChunker::with_sizes(10, 0).unwrap();
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], "Short one.");
        assert_eq!(chunks[1], format!("{long}."));
        assert_eq!(word_count(&chunks[1]), 25);
        assert_eq!(chunks[2], "Tail here.");
    }

    #[test]
    fn test_oversized_first_sentence_emitted_alone() {
        let long = (0..15).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let chunker = TextChunker::with_sizes(5, 1).unwrap();
        let chunks = chunker.chunk(&format!("{long}."));
        assert_eq!(chunks, vec![format!("{long}.")]);
    }

    #[test]
    fn test_overlap_zero_carries_nothing() {
        let chunker = TextChunker::with_sizes(4, 0).unwrap();
        let chunks = chunker.chunk("a b. c d. e f. g h.");
        assert_eq!(chunks, vec!["a b. c d.", "e f. g h."]);
    }

    #[test]
    fn test_overlap_two_sentences() {
        let chunker = TextChunker::with_sizes(6, 2).unwrap();
        let chunks = chunker.chunk("a b. c d. e f. g h. i j.");
        // [ab cd ef] flush, carry [cd ef] + gh = 6, ij pushes over
        assert_eq!(chunks, vec!["a b. c d. e f.", "c d. e f. g h.", "e f. g h. i j."]);
    }

    #[test]
    fn test_overlap_larger_than_buffer_carries_everything() {
        // Degenerate configuration: the whole buffer is carried every time
        let chunker = TextChunker::with_sizes(4, 10).unwrap();
        let chunks = chunker.chunk("a b c. d e. f g.");
        assert_eq!(chunks, vec!["a b c.", "a b c. d e.", "a b c. d e. f g."]);
    }

    #[test]
    fn test_exact_budget_does_not_flush() {
        let chunker = TextChunker::with_sizes(4, 1).unwrap();
        let chunks = chunker.chunk("a b. c d.");
        assert_eq!(chunks, vec!["a b. c d."]);
    }

    #[test]
    fn test_idempotent() {
        let chunker = TextChunker::with_sizes(7, 1).unwrap();
        let text = sample_text();
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }

    #[test]
    fn test_chunks_reproduce_sentence_sequence() {
        let text = sample_text();
        for (chunk_size, overlap) in [(5, 1), (9, 2), (20, 3), (3, 0)] {
            let chunker = TextChunker::with_sizes(chunk_size, overlap).unwrap();
            let chunks = chunker.chunk(&text);

            let mut rebuilt: Vec<&str> = Vec::new();
            let mut prev_len = 0;
            for (idx, chunk) in chunks.iter().enumerate() {
                let sentences = split_sentences(chunk);
                let carried = if idx == 0 { 0 } else { overlap.min(prev_len) };
                rebuilt.extend_from_slice(&sentences[carried..]);
                prev_len = sentences.len();
            }

            assert_eq!(
                rebuilt,
                split_sentences(&text),
                "chunk_size={chunk_size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn test_chunk_words_bounded_by_one_sentence() {
        let text = sample_text();
        let longest = split_sentences(&text)
            .iter()
            .map(|s| word_count(s))
            .max()
            .unwrap();
        let chunk_size = 8;
        assert!(longest <= chunk_size);

        let chunker = TextChunker::with_sizes(chunk_size, 1).unwrap();
        for chunk in chunker.chunk(&text) {
            assert!(
                word_count(&chunk) <= chunk_size + longest,
                "chunk too large: {chunk}"
            );
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert_eq!(ChunkConfig::new(0, 1), Err(ConfigError::ZeroChunkSize));
        assert!(TextChunker::with_sizes(0, 0).is_err());
        assert!(chunk_text("Some text.", 0, 1).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ChunkConfig::default();
        assert_eq!(config.chunk_size(), DEFAULT_CHUNK_SIZE);
        assert_eq!(config.overlap(), DEFAULT_OVERLAP);
    }

    #[test]
    fn test_chunk_text_matches_chunker() {
        let chunks = chunk_text(SCENARIO, 10, 1).unwrap();
        assert_eq!(chunks, TextChunker::with_sizes(10, 1).unwrap().chunk(SCENARIO));
    }

    fn sample_text() -> String {
        let lengths = [3, 5, 1, 8, 2, 6, 4, 7, 3, 2, 8, 5, 1, 4];
        lengths
            .iter()
            .enumerate()
            .map(|(s, &n)| {
                let words: Vec<String> = (0..n).map(|w| format!("s{s}w{w}")).collect();
                format!("{}.", words.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n ")
    }
}
