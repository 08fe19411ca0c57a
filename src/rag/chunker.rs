use crate::types::{AppError, Result};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits document text into overlapping chunks of at most `chunk_size`
/// characters, preferring paragraph, sentence and word boundaries.
pub struct TextChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Configuration(format!("Invalid chunk settings: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.splitter
            .chunks(text)
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_respect_size() {
        let chunker = TextChunker::new(40, 10).unwrap();
        let text = "Aspirin reduces fever. It also relieves mild pain. \
                    Ibuprofen is an anti-inflammatory drug. Paracetamol lowers temperature.";
        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        assert!(chunks[0].starts_with("Aspirin"));
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(500, 50).unwrap();
        assert_eq!(chunker.chunk("Short note."), vec!["Short note.".to_string()]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        let chunker = TextChunker::new(500, 50).unwrap();
        assert!(chunker.chunk("   \n\n  ").is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(TextChunker::new(10, 10).is_err());
    }
}
