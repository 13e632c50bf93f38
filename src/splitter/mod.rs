//! Text splitter
//!
//! Recursive character splitting: paragraph boundaries first, then line
//! boundaries, then words, then hard character cuts, with merged chunks
//! capped at `chunk_size` characters and `chunk_overlap` characters
//! carried between consecutive chunks.

use crate::errors::{PipelineError, Result};
use crate::loader::Document;
use std::path::PathBuf;
use uuid::Uuid;

/// Separators tried from coarsest to finest
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub source: PathBuf,
    pub chunk_index: usize,
    pub content: String,
}

/// Recursive character text splitter
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl TextSplitter {
    /// Create a splitter; `chunk_overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PipelineError::SplitError(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(PipelineError::SplitError(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into chunks of at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }

    /// Split a batch of documents into indexed chunks
    ///
    /// Chunk indices restart at zero per source document.
    pub fn split_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        if documents.is_empty() {
            return Err(PipelineError::SplitError(
                "no documents to split".to_string(),
            ));
        }

        let mut chunks = Vec::new();
        for document in documents {
            for (chunk_index, content) in self.split_text(&document.content).into_iter().enumerate()
            {
                chunks.push(Chunk {
                    id: Uuid::new_v4(),
                    source: document.source.clone(),
                    chunk_index,
                    content,
                });
            }
        }

        Ok(chunks)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Coarsest separator actually present in this text; none means a
        // hard character split.
        let found = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| text.contains(**sep));
        let (separator, remaining): (&str, &[&str]) = match found {
            Some((i, sep)) => (*sep, &separators[i + 1..]),
            None => ("", &[]),
        };

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).map(String::from).collect()
        };

        let mut fitting: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                final_chunks.extend(self.merge(std::mem::take(&mut fitting), separator));
            }

            if remaining.is_empty() {
                let chars: Vec<String> = piece.chars().map(String::from).collect();
                final_chunks.extend(self.merge(chars, ""));
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !fitting.is_empty() {
            final_chunks.extend(self.merge(fitting, separator));
        }

        final_chunks
    }

    /// Greedily merge pieces into chunks, carrying an overlap tail
    fn merge(&self, pieces: Vec<String>, separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);
            let added = if current.is_empty() {
                piece_len
            } else {
                piece_len + sep_len
            };

            if !current.is_empty() && current_len + added > self.chunk_size {
                chunks.push(current.join(separator));

                while !current.is_empty()
                    && (current_len > self.chunk_overlap
                        || current_len + piece_len + sep_len > self.chunk_size)
                {
                    let removed = current.remove(0);
                    current_len -= char_len(&removed);
                    if !current.is_empty() {
                        current_len -= sep_len;
                    }
                }
            }

            if current.is_empty() {
                current_len = piece_len;
            } else {
                current_len += piece_len + sep_len;
            }
            current.push(piece);
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }

        chunks
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DocumentFormat;
    use chrono::Utc;
    use quickcheck_macros::quickcheck;

    fn doc(source: &str, content: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            source: PathBuf::from(source),
            content: content.to_string(),
            format: DocumentFormat::Text,
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(100, 150).is_err());
        assert!(TextSplitter::new(100, 20).is_ok());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_text("short text");
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        let splitter = TextSplitter::default();
        assert!(splitter.split_text("  \n\n  \n ").is_empty());
    }

    #[test]
    fn test_splits_on_paragraphs_first() {
        let splitter = TextSplitter::new(20, 0).unwrap();
        let chunks = splitter.split_text("first paragraph\n\nsecond paragraph");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "first paragraph");
        assert_eq!(chunks[1], "second paragraph");
    }

    #[test]
    fn test_long_word_hard_cut() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = splitter.split_text(&"x".repeat(25));
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total >= 25);
    }

    #[test]
    fn test_overlap_carries_trailing_words() {
        let splitter = TextSplitter::new(20, 10).unwrap();
        let chunks = splitter.split_text("alpha beta gamma delta epsilon zeta");
        assert!(chunks.len() > 1);

        // Each boundary shares at least one word with the previous chunk
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(
                pair[1].contains(last_word),
                "chunk {:?} should overlap {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_split_documents_indexes_per_source() {
        let splitter = TextSplitter::new(20, 0).unwrap();
        let docs = vec![
            doc("a.txt", "one two three four five six seven eight"),
            doc("b.txt", "short"),
        ];

        let chunks = splitter.split_documents(&docs).unwrap();

        let a_chunks: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| c.source == PathBuf::from("a.txt"))
            .collect();
        assert!(a_chunks.len() > 1);
        for (i, chunk) in a_chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }

        let b_chunks: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| c.source == PathBuf::from("b.txt"))
            .collect();
        assert_eq!(b_chunks.len(), 1);
        assert_eq!(b_chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_split_documents_empty_input_is_error() {
        let splitter = TextSplitter::default();
        assert!(splitter.split_documents(&[]).is_err());
    }

    #[quickcheck]
    fn prop_chunks_never_exceed_chunk_size(text: String) -> bool {
        let splitter = TextSplitter::new(50, 10).unwrap();
        splitter
            .split_text(&text)
            .iter()
            .all(|c| c.chars().count() <= 50)
    }

    #[quickcheck]
    fn prop_chunks_are_never_blank(text: String) -> bool {
        let splitter = TextSplitter::new(50, 10).unwrap();
        splitter
            .split_text(&text)
            .iter()
            .all(|c| !c.trim().is_empty())
    }

    #[quickcheck]
    fn prop_ascii_content_is_preserved(words: Vec<u8>) -> bool {
        // Build a deterministic ascii corpus from the generated bytes
        let text: String = words
            .iter()
            .map(|b| format!("w{b} "))
            .collect::<String>();
        let splitter = TextSplitter::new(40, 0).unwrap();

        let rejoined: String = splitter.split_text(&text).join(" ");
        text.split_whitespace().all(|word| rejoined.contains(word))
    }
}
