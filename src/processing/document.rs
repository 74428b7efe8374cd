//! Chunk structures and the sliding-window chunker

use crate::error::{Result, ResumeAnalyzerError};
use serde::{Deserialize, Serialize};

/// A bounded slice of resume text with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// 1-based page number
    pub page: u32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared with the previous chunk
    pub chunk_overlap: usize,
    pub source_label: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            source_label: "resume.pdf".to_string(),
        }
    }
}

impl ChunkerConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize, source_label: impl Into<String>) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
            source_label: source_label.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ResumeAnalyzerError::InvalidInput(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split page texts into overlapping fixed-width windows.
///
/// Windows are measured in `char`s so a multi-byte character is never cut.
/// Pages that are empty after trimming produce nothing but still count
/// towards the page numbering.
pub fn make_chunks<S: AsRef<str>>(pages: &[S], config: &ChunkerConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let step = config.chunk_size - config.chunk_overlap;
    let mut chunks = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        let text = page.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        // Byte offset of every char boundary, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        let mut start = 0;
        while start < char_count {
            let end = (start + config.chunk_size).min(char_count);
            chunks.push(Chunk {
                text: text[boundaries[start]..boundaries[end]].to_string(),
                page: (i + 1) as u32,
                source: config.source_label.clone(),
            });
            start += step;
        }
    }

    Ok(chunks)
}
