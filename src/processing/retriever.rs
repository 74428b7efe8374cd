//! Query-to-chunks retrieval over a built index

use crate::error::Result;
use crate::processing::document::Chunk;
use crate::processing::embeddings::EmbeddingProvider;
use crate::processing::vector_index::{ScoredChunk, VectorIndex};
use log::debug;

/// Embeds queries with the same provider that built the index
pub struct Retriever<'a, E: EmbeddingProvider> {
    index: &'a VectorIndex,
    embedder: &'a E,
    top_k: usize,
}

impl<'a, E: EmbeddingProvider> Retriever<'a, E> {
    pub fn new(index: &'a VectorIndex, embedder: &'a E, top_k: usize) -> Self {
        Self { index, embedder, top_k }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Nearest chunks with their distances, using the configured `top_k`
    pub async fn retrieve_scored(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retrieve_scored_k(query, self.top_k).await
    }

    pub async fn retrieve_scored_k(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        debug!("Retrieving top {} chunks for query of {} chars", k, query.len());
        let query_embedding = self.embedder.embed_query(query).await?;
        self.index.search(&query_embedding, k)
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(query)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }
}

/// Join chunk texts with blank lines to form prompt context
pub fn join_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
