//! Exact nearest-neighbour index over chunk embeddings

use crate::error::{Result, ResumeAnalyzerError};
use crate::processing::document::Chunk;
use crate::processing::embeddings::{check_embeddings, Embedding, EmbeddingProvider};
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

const INDEX_FILE: &str = "index.json";
const CHUNKS_FILE: &str = "chunks.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared euclidean distance
    #[default]
    L2,
    /// One minus cosine similarity
    Cosine,
}

impl DistanceMetric {
    pub fn distance(&self, a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
        match self {
            DistanceMetric::L2 => {
                let diff = &a - &b;
                diff.dot(&diff)
            }
            DistanceMetric::Cosine => {
                let norm_a = a.dot(&a).sqrt();
                let norm_b = b.dot(&b).sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0
                } else {
                    1.0 - a.dot(&b) / (norm_a * norm_b)
                }
            }
        }
    }
}

/// A chunk paired with its distance to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Read-only index pairing each chunk with its embedding.
///
/// Row `i` of `vectors` belongs to `chunks[i]`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Array2<f32>,
    metric: DistanceMetric,
    embedding_model: String,
}

/// On-disk form of `index.json`
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    metric: DistanceMetric,
    embedding_model: String,
    dimension: usize,
    vectors: Vec<Embedding>,
}

impl VectorIndex {
    /// Embed every chunk and build an in-memory index
    pub async fn build<E: EmbeddingProvider>(
        chunks: Vec<Chunk>,
        embedder: &E,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(ResumeAnalyzerError::InvalidInput(
                "Cannot build an index from zero chunks".to_string(),
            ));
        }

        let start_time = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;

        let index = Self::from_parts(chunks, embeddings, metric, embedder.model_name().to_string())?;
        info!(
            "Built vector index: {} chunks, dimension {} in {:.2?}",
            index.len(),
            index.dimension(),
            start_time.elapsed()
        );
        Ok(index)
    }

    /// Assemble an index from precomputed embeddings
    pub fn from_parts(
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
        metric: DistanceMetric,
        embedding_model: String,
    ) -> Result<Self> {
        let dimension = check_embeddings(&embeddings, chunks.len())?;
        let flat: Vec<f32> = embeddings.into_iter().flatten().collect();
        let vectors = Array2::from_shape_vec((chunks.len(), dimension), flat)
            .map_err(|e| ResumeAnalyzerError::Index(format!("Failed to shape embedding matrix: {}", e)))?;

        Ok(Self {
            chunks,
            vectors,
            metric,
            embedding_model,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The `k` chunks nearest to `query`, nearest first.
    ///
    /// Exact distance ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimension() {
            return Err(ResumeAnalyzerError::Embedding(format!(
                "Query embedding has dimension {}, index expects {}",
                query.len(),
                self.dimension()
            )));
        }

        let query = ArrayView1::from(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i, self.metric.distance(row, query)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k.min(self.len()));

        debug!("Search returned {} of {} chunks", scored.len(), self.len());
        Ok(scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                distance,
            })
            .collect())
    }

    /// Write `index.json` and `chunks.json` into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let persisted = PersistedIndex {
            version: FORMAT_VERSION,
            metric: self.metric,
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension(),
            vectors: self.vectors.rows().into_iter().map(|row| row.to_vec()).collect(),
        };

        std::fs::write(dir.join(INDEX_FILE), serde_json::to_vec(&persisted)?)?;
        std::fs::write(dir.join(CHUNKS_FILE), serde_json::to_vec_pretty(&self.chunks)?)?;

        info!("Saved vector index ({} chunks) to {}", self.len(), dir.display());
        Ok(())
    }

    /// Reload an index written by [`VectorIndex::save`] without re-embedding
    pub fn load(dir: &Path) -> Result<Self> {
        let index_path = dir.join(INDEX_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);
        if !index_path.exists() || !chunks_path.exists() {
            return Err(ResumeAnalyzerError::Index(format!(
                "No saved index found in {}",
                dir.display()
            )));
        }

        let persisted: PersistedIndex = serde_json::from_slice(&std::fs::read(&index_path)?)
            .map_err(|e| ResumeAnalyzerError::Index(format!("Corrupt {}: {}", index_path.display(), e)))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&std::fs::read(&chunks_path)?)
            .map_err(|e| ResumeAnalyzerError::Index(format!("Corrupt {}: {}", chunks_path.display(), e)))?;

        if persisted.version != FORMAT_VERSION {
            return Err(ResumeAnalyzerError::Index(format!(
                "Unsupported index format version {} (expected {})",
                persisted.version, FORMAT_VERSION
            )));
        }
        if chunks.is_empty() {
            return Err(ResumeAnalyzerError::Index("Saved index has no chunks".to_string()));
        }
        if persisted.vectors.iter().any(|v| v.len() != persisted.dimension) {
            return Err(ResumeAnalyzerError::Index(format!(
                "Saved vectors do not all have dimension {}",
                persisted.dimension
            )));
        }

        Self::from_parts(chunks, persisted.vectors, persisted.metric, persisted.embedding_model)
            .map_err(|e| ResumeAnalyzerError::Index(format!("Saved index is inconsistent: {}", e)))
    }

    /// Warn when the index was embedded by a different model than `embedder`
    pub fn check_model<E: EmbeddingProvider>(&self, embedder: &E) {
        if self.embedding_model != embedder.model_name() {
            warn!(
                "Index was built with '{}' but queries will use '{}'",
                self.embedding_model,
                embedder.model_name()
            );
        }
    }
}
