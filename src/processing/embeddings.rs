//! Embedding provider abstraction

use crate::error::{Result, ResumeAnalyzerError};
use std::future::Future;

/// Fixed-dimension vector for one piece of text
pub type Embedding = Vec<f32>;

/// Anything that turns text into embeddings.
///
/// Documents and queries are separate calls because some providers embed
/// them differently (Gemini takes a task type).
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier stored alongside persisted indexes
    fn model_name(&self) -> &str;

    /// Embed chunk texts, one vector per input, in input order
    fn embed_documents(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Embedding>>> + Send;

    fn embed_query(&self, text: &str) -> impl Future<Output = Result<Embedding>> + Send;
}

/// Check that a provider returned one non-empty vector per input, all of the same width.
/// Returns the shared dimension.
pub fn check_embeddings(embeddings: &[Embedding], expected: usize) -> Result<usize> {
    if embeddings.len() != expected {
        return Err(ResumeAnalyzerError::Embedding(format!(
            "Provider returned {} embeddings for {} inputs",
            embeddings.len(),
            expected
        )));
    }

    let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
    if expected > 0 && dimension == 0 {
        return Err(ResumeAnalyzerError::Embedding("Provider returned an empty embedding".to_string()));
    }

    if let Some((i, bad)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dimension) {
        return Err(ResumeAnalyzerError::Embedding(format!(
            "Embedding {} has dimension {}, expected {}",
            i,
            bad.len(),
            dimension
        )));
    }

    Ok(dimension)
}

#[cfg(feature = "model2vec")]
pub use local::Model2VecEmbedder;

#[cfg(feature = "model2vec")]
mod local {
    use super::{Embedding, EmbeddingProvider};
    use crate::error::Result;
    use log::info;
    use model2vec_rs::model::StaticModel;
    use std::time::Instant;

    /// Offline embeddings from a Model2Vec static model
    pub struct Model2VecEmbedder {
        model: StaticModel,
        model_name: String,
    }

    impl Model2VecEmbedder {
        /// Load from a local folder or a HuggingFace repo ID
        pub fn from_pretrained(repo_or_path: &str) -> Result<Self> {
            let start_time = Instant::now();
            info!("Loading Model2Vec embedding model: {}", repo_or_path);

            let model = StaticModel::from_pretrained(repo_or_path, None, None, None)?;

            info!("Model loaded in {:.2?}", start_time.elapsed());
            Ok(Self {
                model,
                model_name: repo_or_path.to_string(),
            })
        }
    }

    impl EmbeddingProvider for Model2VecEmbedder {
        fn model_name(&self) -> &str {
            &self.model_name
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(self.model.encode(texts))
        }

        async fn embed_query(&self, text: &str) -> Result<Embedding> {
            Ok(self.model.encode_single(text))
        }
    }
}
