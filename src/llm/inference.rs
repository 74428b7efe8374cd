//! Chat model abstraction used by the analyzer

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Sampling settings sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: None,
        }
    }
}

/// Result of one generation call.
///
/// `text` is the raw reply; nothing is parsed at this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub text: String,
    pub token_count: usize,
    pub inference_time_ms: u64,
}

/// A text-in, text-out language model
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str) -> impl Future<Output = Result<InferenceResult>> + Send;
}
