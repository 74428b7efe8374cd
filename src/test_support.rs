//! In-process fakes for the embedding and chat seams

use crate::error::{Result, ResumeAnalyzerError};
use crate::llm::inference::{ChatModel, InferenceResult};
use crate::processing::embeddings::{Embedding, EmbeddingProvider};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const FAKE_DIMENSION: usize = 256;

/// Deterministic hashed bag-of-words embeddings, L2-normalised
pub struct FakeEmbedder {
    document_calls: AtomicUsize,
    query_calls: AtomicUsize,
    name_lookups: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            document_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            name_lookups: AtomicUsize::new(0),
        }
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn name_lookups(&self) -> usize {
        self.name_lookups.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.document_calls() + self.query_calls()
    }

    fn embed(text: &str) -> Embedding {
        let mut vector = vec![0.0f32; FAKE_DIMENSION];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % FAKE_DIMENSION as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn model_name(&self) -> &str {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        "fake-embedder"
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::embed(text))
    }
}

/// Replies with canned responses in order and records every prompt
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ChatModel for ScriptedChat {
    fn model_name(&self) -> &str {
        "scripted-chat"
    }

    async fn generate(&self, prompt: &str) -> Result<InferenceResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ResumeAnalyzerError::LlmInference("script exhausted".to_string()))?;

        Ok(InferenceResult {
            token_count: text.split_whitespace().count(),
            text,
            inference_time_ms: 0,
        })
    }
}
