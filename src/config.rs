//! Configuration management for the resume analyzer

use crate::error::{Result, ResumeAnalyzerError};
use crate::processing::vector_index::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub processing: ProcessingConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline key; takes precedence over `api_key_env` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// No timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub embedding_backend: EmbeddingBackend,
    pub model2vec_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Gemini,
    Model2Vec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub source_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub skills_probe_query: String,
    pub metric: DistanceMetric,
    pub index_dir: PathBuf,
}

/// Weights quoted to the model in the scoring prompt, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skills_match_weight: u8,
    pub experience_relevance_weight: u8,
    pub tools_keywords_weight: u8,
    pub clarity_weight: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                embedding_model: "models/text-embedding-004".to_string(),
                chat_model: "gemini-2.5-flash-lite".to_string(),
                temperature: 0.2,
                api_key_env: "GOOGLE_API_KEY".to_string(),
                api_key: None,
                request_timeout_secs: None,
                embedding_backend: EmbeddingBackend::Gemini,
                model2vec_model: "minishlab/potion-base-8M".to_string(),
            },
            processing: ProcessingConfig {
                chunk_size: 500,
                chunk_overlap: 50,
                batch_size: 100,
                source_label: "resume.pdf".to_string(),
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                skills_probe_query: "skills experience".to_string(),
                metric: DistanceMetric::L2,
                index_dir: PathBuf::from("data").join("resume_index"),
            },
            scoring: ScoringConfig {
                skills_match_weight: 40,
                experience_relevance_weight: 30,
                tools_keywords_weight: 20,
                clarity_weight: 10,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from `config_path`, writing defaults on first run
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-analyzer")
            .join("config.toml")
    }

    /// Sanity checks that would otherwise surface deep inside a request
    pub fn validate(&self) -> Result<()> {
        if self.processing.chunk_overlap >= self.processing.chunk_size {
            return Err(ResumeAnalyzerError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.processing.chunk_overlap, self.processing.chunk_size
            )));
        }
        if self.processing.batch_size == 0 {
            return Err(ResumeAnalyzerError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ResumeAnalyzerError::Configuration(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the API credential: inline key first, then the environment
    pub fn api_key(&self) -> Result<String> {
        let key = match &self.provider.api_key {
            Some(key) => Some(key.clone()),
            None => std::env::var(&self.provider.api_key_env).ok(),
        };

        match key {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ResumeAnalyzerError::Configuration(format!(
                "{} not set. Add it to your environment or .env file",
                self.provider.api_key_env
            ))),
        }
    }
}
