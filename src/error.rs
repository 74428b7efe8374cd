//! Error handling for the resume analyzer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeAnalyzerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("LLM inference error: {0}")]
    LlmInference(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl ResumeAnalyzerError {
    /// Rejections caused by what the caller sent, as opposed to faults on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ResumeAnalyzerError::InvalidInput(_)
                | ResumeAnalyzerError::PdfExtraction(_)
                | ResumeAnalyzerError::UnsupportedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ResumeAnalyzerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeAnalyzerError {
    fn from(err: anyhow::Error) -> Self {
        ResumeAnalyzerError::Embedding(err.to_string())
    }
}
