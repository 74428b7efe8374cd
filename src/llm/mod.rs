//! LLM integration module

pub mod analyzer;
pub mod gemini;
pub mod inference;
pub mod prompts;
pub mod response;

pub use analyzer::{AnalysisResult, AnalyzerSettings, ResumeAnalyzer};
pub use inference::ChatModel;
