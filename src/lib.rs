//! Resume analyzer library
//!
//! Chunks a resume, indexes the chunks by embedding, and asks an LLM for
//! extracted skills and an ATS fit score over the retrieved context.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod processing;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{Result, ResumeAnalyzerError};
pub use input::ResumeInput;
pub use llm::{AnalysisResult, AnalyzerSettings, ResumeAnalyzer};
