//! File type detection

use crate::error::{Result, ResumeAnalyzerError};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "txt" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            _ => FileType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ResumeAnalyzerError::InvalidInput(format!("File has no extension: {}", path.display()))
            })?;
        Ok(Self::from_extension(extension))
    }
}

/// How the caller wants an input file interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Decide from the file extension
    #[default]
    Auto,
    Pdf,
    Text,
}

impl std::str::FromStr for InputKind {
    type Err = ResumeAnalyzerError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_lowercase().as_str() {
            "auto" => Ok(InputKind::Auto),
            "pdf" => Ok(InputKind::Pdf),
            "text" | "txt" => Ok(InputKind::Text),
            other => Err(ResumeAnalyzerError::InvalidInput(format!(
                "Unknown input type '{}'. Supported: auto, pdf, text",
                other
            ))),
        }
    }
}
