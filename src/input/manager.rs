//! Input manager for handling different file types

use crate::error::{Result, ResumeAnalyzerError};
use crate::input::file_detector::{FileType, InputKind};
use crate::input::text_extractor::{
    MarkdownExtractor, PdfExtractor, PlainTextExtractor, ResumeInput, TextExtractor,
};
use log::info;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

pub struct InputManager {
    cache: HashMap<String, Vec<String>>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Extract page texts from a PDF, TXT or MD file
    pub async fn extract_pages(&mut self, path: &Path) -> Result<Vec<String>> {
        let path_str = path.to_string_lossy().to_string();

        if let Some(cached) = self.cache.get(&path_str) {
            info!("Using cached text for: {}", path.display());
            return Ok(cached.clone());
        }

        if !path.exists() {
            return Err(ResumeAnalyzerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let pages = match FileType::from_path(path)? {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(ResumeAnalyzerError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    path.display()
                )));
            }
        };

        self.cache.insert(path_str, pages.clone());

        Ok(pages)
    }

    /// Extract a file as one string, pages joined by newlines
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        Ok(self.extract_pages(path).await?.join("\n"))
    }

    /// Load a resume file as a tagged input.
    ///
    /// `InputKind::Auto` picks from the extension; an explicit kind reads the
    /// file as that type regardless of extension.
    pub async fn load_resume(&mut self, path: &Path, kind: InputKind) -> Result<ResumeInput> {
        if !path.exists() {
            return Err(ResumeAnalyzerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        match kind {
            InputKind::Pdf => Ok(ResumeInput::Pdf(fs::read(path).await?)),
            InputKind::Text => Ok(ResumeInput::Text(fs::read_to_string(path).await?)),
            InputKind::Auto => match FileType::from_path(path)? {
                FileType::Pdf => Ok(ResumeInput::Pdf(fs::read(path).await?)),
                _ => Ok(ResumeInput::Text(self.extract_text(path).await?)),
            },
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
