//! Text extraction from various file formats

use crate::error::{Result, ResumeAnalyzerError};
use pdf_extract::{ConvertToFmt, MediaBox, OutputDev, OutputError, PlainTextOutput, Transform};
use pulldown_cmark::{html, Parser};
use regex::Regex;
use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;
use tokio::fs;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

pub trait TextExtractor {
    /// Extract text as an ordered list of pages
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Resume content as handed over by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeInput {
    /// Raw PDF file contents
    Pdf(Vec<u8>),
    /// Already-extracted text
    Text(String),
}

impl ResumeInput {
    /// Resolve to page texts. Text input is a single page.
    pub fn into_pages(self) -> Result<Vec<String>> {
        match self {
            ResumeInput::Pdf(bytes) => extract_pdf_pages(&bytes),
            ResumeInput::Text(text) => Ok(vec![text]),
        }
    }

    /// Resolve to one string, pages joined by newlines
    pub fn into_text(self) -> Result<String> {
        Ok(self.into_pages()?.join("\n"))
    }
}

/// `fmt::Write` target shared between the text renderer and the page collector
#[derive(Clone, Default)]
struct PageBuffer(Rc<RefCell<String>>);

impl fmt::Write for PageBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}

impl ConvertToFmt for PageBuffer {
    type Writer = PageBuffer;

    fn convert(self) -> Self::Writer {
        self
    }
}

/// Plain-text rendering that closes off one string per PDF page
struct PagedTextOutput {
    text: PlainTextOutput<PageBuffer>,
    buffer: PageBuffer,
    pages: Vec<String>,
}

impl PagedTextOutput {
    fn new() -> Self {
        let buffer = PageBuffer::default();
        Self {
            text: PlainTextOutput::new(buffer.clone()),
            buffer,
            pages: Vec::new(),
        }
    }

    fn into_pages(self) -> Vec<String> {
        self.pages
    }
}

impl OutputDev for PagedTextOutput {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.text.begin_page(page_num, media_box, art_box)
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.text.end_page()?;
        let page = std::mem::take(&mut *self.buffer.0.borrow_mut());
        self.pages.push(page);
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        self.text.output_character(trm, width, spacing, font_size, char)
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        self.text.begin_word()
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        self.text.end_word()
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        self.text.end_line()
    }
}

fn render_pdf_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, OutputError> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let mut output = PagedTextOutput::new();
    pdf_extract::output_doc(&doc, &mut output)?;
    Ok(output.into_pages())
}

/// Extract trimmed page texts from PDF bytes, one entry per page.
///
/// Fails if the file is empty, cannot be parsed, or has no text at all.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>> {
    if bytes.is_empty() {
        return Err(ResumeAnalyzerError::InvalidInput("Resume file is empty".to_string()));
    }

    // pdf-extract panics on some malformed documents
    let pages = std::panic::catch_unwind(|| render_pdf_pages(bytes))
        .map_err(|_| ResumeAnalyzerError::PdfExtraction("PDF could not be parsed".to_string()))?
        .map_err(|e| ResumeAnalyzerError::PdfExtraction(format!("Failed to extract text from PDF: {}", e)))?;

    let pages: Vec<String> = pages.into_iter().map(|page| page.trim().to_string()).collect();

    if pages.iter().all(|page| page.is_empty()) {
        return Err(ResumeAnalyzerError::PdfExtraction(
            "No extractable text found in PDF".to_string(),
        ));
    }
    Ok(pages)
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = fs::read(path).await?;
        extract_pdf_pages(&bytes).map_err(|e| match e {
            ResumeAnalyzerError::PdfExtraction(msg) => {
                ResumeAnalyzerError::PdfExtraction(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path).await?;
        Ok(vec![content])
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(vec![markdown_to_text(&markdown_content)])
    }
}

/// Render markdown and strip it back down to plain lines
pub fn markdown_to_text(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    let text = html_output
        .replace("<br>", "\n")
        .replace("</p>", "\n\n")
        .replace("</li>", "\n");

    let clean_text = TAG_RE.replace_all(&text, "");

    let clean_text = clean_text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    clean_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
