//! CLI interface for the resume analyzer

use crate::config::OutputFormat;
use crate::error::Result as AnalyzerResult;
use crate::input::InputKind;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-analyzer")]
#[command(about = "Retrieval-augmented resume analysis against job descriptions")]
#[command(long_about = "Chunk and index a resume, retrieve the passages relevant to a job description, and ask an LLM for extracted skills and an ATS fit score")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// How to read the resume file: auto, pdf, text
    #[arg(long, global = true, default_value = "auto")]
    pub input_type: String,
}

impl Cli {
    /// Parsed `--input-type`. Only commands that read a resume call this.
    pub fn input_kind(&self) -> AnalyzerResult<InputKind> {
        self.input_type.parse()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract skills and score the resume against a job description
    Analyze {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD), or "-" for stdin
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file, or into a directory under a generated name
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show every suggestion and run details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract skills only
    Skills {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,
    },

    /// ATS score only
    Evaluate {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD), or "-" for stdin
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Persistent vector index commands
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Interactive ATS review over a persisted index
    Chat {
        /// Index directory (defaults to retrieval.index_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Chunk, embed and save a resume index
    Build {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Index directory (defaults to retrieval.index_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Retrieve the chunks nearest to a query
    Query {
        /// Query text
        #[arg(short, long)]
        query: String,

        /// Number of chunks to return (defaults to retrieval.top_k)
        #[arg(short)]
        k: Option<usize>,

        /// Index directory (defaults to retrieval.index_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

/// Whether a job path argument means "read from stdin"
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}
