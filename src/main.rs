//! resume-analyzer: retrieval-augmented resume analysis against job descriptions

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use resume_analyzer::cli::{self, Cli, Commands, ConfigAction, IndexAction};
use resume_analyzer::config::{Config, EmbeddingBackend, OutputFormat};
use resume_analyzer::error::{Result, ResumeAnalyzerError};
use resume_analyzer::input::InputManager;
use resume_analyzer::llm::gemini::GeminiClient;
use resume_analyzer::llm::{AnalyzerSettings, ChatModel, ResumeAnalyzer};
use resume_analyzer::output::formatter::{report_file_path, save_report_to_file};
use resume_analyzer::output::{AnalysisReport, ReportBody, ReportGenerator, ReportMetadata};
use resume_analyzer::processing::document::make_chunks;
use resume_analyzer::processing::embeddings::{Embedding, EmbeddingProvider};
use resume_analyzer::processing::retriever::Retriever;
use resume_analyzer::processing::vector_index::VectorIndex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

#[cfg(feature = "model2vec")]
use resume_analyzer::processing::embeddings::Model2VecEmbedder;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(if e.is_client_error() { 2 } else { 1 });
    }
}

/// Embedding backend picked from `provider.embedding_backend`
enum Embedder {
    Gemini(GeminiClient),
    #[cfg(feature = "model2vec")]
    Local(Model2VecEmbedder),
}

impl EmbeddingProvider for Embedder {
    fn model_name(&self) -> &str {
        match self {
            Embedder::Gemini(client) => EmbeddingProvider::model_name(client),
            #[cfg(feature = "model2vec")]
            Embedder::Local(model) => model.model_name(),
        }
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        match self {
            Embedder::Gemini(client) => client.embed_documents(texts).await,
            #[cfg(feature = "model2vec")]
            Embedder::Local(model) => model.embed_documents(texts).await,
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        match self {
            Embedder::Gemini(client) => client.embed_query(text).await,
            #[cfg(feature = "model2vec")]
            Embedder::Local(model) => model.embed_query(text).await,
        }
    }
}

fn build_embedder(config: &Config) -> Result<Embedder> {
    match config.provider.embedding_backend {
        EmbeddingBackend::Gemini => Ok(Embedder::Gemini(GeminiClient::from_config(config)?)),
        #[cfg(feature = "model2vec")]
        EmbeddingBackend::Model2Vec => Ok(Embedder::Local(Model2VecEmbedder::from_pretrained(
            &config.provider.model2vec_model,
        )?)),
        #[cfg(not(feature = "model2vec"))]
        EmbeddingBackend::Model2Vec => Err(ResumeAnalyzerError::Configuration(
            "embedding_backend = \"model2vec\" requires building with --features model2vec".to_string(),
        )),
    }
}

fn build_analyzer(config: &Config) -> Result<ResumeAnalyzer<Embedder, GeminiClient>> {
    let chat = GeminiClient::from_config(config)?;
    let embedder = build_embedder(config)?;
    Ok(ResumeAnalyzer::new(embedder, chat, AnalyzerSettings::from_config(config)))
}

async fn run_command(cli: Cli, config: Config, config_path: PathBuf) -> Result<()> {
    let input_kind = cli.input_kind();
    let mut input_manager = InputManager::new();

    match cli.command {
        Commands::Analyze {
            resume,
            job,
            output,
            save,
            detailed,
        } => {
            let format = resolve_format(output.as_deref(), &config)?;
            let input_kind = input_kind?;
            let job_text = read_job_description(&job, &mut input_manager).await?;
            let resume_input = input_manager.load_resume(&resume, input_kind).await?;

            info!("Starting resume analysis");
            let start_time = Instant::now();
            let analyzer = build_analyzer(&config)?;
            let result = analyzer.analyze_input(resume_input, &job_text).await?;

            let metadata = report_metadata(&analyzer, &resume, start_time).with_job_file(job.display().to_string());
            let report = AnalysisReport::new(metadata, ReportBody::Analysis(result));
            emit_report(&report, format, &config, detailed, save.as_deref())?;
        }

        Commands::Skills { resume, output } => {
            let format = resolve_format(output.as_deref(), &config)?;
            let resume_input = input_manager.load_resume(&resume, input_kind?).await?;

            let start_time = Instant::now();
            let analyzer = build_analyzer(&config)?;
            let skills = analyzer.extract_skills_input(resume_input).await?;

            let metadata = report_metadata(&analyzer, &resume, start_time);
            let report = AnalysisReport::new(metadata, ReportBody::Skills(skills));
            emit_report(&report, format, &config, false, None)?;
        }

        Commands::Evaluate { resume, job, output } => {
            let format = resolve_format(output.as_deref(), &config)?;
            let input_kind = input_kind?;
            let job_text = read_job_description(&job, &mut input_manager).await?;
            let resume_input = input_manager.load_resume(&resume, input_kind).await?;

            let start_time = Instant::now();
            let analyzer = build_analyzer(&config)?;
            let ats = analyzer.evaluate_ats_input(resume_input, &job_text).await?;

            let metadata = report_metadata(&analyzer, &resume, start_time).with_job_file(job.display().to_string());
            let report = AnalysisReport::new(metadata, ReportBody::Ats(ats));
            emit_report(&report, format, &config, false, None)?;
        }

        Commands::Index { action } => match action {
            IndexAction::Build { resume, dir } => {
                let dir = dir.unwrap_or_else(|| config.retrieval.index_dir.clone());
                let pages = input_manager.load_resume(&resume, input_kind?).await?.into_pages()?;

                let settings = AnalyzerSettings::from_config(&config);
                let chunks = make_chunks(&pages, &settings.chunker)?;
                info!("Resume split into {} chunks across {} pages", chunks.len(), pages.len());

                let embedder = build_embedder(&config)?;
                let spinner = spinner(&format!("Embedding {} chunks...", chunks.len()));
                let built = VectorIndex::build(chunks, &embedder, settings.metric).await;
                spinner.finish_and_clear();

                let index = built?;
                index.save(&dir)?;
                println!(
                    "✅ Indexed {} chunks ({} dimensions) into {}",
                    index.len(),
                    index.dimension(),
                    dir.display()
                );
            }

            IndexAction::Query { query, k, dir } => {
                let dir = dir.unwrap_or_else(|| config.retrieval.index_dir.clone());
                let index = VectorIndex::load(&dir)?;
                let embedder = build_embedder(&config)?;
                index.check_model(&embedder);

                let retriever = Retriever::new(&index, &embedder, k.unwrap_or(config.retrieval.top_k));
                let results = retriever.retrieve_scored(&query).await?;

                println!("🔍 {} nearest chunks for \"{}\":\n", results.len(), query);
                for (i, scored) in results.iter().enumerate() {
                    println!(
                        "{}. [page {}, distance {:.4}] {}",
                        i + 1,
                        scored.chunk.page,
                        scored.distance,
                        truncate_text(&scored.chunk.text, 200)
                    );
                }
            }
        },

        Commands::Chat { dir } => {
            let dir = dir.unwrap_or_else(|| config.retrieval.index_dir.clone());
            let index = VectorIndex::load(&dir)?;
            let analyzer = build_analyzer(&config)?;
            index.check_model(analyzer.embedder());
            info!("Loaded index with {} chunks from {}", index.len(), dir.display());

            println!("💬 Paste a job description per line for an ATS review. Type 'exit' to quit.");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                print!("\n💼 Job description> ");
                std::io::stdout().flush()?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let job_description = line.trim();
                if job_description.is_empty() {
                    continue;
                }
                if matches!(job_description.to_lowercase().as_str(), "exit" | "quit") {
                    break;
                }

                match analyzer.review(&index, job_description).await {
                    Ok(review) => println!("\n{}", review),
                    Err(e) => error!("Review failed: {}", e),
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration ({})\n", config_path.display());
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to render configuration: {}", e)))?;
                println!("{}", rendered);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(&config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

fn resolve_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(ResumeAnalyzerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

async fn read_job_description(path: &Path, input_manager: &mut InputManager) -> Result<String> {
    if cli::is_stdin(path) {
        debug!("Reading job description from stdin");
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    cli::validate_file_extension(path, &["txt", "md", "markdown"])
        .map_err(ResumeAnalyzerError::UnsupportedFormat)?;
    input_manager.extract_text(path).await
}

fn report_metadata<E: EmbeddingProvider, C: ChatModel>(
    analyzer: &ResumeAnalyzer<E, C>,
    resume: &Path,
    start_time: Instant,
) -> ReportMetadata {
    ReportMetadata::new(
        resume.display().to_string(),
        analyzer.embedder().model_name(),
        analyzer.chat().model_name(),
    )
    .with_processing_time(start_time.elapsed().as_millis() as u64)
}

fn emit_report(
    report: &AnalysisReport,
    format: OutputFormat,
    config: &Config,
    detailed: bool,
    save: Option<&Path>,
) -> Result<()> {
    let use_colors = config.output.color_output && save.is_none();
    let generator = ReportGenerator::with_options(use_colors, config.output.detailed || detailed, true, true);
    let content = generator.generate_report(report, &format)?;

    match save {
        Some(target) => {
            let path = report_file_path(target, &format, &report.metadata.resume_file);
            save_report_to_file(&content, &path)?;
            println!("💾 Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(message.to_string());
    pb
}

/// Truncate text to a maximum length with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    }
}
