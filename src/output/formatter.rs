//! Output formatters for console, JSON and markdown

use crate::config::OutputFormat;
use crate::error::{Result, ResumeAnalyzerError};
use crate::llm::response::{AtsScore, ModelOutput};
use crate::output::report::{score_percentage, AnalysisReport, ReportBody};
use colored::{Color, Colorize};
use std::path::{Path, PathBuf};

pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Picks the formatter for a requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

/// Suggestions shown outside detailed mode
const SUMMARY_SUGGESTIONS: usize = 3;

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_list(&self, output: &mut String, title: &str, items: &[String], color: Color) {
        if items.is_empty() {
            return;
        }
        output.push_str(&self.format_header(title, 3));
        for item in items {
            output.push_str(&format!("  • {}\n", self.colorize(item, color)));
        }
    }

    fn format_skills(&self, output: &mut String, skills: &[String]) {
        output.push_str(&self.format_header("🧰 Extracted Skills", 2));
        if skills.is_empty() {
            output.push_str(&format!("{}\n", self.colorize("No skills extracted", Color::BrightBlack)));
        } else {
            output.push_str(&format!("{}\n", self.colorize(&skills.join(", "), Color::Cyan)));
        }
    }

    fn format_ats(&self, output: &mut String, ats: &ModelOutput<AtsScore>) {
        match ats {
            ModelOutput::Parsed(score) => {
                output.push_str(&self.format_header("📊 ATS Evaluation", 2));
                let overall = score_percentage(score.ats_score);
                output.push_str(&format!(
                    "ATS Score: {}/100 {}\n",
                    overall,
                    self.format_score_badge(overall)
                ));

                output.push_str(&self.format_header("Score Breakdown", 3));
                output.push_str(&format!("🎯 Skills match: {:.0}\n", score.skills_match));
                output.push_str(&format!("💼 Experience relevance: {:.0}\n", score.experience_relevance));
                output.push_str(&format!("🔍 Tools & keywords: {:.0}\n", score.tools_and_keywords));
                output.push_str(&format!("✍️  Resume clarity: {:.0}\n", score.resume_clarity));

                self.format_list(output, "🚨 Missing Skills", &score.missing_skills, Color::Red);
                self.format_list(output, "⚠️  Weak Areas", &score.weak_areas, Color::Yellow);

                let suggestions = if self.detailed {
                    &score.suggestions[..]
                } else {
                    &score.suggestions[..score.suggestions.len().min(SUMMARY_SUGGESTIONS)]
                };
                self.format_list(output, "💡 Suggestions", suggestions, Color::Green);
            }
            ModelOutput::Malformed { error, raw_output } => {
                output.push_str(&self.format_header("📊 ATS Evaluation", 2));
                output.push_str(&format!("{}\n", self.colorize(error, Color::Red)));
                output.push_str(&format!("{}\n", raw_output));
            }
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📄 RESUME ANALYSIS", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));

        match &report.body {
            ReportBody::Analysis(result) => {
                self.format_skills(&mut output, &result.extracted_skills);
                self.format_ats(&mut output, &result.ats_result);
            }
            ReportBody::Skills(ModelOutput::Parsed(list)) => self.format_skills(&mut output, &list.skills),
            ReportBody::Skills(ModelOutput::Malformed { error, raw_output }) => {
                output.push_str(&self.format_header("🧰 Extracted Skills", 2));
                output.push_str(&format!("{}\n{}\n", self.colorize(error, Color::Red), raw_output));
            }
            ReportBody::Ats(ats) => self.format_ats(&mut output, ats),
        }

        if self.detailed {
            output.push_str(&self.format_header("Run Details", 3));
            output.push_str(&format!("Resume: {}\n", report.metadata.resume_file));
            if let Some(job) = &report.metadata.job_file {
                output.push_str(&format!("Job description: {}\n", job));
            }
            output.push_str(&format!("Embedding model: {}\n", report.metadata.embedding_model));
            output.push_str(&format!("Chat model: {}\n", report.metadata.chat_model));
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(&report.body)?)
        } else {
            Ok(serde_json::to_string(&report.body)?)
        }
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    fn markdown_list(output: &mut String, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        output.push_str(&format!("### {}\n\n", title));
        for item in items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }

    fn markdown_skills(output: &mut String, skills: &[String]) {
        output.push_str("## 🧰 Extracted Skills\n\n");
        if skills.is_empty() {
            output.push_str("_No skills extracted_\n\n");
        } else {
            let tagged: Vec<String> = skills.iter().map(|s| format!("`{}`", s)).collect();
            output.push_str(&format!("{}\n\n", tagged.join(" ")));
        }
    }

    fn markdown_malformed(output: &mut String, error: &str, raw_output: &str) {
        output.push_str(&format!("> **{}**\n\n", error));
        output.push_str("```text\n");
        output.push_str(raw_output);
        output.push_str("\n```\n\n");
    }

    fn markdown_ats(output: &mut String, ats: &ModelOutput<AtsScore>) {
        output.push_str("## 📊 ATS Evaluation\n\n");
        let score = match ats {
            ModelOutput::Parsed(score) => score,
            ModelOutput::Malformed { error, raw_output } => {
                Self::markdown_malformed(output, error, raw_output);
                return;
            }
        };

        let overall = score_percentage(score.ats_score);
        output.push_str(&format!(
            "**ATS Score:** {}/100 {}\n\n",
            overall,
            Self::markdown_score_badge(overall)
        ));

        output.push_str("| Component | Score |\n");
        output.push_str("|-----------|-------|\n");
        output.push_str(&format!("| 🎯 Skills match | {:.0} |\n", score.skills_match));
        output.push_str(&format!("| 💼 Experience relevance | {:.0} |\n", score.experience_relevance));
        output.push_str(&format!("| 🔍 Tools & keywords | {:.0} |\n", score.tools_and_keywords));
        output.push_str(&format!("| ✍️ Resume clarity | {:.0} |\n", score.resume_clarity));
        output.push('\n');

        Self::markdown_list(output, "🚨 Missing Skills", &score.missing_skills);
        Self::markdown_list(output, "⚠️ Weak Areas", &score.weak_areas);
        Self::markdown_list(output, "💡 Suggestions", &score.suggestions);
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# 📄 Resume Analysis Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.processing_time_ms
            ));
            output.push_str(&format!("**Resume:** `{}`", display_name(&report.metadata.resume_file)));
            if let Some(job) = &report.metadata.job_file {
                output.push_str(&format!(" | **Job:** `{}`", display_name(job)));
            }
            output.push_str("\n\n");
        }

        match &report.body {
            ReportBody::Analysis(result) => {
                Self::markdown_skills(&mut output, &result.extracted_skills);
                Self::markdown_ats(&mut output, &result.ats_result);
            }
            ReportBody::Skills(ModelOutput::Parsed(list)) => Self::markdown_skills(&mut output, &list.skills),
            ReportBody::Skills(ModelOutput::Malformed { error, raw_output }) => {
                output.push_str("## 🧰 Extracted Skills\n\n");
                Self::markdown_malformed(&mut output, error, raw_output);
            }
            ReportBody::Ats(ats) => Self::markdown_ats(&mut output, ats),
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Models: {} (embeddings), {} (chat) | resume-analyzer v{}*\n",
                report.metadata.embedding_model, report.metadata.chat_model, report.metadata.analyzer_version
            ));
        }

        Ok(output)
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true)
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content).map_err(|e| {
        ResumeAnalyzerError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })
}

/// `target` itself, or a suggested file name inside it when `target` is a directory
pub fn report_file_path(target: &Path, format: &OutputFormat, resume_name: &str) -> PathBuf {
    if target.is_dir() {
        target.join(suggest_filename(format, resume_name, true))
    } else {
        target.to_path_buf()
    }
}

pub fn suggest_filename(format: &OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_analysis{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_analysis{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_analysis{}.md", base_name, timestamp_suffix),
    }
}
