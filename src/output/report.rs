//! Report structures wrapping analysis results with run metadata

use crate::llm::analyzer::AnalysisResult;
use crate::llm::response::{AtsScore, ModelOutput, SkillList};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a command produced. Serialized untagged, so JSON output is the bare result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportBody {
    Analysis(AnalysisResult),
    Skills(ModelOutput<SkillList>),
    Ats(ModelOutput<AtsScore>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub analyzer_version: String,
    pub resume_file: String,
    pub job_file: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub processing_time_ms: u64,
}

impl ReportMetadata {
    pub fn new(resume_file: impl Into<String>, embedding_model: impl Into<String>, chat_model: impl Into<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            analyzer_version: env!("CARGO_PKG_VERSION").to_string(),
            resume_file: resume_file.into(),
            job_file: None,
            embedding_model: embedding_model.into(),
            chat_model: chat_model.into(),
            processing_time_ms: 0,
        }
    }

    pub fn with_job_file(mut self, job_file: impl Into<String>) -> Self {
        self.job_file = Some(job_file.into());
        self
    }

    pub fn with_processing_time(mut self, processing_time_ms: u64) -> Self {
        self.processing_time_ms = processing_time_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub body: ReportBody,
}

impl AnalysisReport {
    pub fn new(metadata: ReportMetadata, body: ReportBody) -> Self {
        Self { metadata, body }
    }

    /// Parsed ATS score, if the body carries one
    pub fn ats_score(&self) -> Option<&AtsScore> {
        match &self.body {
            ReportBody::Analysis(result) => result.ats_result.parsed(),
            ReportBody::Ats(output) => output.parsed(),
            ReportBody::Skills(_) => None,
        }
    }

    pub fn skills(&self) -> Option<&[String]> {
        match &self.body {
            ReportBody::Analysis(result) => Some(&result.extracted_skills),
            ReportBody::Skills(output) => output.parsed().map(|list| list.skills.as_slice()),
            ReportBody::Ats(_) => None,
        }
    }

    /// Raw model text for whichever reply could not be parsed
    pub fn raw_output(&self) -> Option<&str> {
        match &self.body {
            ReportBody::Analysis(AnalysisResult {
                ats_result: ModelOutput::Malformed { raw_output, .. },
                ..
            }) => Some(raw_output),
            ReportBody::Ats(ModelOutput::Malformed { raw_output, .. }) => Some(raw_output),
            ReportBody::Skills(ModelOutput::Malformed { raw_output, .. }) => Some(raw_output),
            _ => None,
        }
    }
}

/// Score rounded into 0..=100 for badges
pub fn score_percentage(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}
