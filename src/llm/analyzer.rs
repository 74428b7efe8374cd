//! Retrieval-augmented resume analysis: chunk, index, retrieve, prompt, parse

use crate::config::{Config, ScoringConfig};
use crate::error::{Result, ResumeAnalyzerError};
use crate::input::ResumeInput;
use crate::llm::inference::ChatModel;
use crate::llm::prompts::PromptTemplates;
use crate::llm::response::{parse_model_output, AtsScore, ModelOutput, SkillList};
use crate::processing::document::{make_chunks, ChunkerConfig};
use crate::processing::embeddings::EmbeddingProvider;
use crate::processing::retriever::{join_context, Retriever};
use crate::processing::vector_index::{DistanceMetric, VectorIndex};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Final output of a combined skills + scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub extracted_skills: Vec<String>,
    pub ats_result: ModelOutput<AtsScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub chunker: ChunkerConfig,
    pub top_k: usize,
    /// Query used to pull skill-bearing chunks when there is no job description
    pub skills_probe_query: String,
    pub metric: DistanceMetric,
    pub scoring: ScoringConfig,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AnalyzerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunker: ChunkerConfig {
                chunk_size: config.processing.chunk_size,
                chunk_overlap: config.processing.chunk_overlap,
                source_label: config.processing.source_label.clone(),
            },
            top_k: config.retrieval.top_k,
            skills_probe_query: config.retrieval.skills_probe_query.clone(),
            metric: config.retrieval.metric,
            scoring: config.scoring.clone(),
        }
    }
}

/// Runs the analysis pipeline against injected embedding and chat backends.
///
/// Holds no per-request state; every call builds and drops its own index.
pub struct ResumeAnalyzer<E: EmbeddingProvider, C: ChatModel> {
    embedder: E,
    chat: C,
    prompts: PromptTemplates,
    settings: AnalyzerSettings,
}

impl<E: EmbeddingProvider, C: ChatModel> ResumeAnalyzer<E, C> {
    pub fn new(embedder: E, chat: C, settings: AnalyzerSettings) -> Self {
        Self {
            embedder,
            chat,
            prompts: PromptTemplates::default(),
            settings,
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Skills only, retrieved with the probe query
    pub async fn extract_skills(&self, resume_text: &str) -> Result<ModelOutput<SkillList>> {
        let resume_text = validate_resume(resume_text)?;
        let index = self.build_index(resume_text).await?;
        let context = self.context_for(&index, &self.settings.skills_probe_query).await?;
        self.run_skill_extraction(&context).await
    }

    /// Score only. Skills are still extracted first since they feed the scoring prompt.
    pub async fn evaluate_ats(&self, resume_text: &str, job_description: &str) -> Result<ModelOutput<AtsScore>> {
        Ok(self.analyze(resume_text, job_description).await?.ats_result)
    }

    /// Skills and score from one index
    pub async fn analyze(&self, resume_text: &str, job_description: &str) -> Result<AnalysisResult> {
        let job_description = validate_job_description(job_description)?;
        let resume_text = validate_resume(resume_text)?;

        let index = self.build_index(resume_text).await?;

        let skills_context = self.context_for(&index, &self.settings.skills_probe_query).await?;
        let extracted_skills = match self.run_skill_extraction(&skills_context).await? {
            ModelOutput::Parsed(list) => list.skills,
            ModelOutput::Malformed { .. } => {
                warn!("Skill extraction reply was not valid JSON; scoring without extracted skills");
                Vec::new()
            }
        };

        let job_context = self.context_for(&index, job_description).await?;
        let ats_result = self.run_scoring(&job_context, &extracted_skills, job_description).await?;

        Ok(AnalysisResult {
            extracted_skills,
            ats_result,
        })
    }

    pub async fn extract_skills_input(&self, input: ResumeInput) -> Result<ModelOutput<SkillList>> {
        let resume_text = input.into_text()?;
        self.extract_skills(&resume_text).await
    }

    pub async fn evaluate_ats_input(&self, input: ResumeInput, job_description: &str) -> Result<ModelOutput<AtsScore>> {
        Ok(self.analyze_input(input, job_description).await?.ats_result)
    }

    /// Like [`ResumeAnalyzer::analyze`]; the job description is checked before the PDF is touched
    pub async fn analyze_input(&self, input: ResumeInput, job_description: &str) -> Result<AnalysisResult> {
        validate_job_description(job_description)?;
        let resume_text = input.into_text()?;
        self.analyze(&resume_text, job_description).await
    }

    /// Free-form ATS review over an already built index
    pub async fn review(&self, index: &VectorIndex, job_description: &str) -> Result<String> {
        let job_description = validate_job_description(job_description)?;
        let context = self.context_for(index, job_description).await?;
        let prompt = self
            .prompts
            .render_ats_review(&context, job_description, &self.settings.scoring);
        let reply = self.chat.generate(&prompt).await?;

        info!("Review generated in {}ms", reply.inference_time_ms);
        Ok(reply.text)
    }

    /// Chunk the resume as a single page and index it
    pub async fn build_index(&self, resume_text: &str) -> Result<VectorIndex> {
        let chunks = make_chunks(&[resume_text], &self.settings.chunker)?;
        info!("Resume split into {} chunks", chunks.len());
        VectorIndex::build(chunks, &self.embedder, self.settings.metric).await
    }

    async fn context_for(&self, index: &VectorIndex, query: &str) -> Result<String> {
        let retriever = Retriever::new(index, &self.embedder, self.settings.top_k);
        let chunks = retriever.retrieve(query).await?;
        debug!("Retrieved {} chunks for context", chunks.len());
        Ok(join_context(&chunks))
    }

    async fn run_skill_extraction(&self, context: &str) -> Result<ModelOutput<SkillList>> {
        info!("Extracting skills with {}", self.chat.model_name());
        let prompt = self.prompts.render_skill_extraction(context);
        let reply = self.chat.generate(&prompt).await?;
        Ok(parse_model_output(&reply.text))
    }

    async fn run_scoring(
        &self,
        context: &str,
        skills: &[String],
        job_description: &str,
    ) -> Result<ModelOutput<AtsScore>> {
        info!("Scoring resume against job description with {}", self.chat.model_name());
        let prompt = self
            .prompts
            .render_ats_scoring(context, skills, job_description, &self.settings.scoring);
        let reply = self.chat.generate(&prompt).await?;
        Ok(parse_model_output(&reply.text))
    }
}

fn validate_resume(resume_text: &str) -> Result<&str> {
    let trimmed = resume_text.trim();
    if trimmed.is_empty() {
        return Err(ResumeAnalyzerError::InvalidInput("Resume text cannot be empty".to_string()));
    }
    Ok(trimmed)
}

fn validate_job_description(job_description: &str) -> Result<&str> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(ResumeAnalyzerError::InvalidInput("Job description cannot be empty".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEmbedder, ScriptedChat};

    const RESUME: &str = "Python, AWS, Docker. 3 years backend experience.";

    const SCORE_REPLY: &str = r#"```json
{"ats_score": 78, "skills_match": 85, "experience_relevance": 70, "tools_and_keywords": 80,
 "resume_clarity": 65, "missing_skills": ["Kubernetes"], "weak_areas": ["Metrics"],
 "suggestions": ["Quantify impact"]}
```"#;

    fn analyzer(replies: Vec<&str>) -> ResumeAnalyzer<FakeEmbedder, ScriptedChat> {
        ResumeAnalyzer::new(FakeEmbedder::new(), ScriptedChat::new(replies), AnalyzerSettings::default())
    }

    #[tokio::test]
    async fn test_extract_skills_from_short_resume() {
        let analyzer = analyzer(vec![r#"{"skills": ["Python", "AWS", "Docker"]}"#]);

        let output = analyzer.extract_skills(RESUME).await.unwrap();
        let skills = output.into_parsed().unwrap().skills;
        assert_eq!(skills, vec!["Python", "AWS", "Docker"]);

        let prompts = analyzer.chat().prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(RESUME));
        assert_eq!(analyzer.embedder().document_calls(), 1);
        assert_eq!(analyzer.embedder().query_calls(), 1);
    }

    #[tokio::test]
    async fn test_analyze_runs_skills_before_scoring() {
        let analyzer = analyzer(vec![r#"{"skills": ["Python", "AWS"]}"#, SCORE_REPLY]);

        let result = analyzer.analyze(RESUME, "Backend engineer with Python and Kubernetes").await.unwrap();
        assert_eq!(result.extracted_skills, vec!["Python", "AWS"]);

        let score = result.ats_result.parsed().unwrap();
        assert_eq!(score.ats_score, 78.0);
        assert_eq!(score.missing_skills, vec!["Kubernetes"]);

        let prompts = analyzer.chat().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("\"skills\""));
        assert!(prompts[1].contains("Skills already extracted from the resume: Python, AWS"));
        assert!(prompts[1].contains("Backend engineer with Python and Kubernetes"));
        // one index, two retrievals
        assert_eq!(analyzer.embedder().document_calls(), 1);
        assert_eq!(analyzer.embedder().query_calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_job_description_rejected_before_any_work() {
        let analyzer = analyzer(vec![]);

        for job in ["", "   \n\t"] {
            let result = analyzer.analyze(RESUME, job).await;
            assert!(matches!(result, Err(ResumeAnalyzerError::InvalidInput(_))));

            let result = analyzer.evaluate_ats(RESUME, job).await;
            assert!(matches!(result, Err(ResumeAnalyzerError::InvalidInput(_))));
        }
        assert_eq!(analyzer.embedder().total_calls(), 0);
        assert!(analyzer.chat().prompts().is_empty());
    }

    #[tokio::test]
    async fn test_blank_job_checked_before_pdf_extraction() {
        let analyzer = analyzer(vec![]);
        let result = analyzer.analyze_input(ResumeInput::Pdf(b"not a pdf".to_vec()), " ").await;
        match result {
            Err(ResumeAnalyzerError::InvalidInput(msg)) => assert!(msg.contains("Job description")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_resume_rejected() {
        let analyzer = analyzer(vec![]);
        let result = analyzer.extract_skills("  \n ").await;
        assert!(matches!(result, Err(ResumeAnalyzerError::InvalidInput(_))));
        assert_eq!(analyzer.embedder().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_prose_skill_reply_degrades_to_empty_skills() {
        let analyzer = analyzer(vec!["The candidate knows Python.", SCORE_REPLY]);

        let result = analyzer.analyze(RESUME, "Python developer").await.unwrap();
        assert!(result.extracted_skills.is_empty());
        assert!(!result.ats_result.is_malformed());
        assert!(analyzer.chat().prompts()[1].contains("(none extracted)"));
    }

    #[tokio::test]
    async fn test_prose_score_reply_becomes_error_object() {
        let prose = "I would rate this resume around 70 out of 100.";
        let analyzer = analyzer(vec![r#"{"skills": ["Python"]}"#, prose]);

        let ats = analyzer.evaluate_ats(RESUME, "Python developer").await.unwrap();
        assert_eq!(ats, ModelOutput::malformed(prose));
    }

    #[tokio::test]
    async fn test_text_input_variant() {
        let analyzer = analyzer(vec![r#"{"skills": ["Go"]}"#]);
        let output = analyzer
            .extract_skills_input(ResumeInput::Text("Go and gRPC services".to_string()))
            .await
            .unwrap();
        assert_eq!(output.into_parsed().unwrap().skills, vec!["Go"]);
    }

    #[tokio::test]
    async fn test_probe_query_is_configurable() {
        let mut settings = AnalyzerSettings::default();
        settings.skills_probe_query = "languages frameworks".to_string();
        settings.top_k = 1;
        settings.chunker = ChunkerConfig::new(40, 5, "resume.pdf").unwrap();

        let resume = "Education: BSc Physics from a small college. Languages frameworks: Rust, Axum, Tokio.";
        let analyzer = ResumeAnalyzer::new(
            FakeEmbedder::new(),
            ScriptedChat::new(vec![r#"{"skills": ["Rust"]}"#]),
            settings,
        );

        analyzer.extract_skills(resume).await.unwrap();
        let prompt = &analyzer.chat().prompts()[0];
        assert!(prompt.contains("frameworks"));
    }

    #[tokio::test]
    async fn test_review_over_prebuilt_index() {
        let analyzer = analyzer(vec!["- ATS Score: 64/100"]);
        let index = analyzer.build_index(RESUME).await.unwrap();

        let review = analyzer.review(&index, "Data engineer").await.unwrap();
        assert_eq!(review, "- ATS Score: 64/100");
        assert!(analyzer.chat().prompts()[0].contains("Job Description: Data engineer"));
    }

    #[tokio::test]
    async fn test_repeated_reviews_skip_model_check() {
        let analyzer = analyzer(vec!["first", "second", "third"]);
        let index = analyzer.build_index(RESUME).await.unwrap();
        let lookups = analyzer.embedder().name_lookups();

        for job in ["Data engineer", "Backend developer", "SRE"] {
            analyzer.review(&index, job).await.unwrap();
        }

        assert_eq!(analyzer.embedder().name_lookups(), lookups);
        assert_eq!(analyzer.embedder().query_calls(), 3);
    }
}
