//! Prompt templates for skill extraction and ATS scoring

use crate::config::ScoringConfig;

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub skill_extraction: String,
    pub ats_scoring: String,
    pub ats_review: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            skill_extraction: SKILL_EXTRACTION_TEMPLATE.to_string(),
            ats_scoring: ATS_SCORING_TEMPLATE.to_string(),
            ats_review: ATS_REVIEW_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn render_skill_extraction(&self, context: &str) -> String {
        self.skill_extraction.replace("{context}", context)
    }

    pub fn render_ats_scoring(
        &self,
        context: &str,
        skills: &[String],
        job_description: &str,
        weights: &ScoringConfig,
    ) -> String {
        let skills = if skills.is_empty() {
            "(none extracted)".to_string()
        } else {
            skills.join(", ")
        };

        Self::apply_weights(&self.ats_scoring, weights)
            .replace("{context}", context)
            .replace("{skills}", &skills)
            .replace("{job_description}", job_description.trim())
    }

    pub fn render_ats_review(&self, context: &str, job_description: &str, weights: &ScoringConfig) -> String {
        Self::apply_weights(&self.ats_review, weights)
            .replace("{context}", context)
            .replace("{job_description}", job_description.trim())
    }

    fn apply_weights(template: &str, weights: &ScoringConfig) -> String {
        template
            .replace("{skills_weight}", &weights.skills_match_weight.to_string())
            .replace("{experience_weight}", &weights.experience_relevance_weight.to_string())
            .replace("{tools_weight}", &weights.tools_keywords_weight.to_string())
            .replace("{clarity_weight}", &weights.clarity_weight.to_string())
    }
}

const SKILL_EXTRACTION_TEMPLATE: &str = r#"You extract skills from resumes.

List every technical skill, tool, framework, language and platform that appears in the resume content below.
Only include skills that are explicitly written in the content. Do not infer or add anything else.

Resume Content:
{context}

Respond with ONLY a JSON object in exactly this form:
{"skills": ["skill1", "skill2"]}"#;

const ATS_SCORING_TEMPLATE: &str = r#"You are an ATS (Applicant Tracking System) evaluator.

Compare the resume content strictly against the job description. Do NOT use external knowledge.
If something is missing from the resume content, treat it as missing.

Resume Content:
{context}

Skills already extracted from the resume: {skills}

Job Description:
{job_description}

Scoring Rules (each sub-score is 0-100; ats_score is the weighted total):
- Skills match: {skills_weight}%
- Experience relevance: {experience_weight}%
- Tools & keywords: {tools_weight}%
- Resume clarity & impact: {clarity_weight}%

Respond with ONLY a JSON object in exactly this form:
{
  "ats_score": 0,
  "skills_match": 0,
  "experience_relevance": 0,
  "tools_and_keywords": 0,
  "resume_clarity": 0,
  "missing_skills": ["..."],
  "weak_areas": ["..."],
  "suggestions": ["..."]
}"#;

const ATS_REVIEW_TEMPLATE: &str = r#"You are an ATS (Applicant Tracking System) evaluator.

Your task:
- Analyze the resume content provided below
- Compare it strictly against the given Job Description
- Identify missing skills, tools, and experience
- Suggest improvements
- Provide an ATS compatibility score from 0 to 100

Resume Content:
{context}

Job Description: {job_description}

Output Format:
- ATS Score: XX/100
- Missing Skills:
- Weak Areas:
- Suggestions to Improve Resume:

Scoring Rules:
- Skills match: {skills_weight}%
- Experience relevance: {experience_weight}%
- Tools & keywords: {tools_weight}%
- Resume clarity & impact: {clarity_weight}%

Explain briefly how each category contributed to the final score.
NOTE: Do NOT use external knowledge. If something is missing from the resume context, mark it as missing."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_skill_prompt_contains_context() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_skill_extraction("Python, AWS, Docker.");
        assert!(prompt.contains("Python, AWS, Docker."));
        assert!(prompt.contains("{\"skills\""));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_scoring_prompt_quotes_weights() {
        let templates = PromptTemplates::default();
        let weights = Config::default().scoring;
        let skills = vec!["Python".to_string(), "AWS".to_string()];

        let prompt = templates.render_ats_scoring("resume text", &skills, "  Backend role  ", &weights);
        assert!(prompt.contains("Skills match: 40%"));
        assert!(prompt.contains("Experience relevance: 30%"));
        assert!(prompt.contains("Tools & keywords: 20%"));
        assert!(prompt.contains("Resume clarity & impact: 10%"));
        assert!(prompt.contains("Python, AWS"));
        assert!(prompt.contains("Job Description:\nBackend role\n"));
        for placeholder in ["{context}", "{skills}", "{job_description}", "{skills_weight}", "{clarity_weight}"] {
            assert!(!prompt.contains(placeholder), "unreplaced {}", placeholder);
        }
    }

    #[test]
    fn test_scoring_prompt_without_skills() {
        let templates = PromptTemplates::default();
        let weights = Config::default().scoring;
        let prompt = templates.render_ats_scoring("ctx", &[], "job", &weights);
        assert!(prompt.contains("(none extracted)"));
    }

    #[test]
    fn test_review_prompt_rendering() {
        let templates = PromptTemplates::default();
        let weights = Config::default().scoring;
        let prompt = templates.render_ats_review("Rust at Acme", "Rust engineer", &weights);
        assert!(prompt.contains("Rust at Acme"));
        assert!(prompt.contains("Job Description: Rust engineer"));
        assert!(prompt.contains("ATS Score: XX/100"));
    }
}
