//! Profile gap analysis: job description vs. resume, graded by the model.
//!
//! The result is returned to the caller and not persisted.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::CompletionGateway;
use crate::practice::evaluation::parse_model_object;
use crate::profile::prompts::{profile_analysis_prompt, PROFILE_SYSTEM};
use crate::profile::resources::youtube_search_url;

/// Shortest JD or resume text worth analyzing.
pub const MIN_PROFILE_TEXT_CHARS: usize = 40;
/// Cap on generated study links.
pub const MAX_STUDY_LINKS: usize = 25;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileAnalyzeRequest {
    pub jd_text: String,
    pub resume_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredSkill {
    pub name: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub evidence_in_jd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSuggestion {
    pub title: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub scope_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub weak: Vec<String>,
    #[serde(default)]
    pub suggested_projects: Vec<ProjectSuggestion>,
    #[serde(default)]
    pub ats_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityTopic {
    pub topic: String,
    #[serde(default)]
    pub why: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub estimated_days: u32,
    #[serde(default)]
    pub drill: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: u32,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRewrite {
    pub original: String,
    pub rewritten: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyLink {
    pub topic: String,
    pub url: String,
}

/// Structured gap analysis. Every list defaults to empty so a sparse model
/// reply still parses; scores are clamped by `normalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAnalysis {
    pub required_skills: Vec<RequiredSkill>,
    pub experience_expectations: Vec<String>,
    #[serde(deserialize_with = "lenient_score")]
    pub role_fit_score: i64,
    pub gap_report: GapReport,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub missing_topics: Vec<String>,
    pub priority_topics: Vec<PriorityTopic>,
    pub resume_gaps: Vec<String>,
    pub resume_improvements: Vec<String>,
    pub interview_plan_2_weeks: Vec<PlanDay>,
    pub project_suggestions: Vec<ProjectSuggestion>,
    pub ats_keywords_to_add: Vec<String>,
    pub summary: String,
    #[serde(deserialize_with = "lenient_score")]
    pub ats_score: i64,
    pub ats_warnings: Vec<String>,
    pub star_rewrites: Vec<StarRewrite>,
    /// Filled locally, never by the model.
    #[serde(skip_deserializing)]
    pub youtube_links: Vec<StudyLink>,
}

/// Accepts integer, float or null scores; non-finite and null become 0.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .unwrap_or(0))
}

impl ProfileAnalysis {
    /// Clamps scores and back-fills empty gap-report lists from the flat ones.
    pub fn normalize(&mut self) {
        self.role_fit_score = self.role_fit_score.clamp(0, 100);
        self.ats_score = self.ats_score.clamp(0, 100);

        let report = &mut self.gap_report;
        if report.missing.is_empty() {
            report.missing = self.missing_skills.clone();
        }
        if report.weak.is_empty() {
            report.weak = self.resume_gaps.clone();
        }
        if report.suggested_projects.is_empty() {
            report.suggested_projects = self.project_suggestions.clone();
        }
        if report.ats_keywords.is_empty() {
            report.ats_keywords = self.ats_keywords_to_add.clone();
        }
    }

    /// Study topics in priority order, de-duplicated case-insensitively.
    pub fn study_topics(&self) -> Vec<String> {
        let candidates = self
            .priority_topics
            .iter()
            .map(|t| t.topic.as_str())
            .chain(self.missing_topics.iter().map(String::as_str))
            .chain(self.required_skills.iter().map(|s| s.name.as_str()))
            .chain(self.experience_expectations.iter().map(String::as_str));

        let mut seen: Vec<String> = Vec::new();
        let mut topics = Vec::new();
        for topic in candidates.map(str::trim).filter(|t| !t.is_empty()) {
            let key = topic.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            topics.push(topic.to_string());
            if topics.len() == MAX_STUDY_LINKS {
                break;
            }
        }
        topics
    }
}

fn require_text<'a>(text: &'a str, field: &str) -> Result<&'a str, AppError> {
    let text = text.trim();
    if text.chars().count() < MIN_PROFILE_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be at least {MIN_PROFILE_TEXT_CHARS} characters"
        )));
    }
    Ok(text)
}

pub async fn analyze_profile(
    llm: &dyn CompletionGateway,
    request: ProfileAnalyzeRequest,
) -> Result<ProfileAnalysis, AppError> {
    let jd_text = require_text(&request.jd_text, "jd_text")?;
    let resume_text = require_text(&request.resume_text, "resume_text")?;

    let prompt = profile_analysis_prompt(jd_text, resume_text);
    let raw = llm.complete(PROFILE_SYSTEM, &prompt).await?;

    let mut analysis: ProfileAnalysis = parse_model_object(&raw, "profile analysis")?;
    analysis.normalize();
    analysis.youtube_links = analysis
        .study_topics()
        .into_iter()
        .map(|topic| {
            let url = youtube_search_url(&format!("{topic} interview prep"))?;
            Ok(StudyLink { topic, url })
        })
        .collect::<Result<_, AppError>>()?;

    info!(
        "Profile analysis: fit={}, ats={}, {} study links",
        analysis.role_fit_score,
        analysis.ats_score,
        analysis.youtube_links.len()
    );
    Ok(analysis)
}
