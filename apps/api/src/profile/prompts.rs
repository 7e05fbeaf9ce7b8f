//! Prompt templates for resume gap analysis and study roadmaps.

use crate::llm_client::prompts::fill_template;

pub const PROFILE_SYSTEM: &str = "You are a senior recruiter + interview coach. Return JSON only.";

pub const PROFILE_ANALYSIS_TEMPLATE: &str = r#"You are a senior tech recruiter + interview coach.

Task:
Analyze the JOB DESCRIPTION and the CANDIDATE RESUME.
Produce a skill-gap analysis, role-fit score, and a study plan to help the candidate crack interviews.

Hard rules:
- Return VALID JSON ONLY (no markdown).
- Be specific and actionable.
- Prefer concrete topic names (e.g., 'SQL joins', 'React hooks', 'System design: caching', 'DSA: two pointers').
- If you infer something, mark it as an inference.

Return JSON with exactly these keys (no extra keys):

1) required_skills: {name: string, importance: "must"|"good_to_have", evidence_in_jd: string}[]
   - evidence_in_jd is a short quote or paraphrase from the JD that proves why this skill is required.
2) experience_expectations: string[]
   - Concrete expectations from the JD (years, ownership, architecture scale, leadership, etc.)
3) role_fit_score: number
   - 0-100. Base it on overlap of required_skills + experience_expectations with the resume.
4) gap_report: {missing: string[], weak: string[], suggested_projects: {title: string, stack: string[], why: string, scope_days: number}[], ats_keywords: string[]}
   - missing = required skills not present in resume
   - weak = mentioned but insufficient depth/evidence
5) matched_skills: string[]
6) missing_skills: string[]
7) missing_topics: string[]
8) priority_topics: {topic: string, why: string, difficulty: "easy"|"medium"|"hard", estimated_days: number, drill: string}[]
9) resume_gaps: string[]
10) resume_improvements: string[]
11) interview_plan_2_weeks: {day: number, focus: string, tasks: string[]}[]
12) project_suggestions: {title: string, stack: string[], why: string, scope_days: number}[]
13) ats_keywords_to_add: string[]
14) summary: string
15) ats_score: number (0-100, ATS readability, formatting and keyword optimization)
16) ats_warnings: string[] (formatting or keyword issues that might hurt ATS parsing)
17) star_rewrites: {original: string, rewritten: string, reasoning: string}[]
    - Pick the 3 weakest resume bullet points and rewrite them with the STAR method.

JOB DESCRIPTION:
{jd_text}

CANDIDATE RESUME:
{resume_text}"#;

pub const ROADMAP_SYSTEM: &str = r#"You are an interview coach. Create a concise study roadmap.
Return STRICT JSON only. No markdown.
Schema:
{
  "title": string,
  "duration_days": number,
  "two_week_plan": string,
  "micro_tasks": [
    {
      "topic": string,
      "drill_prompt": string,
      "resources": string[],
      "expected_output": string
    }
  ]
}
Rules:
- resources MUST include YouTube search links (youtube.com/results?search_query=...)
- Cover the weak topics first when any are given.
- Without a session, plan from the profile's track, level and role.
- If Backend: focus SQL, DSA, System Design.
- If Frontend: focus React, Next.js, TypeScript, Web performance, Testing.
- If Fullstack: include both."#;

pub fn profile_analysis_prompt(jd_text: &str, resume_text: &str) -> String {
    fill_template(
        PROFILE_ANALYSIS_TEMPLATE,
        &[
            ("jd_text", jd_text.trim()),
            ("resume_text", resume_text.trim()),
        ],
    )
}

/// Roadmap user prompt: the serialized planning context.
pub fn roadmap_prompt(context: &serde_json::Value) -> String {
    format!("Context:\n{context}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_prompt_embeds_trimmed_texts() {
        let prompt = profile_analysis_prompt("  Rust backend role  ", "\nFive years of Go\n");
        assert!(prompt.contains("JOB DESCRIPTION:\nRust backend role\n"));
        assert!(prompt.ends_with("CANDIDATE RESUME:\nFive years of Go"));
    }

    #[test]
    fn test_roadmap_prompt_serializes_context() {
        let prompt = roadmap_prompt(&serde_json::json!({"duration_days": 14}));
        assert_eq!(prompt, "Context:\n{\"duration_days\":14}");
    }
}
