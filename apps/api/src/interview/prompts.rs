// Prompt templates for the mock-interview driver.

use crate::llm_client::prompts::{fill_template, rubric_schema, RUBRIC};
use crate::models::conversation::ConversationTurn;
use crate::practice::taxonomy::{Difficulty, InterviewType};

pub const INTERVIEWER_SYSTEM: &str =
    "You are a professional interviewer. Generate interview questions only.";
pub const INTERVIEW_EVALUATOR_SYSTEM: &str =
    "You are a strict interview evaluator. Return JSON only.";

/// Turns of history replayed into a follow-up prompt.
pub const HISTORY_WINDOW: usize = 5;
/// Per-field cap on replayed questions and answers, in characters.
pub const HISTORY_FIELD_CHARS: usize = 200;
/// Context list entries (weak topics, MCQ mistakes) shown in the opening prompt.
pub const CONTEXT_LIST_LIMIT: usize = 5;

pub const START_PROMPT_TEMPLATE: &str = r#"You are a senior interviewer conducting a mock {interview_type} interview.

Candidate profile:
- Track: {track}
- Level: {level}
- Interview type: {interview_type}{weak_block}{mcq_block}

Focus areas: {focus}

Your task:
1. Generate ONE opening interview question
2. The question should be appropriate for the candidate's level
3. If weak topics are provided, start with those areas
4. Make it conversational and realistic

Rules:
- Be professional but friendly
- Don't reveal the answer
- Keep the question clear and specific
- For Technical: include constraints if relevant
- For HR: use the STAR format context
- For Scenario: describe a realistic situation

Output format:
Return ONLY the question text (no JSON, no metadata)."#;

pub const FOLLOWUP_PROMPT_TEMPLATE: &str = r#"You are continuing a mock {interview_type} interview.

Candidate profile:
- Track: {track}
- Level: {level}
- Current difficulty: {difficulty}/5 ({guidance})

Previous conversation:
{history}

Last answer quality: {quality}

Your task:
Generate the NEXT interview question that:
1. Builds on the previous conversation naturally
2. If last answer was weak, probe deeper on that topic
3. If last answer was strong, move to a harder/related topic
4. Matches the current difficulty level
5. Feels like a natural interview flow (not random jumps)

Rules:
- Reference previous answers if relevant ("You mentioned X, can you elaborate...")
- Keep it conversational
- Don't repeat questions already asked
- Return ONLY the question text"#;

pub const INTERVIEW_EVALUATE_TEMPLATE: &str = r#"You are evaluating a mock {interview_type} interview answer.

Context:
- Skill area: {skill}
- Topic: {topic}
- Difficulty: {difficulty}/5
- Interview type: {interview_type}

Question asked:
{question}

Candidate's answer:
{answer}

{rubric}

Return JSON with this exact schema:
{schema}

Rules:
- should_follow_up = true if answer is incomplete or shows interesting depth to explore
- should_follow_up = false if topic is exhausted or interview should move on
- difficulty_adjustment: 1 if answer was strong, -1 if weak, 0 if okay
- Return ONLY valid JSON"#;

/// Coarse answer quality derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerQuality {
    Strong,
    Moderate,
    Weak,
}

impl AnswerQuality {
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 4.0 {
            AnswerQuality::Strong
        } else if overall <= 2.0 {
            AnswerQuality::Weak
        } else {
            AnswerQuality::Moderate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerQuality::Strong => "strong",
            AnswerQuality::Moderate => "moderate",
            AnswerQuality::Weak => "weak",
        }
    }
}

/// One-line summary carried into the next prompt.
pub fn evaluation_summary(quality: AnswerQuality, topic: &str, overall: f64) -> String {
    format!("{} answer on {topic} (score: {overall})", quality.as_str())
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn context_line(label: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let shown = &items[..items.len().min(CONTEXT_LIST_LIMIT)];
    format!("\n- {label}: {}", shown.join(", "))
}

pub fn start_prompt(
    track: &str,
    level: &str,
    interview_type: InterviewType,
    weak_topics: &[String],
    mcq_mistakes: &[String],
) -> String {
    fill_template(
        START_PROMPT_TEMPLATE,
        &[
            ("interview_type", interview_type.as_str()),
            ("track", track),
            ("level", level),
            ("focus", interview_type.focus()),
            ("weak_block", context_line("Weak topics (prioritize these)", weak_topics).as_str()),
            ("mcq_block", context_line("Recent MCQ mistakes", mcq_mistakes).as_str()),
        ],
    )
}

/// Renders the last `HISTORY_WINDOW` turns, each field capped.
pub fn render_history(history: &[ConversationTurn]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let score = turn
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "Turn {}:\nQ: {}\nA: {}\nScore: {}",
                i + 1,
                truncate(&turn.question, HISTORY_FIELD_CHARS),
                truncate(turn.answer.as_deref().unwrap_or(""), HISTORY_FIELD_CHARS),
                score
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn followup_prompt(
    track: &str,
    level: &str,
    interview_type: InterviewType,
    difficulty: Difficulty,
    history: &[ConversationTurn],
    last_answer_quality: &str,
) -> String {
    fill_template(
        FOLLOWUP_PROMPT_TEMPLATE,
        &[
            ("interview_type", interview_type.as_str()),
            ("track", track),
            ("level", level),
            ("difficulty", difficulty.to_string().as_str()),
            ("guidance", difficulty.guidance()),
            ("quality", last_answer_quality),
            ("history", render_history(history).as_str()),
        ],
    )
}

pub struct InterviewEvaluateInput<'a> {
    pub interview_type: InterviewType,
    pub skill: &'a str,
    pub topic: &'a str,
    pub difficulty: Difficulty,
    pub question: &'a str,
    pub answer: &'a str,
}

pub fn evaluate_prompt(input: &InterviewEvaluateInput<'_>) -> String {
    let schema = rubric_schema(&[
        "\"should_follow_up\": true/false",
        "\"follow_up_reason\": \"...\"",
        "\"difficulty_adjustment\": -1/0/1",
    ]);
    fill_template(
        INTERVIEW_EVALUATE_TEMPLATE,
        &[
            ("interview_type", input.interview_type.as_str()),
            ("skill", input.skill),
            ("topic", input.topic),
            ("difficulty", input.difficulty.to_string().as_str()),
            ("rubric", RUBRIC),
            ("schema", schema.as_str()),
            ("question", input.question),
            ("answer", input.answer),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize, answer: Option<String>, score: Option<f64>) -> ConversationTurn {
        ConversationTurn {
            question: format!("Question {i} {}", "q".repeat(300)),
            answer,
            score,
        }
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(AnswerQuality::from_overall(4.0), AnswerQuality::Strong);
        assert_eq!(AnswerQuality::from_overall(2.0), AnswerQuality::Weak);
        assert_eq!(AnswerQuality::from_overall(2.01), AnswerQuality::Moderate);
        assert_eq!(
            evaluation_summary(AnswerQuality::Strong, "joins", 4.5),
            "strong answer on joins (score: 4.5)"
        );
    }

    #[test]
    fn test_history_window_and_truncation() {
        let history: Vec<ConversationTurn> = (0..7)
            .map(|i| turn(i, Some("a".repeat(250)), Some(3.0)))
            .chain(std::iter::once(turn(7, None, None)))
            .collect();
        let rendered = render_history(&history);
        assert!(!rendered.contains("Question 2 "));
        assert!(rendered.contains("Question 3 "));
        assert!(rendered.contains("Turn 5:"));
        assert!(!rendered.contains("Turn 6:"));
        assert!(rendered.contains("Score: N/A"));
        assert!(!rendered.contains(&"a".repeat(201)));
        assert!(rendered.contains(&"a".repeat(200)));
    }

    #[test]
    fn test_start_prompt_context_lines() {
        let weak: Vec<String> = (0..7).map(|i| format!("topic{i}")).collect();
        let prompt = start_prompt("backend", "advanced", InterviewType::Technical, &weak, &[]);
        assert!(prompt.contains("Weak topics (prioritize these): topic0, topic1, topic2, topic3, topic4\n"));
        assert!(!prompt.contains("MCQ"));
        assert!(prompt.contains("coding problems, system design"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_evaluate_prompt_requests_follow_up_fields() {
        let prompt = evaluate_prompt(&InterviewEvaluateInput {
            interview_type: InterviewType::Hr,
            skill: "Behavioral",
            topic: "Teamwork",
            difficulty: Difficulty::default(),
            question: "Tell me about a conflict.",
            answer: "I listened first.",
        });
        assert!(prompt.contains("\"difficulty_adjustment\": -1/0/1"));
        assert!(prompt.contains("mock HR interview answer"));
    }
}
