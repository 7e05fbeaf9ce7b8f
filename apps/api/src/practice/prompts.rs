// Prompt templates for practice questions, hints, open-answer grading and MCQs.
// Reuses the rubric fragments from llm_client::prompts.

use crate::llm_client::prompts::{bullet_list, fill_template, rubric_schema, RUBRIC};
use crate::practice::taxonomy::{Difficulty, QuestionType};

/// Most recent questions fed back as anti-repeat context.
pub const AVOID_LIST_LIMIT: usize = 10;

pub const QUESTION_SYSTEM: &str = "You write interview questions only.";
pub const EVALUATE_SYSTEM: &str = "You are a strict evaluator. Return JSON only.";
pub const HINT_SYSTEM: &str = "You provide concise interview hints only.";
pub const MCQ_SYSTEM: &str = "You generate interview MCQs only. Return JSON only.";

/// Question-writer template. Replace every `{placeholder}` before sending.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"You are a strict interview question writer for a Software Developer role.

Goal:
- Produce ONE fresh interview question (no repeats) tailored to the candidate and constraints.

Constraints:
- Track: {track}
- Level: {level}
- Skill: {skill}
- Topic: {topic}
- Question type: {question_type}
- Difficulty: {difficulty}/5 -> {band}

Quality rules:
- Write exactly ONE question.
- No answers, no hints, no rubric, no 'Expected answer'.
- Must be realistic for interviews and unambiguous.
- The question must be different in angle/setting from prior questions.
- Prefer concrete details (inputs/outputs, constraints) when relevant.

Difficulty control:
- Match the requested difficulty band. Do NOT over-simplify if difficulty >= 4.
- If the question type is 'problem', include clear constraints and what to return.
- If 'scenario', include a realistic scenario and ask what the candidate would do.
- If 'conceptual', ask for explanation + tradeoffs + one example.
{avoid_block}
Output:
- Plain text only (not JSON)."#;

pub const EVALUATE_PROMPT_TEMPLATE: &str = r#"You are an interview evaluator for Software Developer candidates.

Skill: {skill}
Topic: {topic}
Question type: {question_type}

Question:
{question}

Candidate answer:
{answer}

{rubric}

JSON Schema to follow exactly:
{schema}

Rules:
- Be specific and point to what is missing.
- If the answer is wrong, explain the correct direction in model_answer.
- next_drill_topic should be a short topic string (e.g., "SQL joins null behavior", "hash map collisions").
Return ONLY JSON."#;

pub const HINT_PROMPT_TEMPLATE: &str = r#"You are an interview coach. Provide ONE helpful hint, not the full answer.
Rules:
- Do NOT reveal a full solution.
- Keep it concise (<= 6 lines).
- If code is needed, give pseudocode or a small snippet only.
- Focus on approach, edge cases, or common pitfalls.
- Hint strength: {strength}.

Skill: {skill}
Topic: {topic}
Question type: {question_type}
Question:
{question}{draft_block}

Return the hint as plain text."#;

pub const MCQ_PROMPT_TEMPLATE: &str = r#"You are an interview question generator.

Generate {n} multiple-choice questions (MCQs) for:
- Track: {track}
- Level: {level}
- Skill: {skill}
- Topic: {topic}
- Difficulty: {difficulty}/5 -> {band}

Rules:
- Return VALID JSON ONLY (no markdown).
- Output must be a JSON array of objects.
- Each object MUST have exactly these keys: question, options, answer, explanation
- options must be an array of 4 strings (A..D option texts; do NOT prefix with "A)" etc.)
- answer must be one of: "A", "B", "C", "D"
- explanation must be concise (1-3 sentences)
- Avoid duplicates / near-duplicates.
{avoid_block}
Return ONLY the JSON array."#;

/// Parameters shared by the question and MCQ writers.
#[derive(Debug, Clone, Copy)]
pub struct QuestionParams<'a> {
    pub track: &'a str,
    pub level: &'a str,
    pub skill: &'a str,
    pub topic: &'a str,
    pub difficulty: Difficulty,
}

/// Renders the "do not repeat" block, capped at `AVOID_LIST_LIMIT` entries.
fn avoid_block<S: AsRef<str>>(avoid: &[S]) -> String {
    let capped = &avoid[..avoid.len().min(AVOID_LIST_LIMIT)];
    match bullet_list(capped) {
        Some(list) => format!(
            "\nDo NOT repeat any of these previous questions (or close paraphrases):\n{list}\n"
        ),
        None => String::new(),
    }
}

pub fn question_prompt<S: AsRef<str>>(
    params: &QuestionParams<'_>,
    question_type: QuestionType,
    avoid: &[S],
) -> String {
    fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("track", params.track),
            ("level", params.level),
            ("skill", params.skill),
            ("topic", params.topic),
            ("question_type", question_type.as_str()),
            ("difficulty", params.difficulty.to_string().as_str()),
            ("band", params.difficulty.band()),
            ("avoid_block", avoid_block(avoid).as_str()),
        ],
    )
}

pub fn evaluate_prompt(
    skill: &str,
    topic: &str,
    question_type: &str,
    question: &str,
    answer: &str,
) -> String {
    fill_template(
        EVALUATE_PROMPT_TEMPLATE,
        &[
            ("skill", skill),
            ("topic", topic),
            ("question_type", question_type),
            ("rubric", RUBRIC),
            ("schema", rubric_schema(&[]).as_str()),
            ("question", question),
            ("answer", answer),
        ],
    )
}

/// Strength wording for hint levels 1..=3.
pub fn hint_strength(level: u8) -> &'static str {
    match level {
        2 => "medium hint",
        3 => "strong hint",
        _ => "tiny nudge",
    }
}

pub fn hint_prompt(
    skill: &str,
    topic: &str,
    question_type: &str,
    question: &str,
    draft: Option<&str>,
    level: u8,
) -> String {
    let draft_block = match draft.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("\n\nUser's current answer draft:\n{d}"),
        None => String::new(),
    };
    fill_template(
        HINT_PROMPT_TEMPLATE,
        &[
            ("strength", hint_strength(level)),
            ("skill", skill),
            ("topic", topic),
            ("question_type", question_type),
            ("question", question),
            ("draft_block", draft_block.as_str()),
        ],
    )
}

pub fn mcq_prompt<S: AsRef<str>>(params: &QuestionParams<'_>, n: usize, avoid: &[S]) -> String {
    fill_template(
        MCQ_PROMPT_TEMPLATE,
        &[
            ("n", n.to_string().as_str()),
            ("track", params.track),
            ("level", params.level),
            ("skill", params.skill),
            ("topic", params.topic),
            ("difficulty", params.difficulty.to_string().as_str()),
            ("band", params.difficulty.band()),
            ("avoid_block", avoid_block(avoid).as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> QuestionParams<'static> {
        QuestionParams {
            track: "backend",
            level: "intermediate",
            skill: "SQL",
            topic: "joins",
            difficulty: Difficulty::clamped(3),
        }
    }

    #[test]
    fn test_question_prompt_fills_every_placeholder() {
        let prompt = question_prompt::<&str>(&params(), QuestionType::Problem, &[]);
        assert!(prompt.contains("- Skill: SQL"));
        assert!(prompt.contains(
            "- Difficulty: 3/5 -> Medium: requires reasoning, tradeoffs, or a non-trivial approach."
        ));
        assert!(prompt.contains("- Question type: problem"));
        assert!(!prompt.contains('{'));
        assert!(!prompt.contains("Do NOT repeat"));
    }

    #[test]
    fn test_avoid_list_is_capped() {
        let avoid: Vec<String> = (0..15).map(|i| format!("Question number {i}")).collect();
        let prompt = question_prompt(&params(), QuestionType::Conceptual, &avoid);
        assert!(prompt.contains("- Question number 9"));
        assert!(!prompt.contains("- Question number 10"));
    }

    #[test]
    fn test_evaluate_prompt_embeds_rubric_and_schema() {
        let prompt = evaluate_prompt("SQL", "joins", "conceptual", "What is a join?", "It combines rows.");
        assert!(prompt.contains("- reasoning: explains approach/why"));
        assert!(prompt.contains("\"next_drill_topic\": \"...\""));
        assert!(prompt.contains("Candidate answer:\nIt combines rows."));
    }

    #[test]
    fn test_placeholders_in_user_text_are_not_expanded() {
        let params = QuestionParams {
            topic: "{avoid_block}",
            ..params()
        };
        let prompt = question_prompt(&params, QuestionType::Conceptual, &["Earlier question"]);
        assert!(prompt.contains("- Topic: {avoid_block}"));
        assert_eq!(prompt.matches("Earlier question").count(), 1);

        let prompt = evaluate_prompt("SQL", "joins", "conceptual", "Fill in {answer} here", "MY ANSWER");
        assert!(prompt.contains("Fill in {answer} here"));
        assert_eq!(prompt.matches("MY ANSWER").count(), 1);
    }

    #[test]
    fn test_hint_prompt_levels_and_draft() {
        let prompt = hint_prompt("DSA", "heaps", "problem", "Find the kth largest.", Some("sort it"), 3);
        assert!(prompt.contains("Hint strength: strong hint."));
        assert!(prompt.contains("User's current answer draft:\nsort it"));

        let prompt = hint_prompt("DSA", "heaps", "problem", "Find the kth largest.", Some("  "), 1);
        assert!(prompt.contains("tiny nudge"));
        assert!(!prompt.contains("draft"));
    }

    #[test]
    fn test_mcq_prompt_mentions_count() {
        let prompt = mcq_prompt::<&str>(&params(), 5, &[]);
        assert!(prompt.contains("Generate 5 multiple-choice questions"));
    }
}
