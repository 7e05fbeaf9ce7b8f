// Prompt templates for the coding simulator.

use crate::llm_client::prompts::fill_template;

pub const PROBLEM_SYSTEM: &str =
    "You generate coding interview problems. Return JSON only.";
pub const SUGGEST_SYSTEM: &str =
    "You are a senior engineer reviewing a candidate's code. Return JSON only.";

pub const GENERATE_PROBLEM_TEMPLATE: &str = r#"Create ONE coding interview problem.

Topic: {topic}
Difficulty: {difficulty}

JSON Schema to follow exactly:
{
  "title": "...",
  "difficulty": "Easy" | "Medium" | "Hard",
  "description": "problem statement with input/output format",
  "examples": [{"input": {"arg": value}, "output": value, "explanation": "..."}],
  "constraints": ["..."],
  "initial_code": "function signature with an empty body",
  "test_cases": [{"input": {"arg": value}, "output": value}],
  "solution": "reference solution code",
  "hints": ["..."]
}

Rules:
- 1-3 examples and at least 3 test_cases, including edge cases.
- Test case inputs are objects keyed by parameter name of initial_code.
- hints go from gentle to specific, and never contain the full solution.
Return ONLY JSON."#;

pub const SUGGEST_CODE_TEMPLATE: &str = r#"The candidate is solving this {difficulty} problem on {topic}.

Problem:
{problem}

Candidate code:
{code}

Suggest the next improvement. Keep the candidate's approach when it is viable.

JSON Schema to follow exactly:
{
  "suggestion_code": "the improved code",
  "explanation": "what changed and why, 1-4 sentences"
}
Return ONLY JSON."#;

pub fn generate_problem_prompt(topic: &str, difficulty: &str) -> String {
    fill_template(
        GENERATE_PROBLEM_TEMPLATE,
        &[("topic", topic), ("difficulty", difficulty)],
    )
}

pub fn suggest_code_prompt(topic: &str, difficulty: &str, problem: &str, code: &str) -> String {
    let code = if code.trim().is_empty() {
        "(no code yet)"
    } else {
        code
    };
    fill_template(
        SUGGEST_CODE_TEMPLATE,
        &[
            ("topic", topic),
            ("difficulty", difficulty),
            ("problem", problem),
            ("code", code),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_prompt_keeps_schema_braces() {
        let prompt = generate_problem_prompt("two pointers", "Hard");
        assert!(prompt.contains("Topic: two pointers\nDifficulty: Hard"));
        assert!(prompt.contains("\"input\": {\"arg\": value}"));
    }

    #[test]
    fn test_suggest_prompt_marks_empty_code() {
        let prompt = suggest_code_prompt("arrays", "Easy", "Sum the array.", "  ");
        assert!(prompt.contains("Candidate code:\n(no code yet)"));

        let prompt = suggest_code_prompt("arrays", "Easy", "Sum {code}", "return 0");
        assert!(prompt.contains("Problem:\nSum {code}"));
        assert_eq!(prompt.matches("return 0").count(), 1);
    }
}
