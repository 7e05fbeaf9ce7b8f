//! Coding simulator: model-written practice problems and code suggestions.
//! Nothing here is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::CompletionGateway;
use crate::practice::evaluation::parse_model_object;
use crate::simulator::prompts::{
    generate_problem_prompt, suggest_code_prompt, PROBLEM_SYSTEM, SUGGEST_SYSTEM,
};

const MAX_TOPIC_CHARS: usize = 200;
const MAX_PROBLEM_CHARS: usize = 8000;
const MAX_CODE_CHARS: usize = 20000;

/// Problem difficulty. Accepted case-insensitively, rendered capitalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProblemDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl ProblemDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemDifficulty::Easy => "Easy",
            ProblemDifficulty::Medium => "Medium",
            ProblemDifficulty::Hard => "Hard",
        }
    }
}

impl FromStr for ProblemDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(ProblemDifficulty::Easy),
            "medium" => Ok(ProblemDifficulty::Medium),
            "hard" => Ok(ProblemDifficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

impl TryFrom<String> for ProblemDifficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProblemDifficulty> for String {
    fn from(value: ProblemDifficulty) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ProblemDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateProblemRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: ProblemDifficulty,
}

/// One input/output pair. Inputs are keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Map<String, Value>,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProblem {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// The requested difficulty; the model's own label is ignored.
    #[serde(default, skip_deserializing)]
    pub difficulty: ProblemDifficulty,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<TestCase>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub initial_code: String,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

impl GeneratedProblem {
    fn validate(&self) -> Result<(), AppError> {
        let missing = [
            ("title", self.title.trim().is_empty()),
            ("description", self.description.trim().is_empty()),
            ("initial_code", self.initial_code.trim().is_empty()),
            ("test_cases", self.test_cases.is_empty()),
        ];
        match missing.iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(AppError::Parse(format!("problem: {field} is empty"))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeSuggestionRequest {
    pub topic: String,
    #[serde(default)]
    pub difficulty: ProblemDifficulty,
    pub problem_description: String,
    #[serde(default)]
    pub user_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSuggestion {
    pub suggestion_code: String,
    #[serde(default)]
    pub explanation: String,
}

/// URL-safe id derived from a title: lowercase alphanumerics joined by `-`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn bounded<'a>(value: &'a str, field: &str, max: usize) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

pub async fn generate_problem(
    llm: &dyn CompletionGateway,
    request: GenerateProblemRequest,
) -> Result<GeneratedProblem, AppError> {
    let topic = bounded(&request.topic, "topic", MAX_TOPIC_CHARS)?;

    let prompt = generate_problem_prompt(topic, request.difficulty.as_str());
    let raw = llm.complete(PROBLEM_SYSTEM, &prompt).await?;
    let mut problem: GeneratedProblem = parse_model_object(&raw, "problem")?;
    problem.validate()?;

    problem.title = problem.title.trim().to_string();
    problem.difficulty = request.difficulty;
    if slugify(&problem.id).is_empty() {
        problem.id = slugify(&problem.title);
    } else {
        problem.id = slugify(&problem.id);
    }

    info!(
        "Generated {} problem '{}' on {} ({} test cases)",
        problem.difficulty,
        problem.id,
        topic,
        problem.test_cases.len()
    );
    Ok(problem)
}

pub async fn suggest_code(
    llm: &dyn CompletionGateway,
    request: CodeSuggestionRequest,
) -> Result<CodeSuggestion, AppError> {
    let topic = bounded(&request.topic, "topic", MAX_TOPIC_CHARS)?;
    let problem = bounded(&request.problem_description, "problem_description", MAX_PROBLEM_CHARS)?;
    if request.user_code.chars().count() > MAX_CODE_CHARS {
        return Err(AppError::Validation(format!(
            "user_code must be at most {MAX_CODE_CHARS} characters"
        )));
    }

    let prompt = suggest_code_prompt(topic, request.difficulty.as_str(), problem, &request.user_code);
    let raw = llm.complete(SUGGEST_SYSTEM, &prompt).await?;
    let suggestion: CodeSuggestion = parse_model_object(&raw, "code suggestion")?;
    if suggestion.suggestion_code.trim().is_empty() {
        return Err(AppError::Parse(
            "code suggestion: suggestion_code is empty".to_string(),
        ));
    }
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::llm_client::CompletionError;

    fn problem_json() -> String {
        json!({
            "title": "Two Sum (Sorted Input)",
            "difficulty": "Easy",
            "description": "Return indices of two numbers adding to target.",
            "examples": [{"input": {"nums": [1, 3, 4], "target": 7}, "output": [1, 2],
                          "explanation": "3 + 4 = 7"}],
            "constraints": ["2 <= nums.length <= 10^4"],
            "initial_code": "function twoSum(nums, target) {\n}",
            "test_cases": [
                {"input": {"nums": [1, 2], "target": 3}, "output": [0, 1]},
                {"input": {"nums": [-3, 0, 3], "target": 0}, "output": [0, 2]}
            ],
            "solution": "two pointers",
            "hints": ["The input is sorted.", "Move the pointer on the smaller side."]
        })
        .to_string()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Two Sum (Sorted Input)"), "two-sum-sorted-input");
        assert_eq!(slugify("  --  "), "");
    }

    #[test]
    fn test_difficulty_parsing() {
        let request: GenerateProblemRequest =
            serde_json::from_value(json!({"topic": "graphs", "difficulty": "hARD"})).unwrap();
        assert_eq!(request.difficulty, ProblemDifficulty::Hard);
        let request: GenerateProblemRequest =
            serde_json::from_value(json!({"topic": "graphs"})).unwrap();
        assert_eq!(request.difficulty, ProblemDifficulty::Medium);
        assert!(serde_json::from_value::<GenerateProblemRequest>(
            json!({"topic": "graphs", "difficulty": "extreme"})
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_generate_problem_types_and_ids() {
        let llm = ScriptedGateway::ok([format!("Here you go:\n{}", problem_json())]);
        let problem = generate_problem(
            &llm,
            GenerateProblemRequest {
                topic: "two pointers".to_string(),
                difficulty: ProblemDifficulty::Hard,
            },
        )
        .await
        .unwrap();

        assert_eq!(problem.id, "two-sum-sorted-input");
        assert_eq!(problem.difficulty, ProblemDifficulty::Hard);
        assert_eq!(problem.examples[0].input["target"], 7);
        assert_eq!(problem.test_cases.len(), 2);
        assert_eq!(problem.test_cases[0].explanation, None);
        assert_eq!(problem.hints.len(), 2);

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["difficulty"], "Hard");
        assert!(llm.last_user_prompt().unwrap().contains("Topic: two pointers"));
    }

    #[tokio::test]
    async fn test_problem_without_tests_is_parse_error() {
        let raw = problem_json().replace("\"test_cases\"", "\"unused\"");
        let llm = ScriptedGateway::ok([raw]);
        let result = generate_problem(
            &llm,
            GenerateProblemRequest {
                topic: "arrays".to_string(),
                difficulty: ProblemDifficulty::Easy,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Parse(_))));

        let mut blank = serde_json::from_str::<Value>(&problem_json()).unwrap();
        blank["initial_code"] = json!("  ");
        let llm = ScriptedGateway::ok([blank.to_string()]);
        let result = generate_problem(
            &llm,
            GenerateProblemRequest {
                topic: "arrays".to_string(),
                difficulty: ProblemDifficulty::Easy,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[tokio::test]
    async fn test_blank_topic_is_rejected_without_model_call() {
        let llm = ScriptedGateway::ok(Vec::<String>::new());
        let result = generate_problem(
            &llm,
            GenerateProblemRequest {
                topic: "   ".to_string(),
                difficulty: ProblemDifficulty::Easy,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.call_count(), 0);
    }

    fn suggestion_request(code: &str) -> CodeSuggestionRequest {
        CodeSuggestionRequest {
            topic: "arrays".to_string(),
            difficulty: ProblemDifficulty::Easy,
            problem_description: "Sum the array.".to_string(),
            user_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn test_suggest_code() {
        let llm = ScriptedGateway::ok([
            r#"```json
{"suggestion_code": "return nums.reduce((a, b) => a + b, 0);", "explanation": "Use reduce."}
```"#,
        ]);
        let suggestion = suggest_code(&llm, suggestion_request("let s = 0;")).await.unwrap();
        assert_eq!(suggestion.explanation, "Use reduce.");
        assert!(suggestion.suggestion_code.contains("reduce"));
    }

    #[tokio::test]
    async fn test_suggest_code_errors() {
        let llm = ScriptedGateway::ok([r#"{"suggestion_code": " ", "explanation": "none"}"#]);
        let result = suggest_code(&llm, suggestion_request("")).await;
        assert!(matches!(result, Err(AppError::Parse(_))));

        let llm = ScriptedGateway::new(vec![Err(CompletionError::MissingCredential)]);
        let result = suggest_code(&llm, suggestion_request("")).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let llm = ScriptedGateway::ok(Vec::<String>::new());
        let too_long = "x".repeat(MAX_CODE_CHARS + 1);
        let result = suggest_code(&llm, suggestion_request(&too_long)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.call_count(), 0);
    }
}
