//! Request vocabulary: session modes, tracks, levels, question types,
//! interview types, difficulty and canonical skill names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Learn,
    Interview,
    MockInterview,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Learn => "learn",
            Mode::Interview => "interview",
            Mode::MockInterview => "mock_interview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Backend,
    Frontend,
    Fullstack,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Backend => "backend",
            Track::Frontend => "frontend",
            Track::Fullstack => "fullstack",
        }
    }
}

impl FromStr for Track {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backend" => Ok(Track::Backend),
            "frontend" => Ok(Track::Frontend),
            "fullstack" => Ok(Track::Fullstack),
            other => Err(format!("unknown track '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Conceptual,
    Scenario,
    Problem,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Conceptual => "conceptual",
            QuestionType::Scenario => "scenario",
            QuestionType::Problem => "problem",
        }
    }
}

/// Mock-interview modality. Accepted case-insensitively, rendered capitalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterviewType {
    Hr,
    Technical,
    Scenario,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Hr => "HR",
            InterviewType::Technical => "Technical",
            InterviewType::Scenario => "Scenario",
        }
    }

    /// Areas the interviewer should draw questions from.
    pub fn focus(&self) -> &'static str {
        match self {
            InterviewType::Hr => {
                "behavioral questions, situational judgment, communication skills, teamwork, conflict resolution"
            }
            InterviewType::Technical => {
                "coding problems, system design, data structures, algorithms, technical depth"
            }
            InterviewType::Scenario => {
                "real-world scenarios, debugging, architecture decisions, trade-off analysis"
            }
        }
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hr" => Ok(InterviewType::Hr),
            "technical" => Ok(InterviewType::Technical),
            "scenario" => Ok(InterviewType::Scenario),
            other => Err(format!("unknown interview type '{other}'")),
        }
    }
}

impl TryFrom<String> for InterviewType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InterviewType> for String {
    fn from(value: InterviewType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Difficulty
// ────────────────────────────────────────────────────────────────────────────

/// Question difficulty, always within 1..=5.
///
/// Deserializes from an integer, a numeric string, or `easy`/`medium`/`hard`
/// (2/3/4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DifficultyInput", into = "u8")]
pub struct Difficulty(u8);

#[derive(Deserialize)]
#[serde(untagged)]
enum DifficultyInput {
    Number(i64),
    Text(String),
}

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, String> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err("difficulty must be between 1 and 5".to_string())
        }
    }

    /// Clamps an arbitrary stored value into range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn adjusted(&self, delta: i8) -> Self {
        Self::clamped(self.0 as i64 + delta as i64)
    }

    /// Band description used by question writers and graders.
    pub fn band(&self) -> &'static str {
        match self.0 {
            1 => "Very easy (warm-up): fundamentals, minimal edge cases.",
            2 => "Easy: one core concept + a couple edge cases.",
            3 => "Medium: requires reasoning, tradeoffs, or a non-trivial approach.",
            4 => "Hard: multiple constraints, tricky edge cases, performance considerations.",
            _ => "Very hard: interview-challenging; requires strong optimization and careful pitfalls.",
        }
    }

    /// Shorter guidance used inside interview follow-up prompts.
    pub fn guidance(&self) -> &'static str {
        match self.0 {
            1 => "Very easy - basics only",
            2 => "Easy - single concept",
            3 => "Medium - some depth required",
            4 => "Hard - multiple concepts, edge cases",
            _ => "Very hard - expert level",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<DifficultyInput> for Difficulty {
    type Error = String;

    fn try_from(input: DifficultyInput) -> Result<Self, Self::Error> {
        match input {
            DifficultyInput::Number(n) => Difficulty::new(n),
            DifficultyInput::Text(s) => s.parse(),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "easy" => Ok(Self(2)),
            "medium" => Ok(Self(3)),
            "hard" => Ok(Self(4)),
            _ => match v.parse::<i64>() {
                Ok(n) => Difficulty::new(n),
                Err(_) => Err("difficulty must be 1-5 or one of: easy, medium, hard".to_string()),
            },
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl From<Difficulty> for i32 {
    fn from(value: Difficulty) -> Self {
        value.0 as i32
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

const CANONICAL_SKILLS: [&str; 11] = [
    "SQL",
    "DSA",
    "SystemDesign",
    "React",
    "Nextjs",
    "TypeScript",
    "JavaScript",
    "HTML",
    "CSS",
    "WebPerformance",
    "Testing",
];

fn skill_alias(key: &str) -> Option<&'static str> {
    let canonical = match key {
        "system design" | "systemdesign" => "SystemDesign",
        "dsa" | "data structures" | "data structures and algorithms" => "DSA",
        "next" | "nextjs" | "next js" => "Nextjs",
        "reactjs" | "react js" => "React",
        "typescript" | "type script" => "TypeScript",
        "javascript" | "js" => "JavaScript",
        "html" => "HTML",
        "css" => "CSS",
        "web performance" | "performance" => "WebPerformance",
        "testing" | "unit testing" => "Testing",
        "sql" => "SQL",
        _ => return None,
    };
    Some(canonical)
}

/// Maps free-form skill input to a canonical key. Unknown skills become
/// title-cased tokens joined together. `None` for blank input.
pub fn normalize_skill(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = trimmed
        .replace('.', "")
        .replace(['/', '-', '_'], " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    if let Some(canonical) = skill_alias(&tokens.join(" ").to_lowercase()) {
        return Some(canonical.to_string());
    }
    if CANONICAL_SKILLS.contains(&trimmed) {
        return Some(trimmed.to_string());
    }

    Some(
        tokens
            .iter()
            .map(|t| {
                let mut chars = t.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect(),
    )
}
