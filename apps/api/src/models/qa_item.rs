use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    OpenEnded,
    Mcq,
}

impl QuestionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFormat::OpenEnded => "open_ended",
            QuestionFormat::Mcq => "mcq",
        }
    }
}

/// One of the four MCQ answer letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McqLetter {
    A,
    B,
    C,
    D,
}

impl McqLetter {
    pub const ALL: [McqLetter; 4] = [McqLetter::A, McqLetter::B, McqLetter::C, McqLetter::D];

    pub fn index(&self) -> usize {
        match self {
            McqLetter::A => 0,
            McqLetter::B => 1,
            McqLetter::C => 2,
            McqLetter::D => 3,
        }
    }
}

impl FromStr for McqLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        McqLetter::ALL
            .into_iter()
            .find(|letter| letter.to_string() == upper)
            .ok_or_else(|| format!("'{upper}' is not one of A/B/C/D"))
    }
}

impl fmt::Display for McqLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            McqLetter::A => "A",
            McqLetter::B => "B",
            McqLetter::C => "C",
            McqLetter::D => "D",
        };
        f.write_str(letter)
    }
}

/// Answer key and submission state of a multiple-choice item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqMeta {
    pub options: Vec<String>,
    pub answer: McqLetter,
    pub explanation: String,
    #[serde(default)]
    pub selected: Option<McqLetter>,
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
}

/// The five rubric criteria, 0–5 each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScores {
    pub correctness: u8,
    pub completeness: u8,
    pub clarity: u8,
    pub depth: u8,
    pub reasoning: u8,
}

impl RubricScores {
    pub fn as_array(&self) -> [u8; 5] {
        [
            self.correctness,
            self.completeness,
            self.clarity,
            self.depth,
            self.reasoning,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    Rubric {
        strengths: Vec<String>,
        gaps: Vec<String>,
        improvements: Vec<String>,
        next_drill_topic: String,
    },
    Choice {
        correct: bool,
        correct_answer: McqLetter,
    },
}

/// Reproducibility metadata: which model and template produced the item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub feature: String,
    pub model: String,
    pub prompt_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_follow_up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_adjustment: Option<i8>,
}

impl Provenance {
    pub fn new(feature: &str, model: &str, prompt_version: &str) -> Self {
        Self {
            feature: feature.to_string(),
            model: model.to_string(),
            prompt_version: prompt_version.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QaItemRow {
    pub id: i64,
    pub session_id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: String,
    pub format: String,
    pub difficulty: i32,
    pub question: String,
    pub question_hash: Option<String>,
    pub mcq: Option<Json<McqMeta>>,
    pub user_answer: Option<String>,
    pub model_answer: Option<String>,
    pub overall: Option<f64>,
    pub scores: Option<Json<RubricScores>>,
    pub feedback: Option<Json<Feedback>>,
    pub provenance: Option<Json<Provenance>>,
    pub created_at: DateTime<Utc>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl QaItemRow {
    pub fn is_mcq(&self) -> bool {
        self.format == QuestionFormat::Mcq.as_str()
    }

    pub fn mcq_meta(&self) -> Option<&McqMeta> {
        self.mcq.as_ref().map(|Json(meta)| meta)
    }
}

/// Fields for inserting a finalized item. Items are only persisted once their
/// question text is accepted.
#[derive(Debug, Clone)]
pub struct NewQaItem {
    pub session_id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: String,
    pub format: QuestionFormat,
    pub difficulty: i32,
    pub question: String,
    pub question_hash: Option<String>,
    pub mcq: Option<McqMeta>,
    pub provenance: Provenance,
}

/// Result of an open-answer evaluation, written in one update.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub overall: f64,
    pub scores: RubricScores,
    pub feedback: Feedback,
    pub model_answer: String,
    pub provenance: Provenance,
}

/// Result of an MCQ submission, written in one update.
#[derive(Debug, Clone)]
pub struct McqSubmission {
    pub selected: McqLetter,
    pub overall: f64,
    pub feedback: Feedback,
    pub mcq: McqMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_parse_is_case_insensitive() {
        assert_eq!(" b ".parse::<McqLetter>().unwrap(), McqLetter::B);
        assert!("E".parse::<McqLetter>().is_err());
        assert!("".parse::<McqLetter>().is_err());
    }

    #[test]
    fn test_letter_index() {
        let indexes: Vec<usize> = McqLetter::ALL.iter().map(McqLetter::index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_feedback_is_tagged() {
        let fb = Feedback::Choice {
            correct: true,
            correct_answer: McqLetter::C,
        };
        let json = serde_json::to_value(&fb).unwrap();
        assert_eq!(json["kind"], "choice");
        assert_eq!(json["correct_answer"], "C");
    }

    #[test]
    fn test_provenance_omits_unset_fields() {
        let mut p = Provenance::new("question", "gpt-4", "v1");
        p.attempts = Some(2);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["attempts"], 2);
        assert!(json.get("turn").is_none());
    }
}
