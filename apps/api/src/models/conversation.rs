//! Mock-interview memory, persisted as JSONB on the session row.
//!
//! Every field carries `#[serde(default)]` so blobs written by older versions
//! still deserialize; `upgraded()` normalizes them to the current version.

use serde::{Deserialize, Serialize};

pub const CONVERSATION_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// 0 means the blob predates versioning.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub turn_count: u32,
    /// Insertion-ordered, no duplicates.
    #[serde(default)]
    pub topics_covered: Vec<String>,
    #[serde(default)]
    pub weak_spots_identified: Vec<String>,
    #[serde(default)]
    pub difficulty_history: Vec<u8>,
    #[serde(default)]
    pub last_evaluation_summary: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            version: CONVERSATION_STATE_VERSION,
            turn_count: 0,
            topics_covered: Vec::new(),
            weak_spots_identified: Vec::new(),
            difficulty_history: Vec::new(),
            last_evaluation_summary: String::new(),
            conversation_history: Vec::new(),
        }
    }
}

impl ConversationState {
    pub fn upgraded(mut self) -> Self {
        if self.version < CONVERSATION_STATE_VERSION {
            // v0 blobs stored topics with possible repeats.
            let mut seen = Vec::with_capacity(self.topics_covered.len());
            for topic in self.topics_covered.drain(..) {
                if !seen.contains(&topic) {
                    seen.push(topic);
                }
            }
            self.topics_covered = seen;
            self.version = CONVERSATION_STATE_VERSION;
        }
        self
    }

    pub fn cover_topic(&mut self, topic: &str) {
        if !self.topics_covered.iter().any(|t| t == topic) {
            self.topics_covered.push(topic.to_string());
        }
    }

    /// Opens a new turn for `question` asked at `difficulty`.
    pub fn push_question(&mut self, question: &str, difficulty: u8) {
        self.turn_count += 1;
        self.conversation_history.push(ConversationTurn {
            question: question.to_string(),
            answer: None,
            score: None,
        });
        self.difficulty_history.push(difficulty);
    }

    /// Fills the answer and score of the latest open turn.
    pub fn record_answer(&mut self, answer: &str, score: f64) {
        if let Some(turn) = self.conversation_history.last_mut() {
            turn.answer = Some(answer.chars().take(500).collect());
            turn.score = Some(score);
        }
    }

    /// Weak topics this conversation has not touched yet, in signal order.
    pub fn uncovered_weak_spots(&self) -> Vec<String> {
        self.weak_spots_identified
            .iter()
            .filter(|t| !self.topics_covered.contains(t))
            .cloned()
            .collect()
    }
}
