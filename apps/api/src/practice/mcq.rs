//! Multiple-choice practice: batch generation, local grading, per-skill report.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::parse::extract_json_array;
use crate::llm_client::prompts::PROMPT_VERSION;
use crate::llm_client::CompletionGateway;
use crate::models::qa_item::{
    Feedback, McqLetter, McqMeta, McqSubmission, NewQaItem, Provenance, QuestionFormat,
};
use crate::practice::fingerprint::mcq_fingerprint;
use crate::practice::prompts::{mcq_prompt, QuestionParams, AVOID_LIST_LIMIT, MCQ_SYSTEM};
use crate::practice::taxonomy::{normalize_skill, Difficulty};
use crate::progress::aggregator::record_attempt;
use crate::store::{owned_item, owned_session, InsertOutcome, PracticeStore};

pub const MAX_MCQ_BATCH: usize = 20;

/// Score recorded for a correct choice; a wrong one records zero.
pub const MCQ_CORRECT_SCORE: f64 = 10.0;

const MCQ_QUESTION_TYPE: &str = "mcq";

#[derive(Debug, Clone, Deserialize)]
pub struct McqGenerateRequest {
    pub session_id: i64,
    pub skill: String,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_batch")]
    pub n: usize,
}

fn default_batch() -> usize {
    5
}

#[derive(Debug, Clone, Serialize)]
pub struct McqOut {
    pub qa_item_id: i64,
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqGenerateResponse {
    pub mcqs: Vec<McqOut>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct McqSubmitRequest {
    pub qa_item_id: i64,
    pub selected: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqSubmitResponse {
    pub correct: bool,
    pub selected: McqLetter,
    pub correct_answer: McqLetter,
    /// Text of the correct option.
    pub correct_option: String,
    pub explanation: String,
    pub overall: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McqSkillReport {
    pub skill: String,
    pub attempts: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqReport {
    pub session_id: i64,
    pub by_skill: Vec<McqSkillReport>,
}

/// A model-proposed MCQ that passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct McqCandidate {
    pub question: String,
    pub options: Vec<String>,
    pub answer: McqLetter,
    pub explanation: String,
}

/// Validates one array element: non-empty question, exactly four non-empty
/// option strings, and a single answer letter A-D. Anything else is dropped.
pub fn parse_candidate(value: &Value) -> Option<McqCandidate> {
    let obj = value.as_object()?;

    let question = obj.get("question")?.as_str()?.trim().to_string();
    if question.is_empty() {
        return None;
    }

    let options = obj
        .get("options")?
        .as_array()?
        .iter()
        .map(|o| o.as_str().map(|s| s.trim().to_string()))
        .collect::<Option<Vec<String>>>()?;
    if options.len() != 4 || options.iter().any(String::is_empty) {
        return None;
    }

    let answer = obj.get("answer")?.as_str()?.parse::<McqLetter>().ok()?;
    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Some(McqCandidate {
        question,
        options,
        answer,
        explanation,
    })
}

/// Correctness and recorded score for a choice.
pub fn score_choice(selected: McqLetter, answer: McqLetter) -> (bool, f64) {
    let correct = selected == answer;
    (correct, if correct { MCQ_CORRECT_SCORE } else { 0.0 })
}

pub async fn generate_mcqs(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: McqGenerateRequest,
) -> Result<McqGenerateResponse, AppError> {
    if !(1..=MAX_MCQ_BATCH).contains(&request.n) {
        return Err(AppError::Validation(format!(
            "n must be between 1 and {MAX_MCQ_BATCH}"
        )));
    }
    let session = owned_session(store, request.session_id, user_id).await?;
    let skill = normalize_skill(&request.skill)
        .ok_or_else(|| AppError::Validation("skill is required".to_string()))?;
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic is required".to_string()));
    }

    let avoid = store
        .recent_questions(session.id, AVOID_LIST_LIMIT as i64)
        .await?;
    let params = QuestionParams {
        track: &session.track,
        level: &session.level,
        skill: &skill,
        topic,
        difficulty: request.difficulty,
    };
    let prompt = mcq_prompt(&params, request.n, &avoid);

    let raw = llm.complete(MCQ_SYSTEM, &prompt).await?;
    let candidates = extract_json_array(&raw)
        .ok_or_else(|| AppError::Parse("MCQ batch: response contained no JSON array".to_string()))?;

    let mut created = Vec::new();
    for value in candidates.iter().take(request.n) {
        let Some(candidate) = parse_candidate(value) else {
            debug!("Dropping malformed MCQ candidate in session {}", session.id);
            continue;
        };

        let hash = mcq_fingerprint(&candidate.question, &candidate.options);
        if store.fingerprint_exists(session.id, &hash).await? {
            debug!("Dropping duplicate MCQ candidate in session {}", session.id);
            continue;
        }

        let new_item = NewQaItem {
            session_id: session.id,
            skill: skill.clone(),
            topic: topic.to_string(),
            question_type: MCQ_QUESTION_TYPE.to_string(),
            format: QuestionFormat::Mcq,
            difficulty: request.difficulty.into(),
            question: candidate.question,
            question_hash: Some(hash),
            mcq: Some(McqMeta {
                options: candidate.options.clone(),
                answer: candidate.answer,
                explanation: candidate.explanation,
                selected: None,
                answered_at: None,
            }),
            provenance: Provenance::new("mcq", llm.model(), PROMPT_VERSION),
        };

        match store.insert_qa_item(new_item).await? {
            InsertOutcome::Inserted(row) => created.push(McqOut {
                qa_item_id: row.id,
                question: row.question,
                options: candidate.options,
            }),
            InsertOutcome::Duplicate => {
                debug!("MCQ candidate lost an insert race in session {}", session.id)
            }
        }
    }

    if created.is_empty() {
        return Err(AppError::Generation(
            "the model produced no valid multiple-choice questions".to_string(),
        ));
    }

    info!(
        "Generated {}/{} MCQs ({}/{}) for session {}",
        created.len(),
        request.n,
        skill,
        topic,
        session.id
    );
    Ok(McqGenerateResponse { mcqs: created })
}

/// Grades a choice locally. Each item takes one submission; the letter is
/// validated before anything is scored.
pub async fn submit_mcq(
    store: &dyn PracticeStore,
    user_id: i64,
    request: McqSubmitRequest,
) -> Result<McqSubmitResponse, AppError> {
    let (item, session) = owned_item(store, request.qa_item_id, user_id).await?;
    if !item.is_mcq() {
        return Err(AppError::Validation(format!(
            "QA item {} is not a multiple-choice question",
            item.id
        )));
    }

    let mut meta = item
        .mcq_meta()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("MCQ answer key missing for item {}", item.id))?;
    if meta.selected.is_some() || item.overall.is_some() {
        return Err(AppError::Validation(format!(
            "QA item {} has already been submitted",
            item.id
        )));
    }

    let selected: McqLetter = request
        .selected
        .parse()
        .map_err(|e: String| AppError::UnprocessableEntity(format!("selected: {e}")))?;

    let (correct, overall) = score_choice(selected, meta.answer);
    meta.selected = Some(selected);
    meta.answered_at = Some(Utc::now());

    let submission = McqSubmission {
        selected,
        overall,
        feedback: Feedback::Choice {
            correct,
            correct_answer: meta.answer,
        },
        mcq: meta.clone(),
    };
    store.record_mcq_submission(item.id, &submission).await?;
    record_attempt(store, &session, &item.skill, &item.topic, overall).await?;

    Ok(McqSubmitResponse {
        correct,
        selected,
        correct_answer: meta.answer,
        correct_option: meta
            .options
            .get(meta.answer.index())
            .cloned()
            .unwrap_or_default(),
        explanation: meta.explanation,
        overall: overall as u8,
    })
}

/// Per-skill accuracy over answered MCQs, worst first.
pub async fn mcq_report(
    store: &dyn PracticeStore,
    user_id: i64,
    session_id: i64,
) -> Result<McqReport, AppError> {
    let session = owned_session(store, session_id, user_id).await?;
    let items = store.list_qa_items(session.id).await?;

    let mut by_skill: Vec<McqSkillReport> = Vec::new();
    for item in items.iter().filter(|i| i.is_mcq()) {
        let (Some(answer), Some(meta)) = (item.user_answer.as_deref(), item.mcq_meta()) else {
            continue;
        };
        let correct = answer.parse::<McqLetter>().map(|l| l == meta.answer).unwrap_or(false);

        let pos = match by_skill.iter().position(|r| r.skill == item.skill) {
            Some(pos) => pos,
            None => {
                by_skill.push(McqSkillReport {
                    skill: item.skill.clone(),
                    attempts: 0,
                    correct: 0,
                    accuracy: 0.0,
                });
                by_skill.len() - 1
            }
        };
        let row = &mut by_skill[pos];
        row.attempts += 1;
        if correct {
            row.correct += 1;
        }
    }

    for row in &mut by_skill {
        row.accuracy = row.correct as f64 / row.attempts as f64;
    }
    by_skill.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));

    Ok(McqReport {
        session_id: session.id,
        by_skill,
    })
}
