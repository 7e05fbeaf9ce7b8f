//! Evaluation engine: grades an open answer against the rubric, stores the
//! result and feeds the topic aggregate.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::parse::extract_json_object;
use crate::llm_client::prompts::PROMPT_VERSION;
use crate::llm_client::CompletionGateway;
use crate::models::progress::TopicProgressRow;
use crate::models::qa_item::{EvaluationRecord, Feedback, Provenance, QaItemRow, RubricScores};
use crate::models::session::SessionRow;
use crate::practice::prompts::{evaluate_prompt, EVALUATE_SYSTEM};
use crate::progress::aggregator::record_attempt;
use crate::store::{owned_item, PracticeStore};

/// Longest answer accepted for grading.
pub const MAX_ANSWER_CHARS: usize = 8000;

/// Shape every rubric grader must return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationJson {
    pub scores: RubricScores,
    pub overall: f64,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub improvements: Vec<String>,
    pub model_answer: String,
    pub next_drill_topic: String,
}

impl EvaluationJson {
    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(score) = self.scores.as_array().iter().find(|&&s| s > 5) {
            return Err(AppError::Parse(format!(
                "rubric sub-score {score} is outside 0-5"
            )));
        }
        if !self.overall.is_finite() || !(0.0..=5.0).contains(&self.overall) {
            return Err(AppError::Parse(format!(
                "overall score {} is outside 0-5",
                self.overall
            )));
        }
        Ok(())
    }

    pub fn feedback(&self) -> Feedback {
        Feedback::Rubric {
            strengths: self.strengths.clone(),
            gaps: self.gaps.clone(),
            improvements: self.improvements.clone(),
            next_drill_topic: self.next_drill_topic.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub qa_item_id: i64,
    pub user_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResponse {
    pub qa_item_id: i64,
    pub overall: f64,
    pub evaluation: EvaluationJson,
}

/// Extracts a JSON object from model output and deserializes it into `T`.
/// Both a missing object and a shape mismatch are terminal parse errors.
pub fn parse_model_object<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, AppError> {
    let object = extract_json_object(raw)
        .ok_or_else(|| AppError::Parse(format!("{what}: response contained no JSON object")))?;
    serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::Parse(format!("{what}: {e}")))
}

/// Trims and bounds a submitted answer.
pub fn validate_answer(answer: &str) -> Result<&str, AppError> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(AppError::Validation("user_answer is required".to_string()));
    }
    if answer.chars().count() > MAX_ANSWER_CHARS {
        return Err(AppError::Validation(format!(
            "user_answer must be at most {MAX_ANSWER_CHARS} characters"
        )));
    }
    Ok(answer)
}

/// Writes a graded result onto the item, then updates the topic aggregate.
/// The item write always precedes the aggregate write.
pub async fn apply_evaluation(
    store: &dyn PracticeStore,
    item: &QaItemRow,
    session: &SessionRow,
    evaluation: &EvaluationJson,
    provenance: Provenance,
) -> Result<TopicProgressRow, AppError> {
    let record = EvaluationRecord {
        overall: evaluation.overall,
        scores: evaluation.scores,
        feedback: evaluation.feedback(),
        model_answer: evaluation.model_answer.clone(),
        provenance,
    };
    store.record_evaluation(item.id, &record).await?;
    record_attempt(store, session, &item.skill, &item.topic, evaluation.overall).await
}

/// Grades an open answer. The answer is stored before the model is called, so
/// a provider or parse failure leaves it in place with no score.
pub async fn evaluate(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: EvaluateRequest,
) -> Result<EvaluateResponse, AppError> {
    let answer = validate_answer(&request.user_answer)?;
    let (item, session) = owned_item(store, request.qa_item_id, user_id).await?;
    if item.is_mcq() {
        return Err(AppError::Validation(
            "multiple-choice items are graded through MCQ submit".to_string(),
        ));
    }
    if item.overall.is_some() {
        return Err(AppError::Validation(format!(
            "QA item {} has already been evaluated",
            item.id
        )));
    }

    store.store_user_answer(item.id, answer).await?;

    let prompt = evaluate_prompt(
        &item.skill,
        &item.topic,
        &item.question_type,
        &item.question,
        answer,
    );
    let raw = llm.complete(EVALUATE_SYSTEM, &prompt).await.map_err(|e| {
        warn!("Evaluation call failed for item {}: {e}", item.id);
        AppError::from(e)
    })?;

    let evaluation: EvaluationJson = parse_model_object(&raw, "evaluation")?;
    evaluation.validate()?;

    let provenance = Provenance::new("evaluate", llm.model(), PROMPT_VERSION);
    let progress = apply_evaluation(store, &item, &session, &evaluation, provenance).await?;

    info!(
        "Evaluated item {} ({}/{}): overall={:.2}, topic avg={:.2} over {} attempts",
        item.id,
        item.skill,
        item.topic,
        evaluation.overall,
        progress.avg_overall.unwrap_or(evaluation.overall),
        progress.attempts
    );

    Ok(EvaluateResponse {
        qa_item_id: item.id,
        overall: evaluation.overall,
        evaluation,
    })
}
