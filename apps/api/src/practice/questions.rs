//! Question lifecycle: bounded generation of a non-duplicate question, and hints.
//!
//! Items are built in memory and inserted only once a candidate is accepted,
//! so a session never holds an item with an empty question.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::PROMPT_VERSION;
use crate::llm_client::{CompletionError, CompletionGateway};
use crate::models::qa_item::{NewQaItem, Provenance, QaItemRow, QuestionFormat};
use crate::practice::fingerprint::fingerprint;
use crate::practice::prompts::{
    hint_prompt, question_prompt, QuestionParams, AVOID_LIST_LIMIT, HINT_SYSTEM, QUESTION_SYSTEM,
};
use crate::practice::taxonomy::{normalize_skill, Difficulty, QuestionType};
use crate::store::{owned_item, owned_session, InsertOutcome, PracticeStore};

/// Model calls allowed per question before giving up.
pub const MAX_QUESTION_ATTEMPTS: u32 = 4;

/// Shortest acceptable question, in characters after trimming.
pub const MIN_QUESTION_CHARS: usize = 10;

const MIN_HINT_CHARS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateQuestionRequest {
    pub session_id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuestion {
    pub qa_item_id: i64,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HintRequest {
    pub qa_item_id: i64,
    /// Current draft; falls back to the stored answer when absent.
    pub user_answer: Option<String>,
    #[serde(default = "default_hint_level")]
    pub hint_level: u8,
}

fn default_hint_level() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize)]
pub struct HintResponse {
    pub hint: String,
}

/// Everything an item carries except its question text.
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    pub session_id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: String,
    pub difficulty: Difficulty,
    pub provenance: Provenance,
}

/// Calls the model until it yields a question that is long enough and whose
/// fingerprint is new to the session, then persists it.
///
/// At most `MAX_QUESTION_ATTEMPTS` calls are made. Short answers, fingerprint
/// collisions (including ones lost to a concurrent insert) and provider
/// failures each consume one attempt. A missing credential fails immediately.
pub async fn generate_unique_item(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    template: ItemTemplate,
    system: &str,
    prompt: &str,
) -> Result<QaItemRow, AppError> {
    for attempt in 1..=MAX_QUESTION_ATTEMPTS {
        let question = match llm.complete(system, prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(CompletionError::MissingCredential) => {
                return Err(CompletionError::MissingCredential.into())
            }
            Err(e) => {
                warn!(
                    "Question attempt {}/{} failed for session {}: {e}",
                    attempt, MAX_QUESTION_ATTEMPTS, template.session_id
                );
                continue;
            }
        };

        if question.chars().count() < MIN_QUESTION_CHARS {
            warn!(
                "Question attempt {}/{} rejected: too short ({} chars)",
                attempt,
                MAX_QUESTION_ATTEMPTS,
                question.chars().count()
            );
            continue;
        }

        let hash = fingerprint(&question);
        if store.fingerprint_exists(template.session_id, &hash).await? {
            warn!(
                "Question attempt {}/{} rejected: duplicate in session {}",
                attempt, MAX_QUESTION_ATTEMPTS, template.session_id
            );
            continue;
        }

        let mut provenance = template.provenance.clone();
        provenance.attempts = Some(attempt);

        let new_item = NewQaItem {
            session_id: template.session_id,
            skill: template.skill.clone(),
            topic: template.topic.clone(),
            question_type: template.question_type.clone(),
            format: QuestionFormat::OpenEnded,
            difficulty: template.difficulty.into(),
            question,
            question_hash: Some(hash),
            mcq: None,
            provenance,
        };

        match store.insert_qa_item(new_item).await? {
            InsertOutcome::Inserted(row) => return Ok(row),
            InsertOutcome::Duplicate => {
                warn!(
                    "Question attempt {}/{} lost an insert race in session {}",
                    attempt, MAX_QUESTION_ATTEMPTS, template.session_id
                );
            }
        }
    }

    Err(AppError::Generation(format!(
        "no acceptable question after {MAX_QUESTION_ATTEMPTS} attempts for session {}",
        template.session_id
    )))
}

/// Generates one practice question for a session the caller owns.
pub async fn generate_question(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: GenerateQuestionRequest,
) -> Result<GeneratedQuestion, AppError> {
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
    let prompt = question_prompt(&params, request.question_type, &avoid);

    let template = ItemTemplate {
        session_id: session.id,
        skill: skill.clone(),
        topic: topic.to_string(),
        question_type: request.question_type.as_str().to_string(),
        difficulty: request.difficulty,
        provenance: Provenance::new("question", llm.model(), PROMPT_VERSION),
    };

    let item = generate_unique_item(store, llm, template, QUESTION_SYSTEM, &prompt).await?;
    info!(
        "Generated question {} ({}/{}) for session {}",
        item.id, item.skill, item.topic, session.id
    );

    Ok(GeneratedQuestion {
        qa_item_id: item.id,
        question: item.question,
    })
}

/// Returns a hint for an item without revealing the full answer.
pub async fn hint(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: HintRequest,
) -> Result<HintResponse, AppError> {
    if !(1..=3).contains(&request.hint_level) {
        return Err(AppError::Validation(
            "hint_level must be between 1 and 3".to_string(),
        ));
    }

    let (item, _session) = owned_item(store, request.qa_item_id, user_id).await?;
    let draft = request.user_answer.as_deref().or(item.user_answer.as_deref());

    let prompt = hint_prompt(
        &item.skill,
        &item.topic,
        &item.question_type,
        &item.question,
        draft,
        request.hint_level,
    );
    let hint = llm.complete(HINT_SYSTEM, &prompt).await?.trim().to_string();

    if hint.chars().count() < MIN_HINT_CHARS {
        return Err(AppError::Generation(format!(
            "hint for item {} was empty",
            item.id
        )));
    }

    Ok(HintResponse { hint })
}
