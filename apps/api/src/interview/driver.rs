//! Mock-interview conversation driver.
//!
//! Each request re-reads the session's persisted `ConversationState`, advances
//! it and writes it back. Nothing is held in memory between requests.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{
    evaluate_prompt, evaluation_summary, followup_prompt, start_prompt, AnswerQuality,
    InterviewEvaluateInput, CONTEXT_LIST_LIMIT, INTERVIEWER_SYSTEM, INTERVIEW_EVALUATOR_SYSTEM,
};
use crate::interview::topics::select_topic;
use crate::llm_client::prompts::PROMPT_VERSION;
use crate::llm_client::{CompletionError, CompletionGateway};
use crate::models::conversation::ConversationState;
use crate::models::qa_item::{NewQaItem, Provenance, QaItemRow, QuestionFormat};
use crate::models::session::{NewSession, SessionRow};
use crate::practice::evaluation::{apply_evaluation, parse_model_object, validate_answer, EvaluationJson};
use crate::practice::fingerprint::fingerprint;
use crate::practice::questions::{
    generate_unique_item, ItemTemplate, MAX_QUESTION_ATTEMPTS, MIN_QUESTION_CHARS,
};
use crate::practice::taxonomy::{Difficulty, InterviewType, Level, Mode, Track};
use crate::progress::aggregator::rank_weak_topics;
use crate::store::{owned_item, owned_session, InsertOutcome, PracticeStore};

/// An interview ends once it has asked this many questions.
pub const MAX_INTERVIEW_TURNS: u32 = 10;
/// Recent sessions mined for weak topics and MCQ mistakes.
const HISTORY_SESSIONS: i64 = 5;
/// Weak topics taken from each of those sessions.
const WEAK_TOPICS_PER_SESSION: usize = 3;
/// MCQ scores below this count as mistakes.
const MCQ_MISTAKE_BELOW: f64 = 5.0;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StartInterviewRequest {
    pub track: Track,
    pub level: Level,
    pub interview_type: InterviewType,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: i64,
    pub qa_item_id: i64,
    pub first_question: String,
    pub turn_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextQuestionRequest {
    pub session_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextQuestionResponse {
    pub qa_item_id: i64,
    pub question: String,
    pub turn_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewAnswerRequest {
    pub qa_item_id: i64,
    pub user_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewAnswerResponse {
    pub evaluation: EvaluationJson,
    pub follow_up_question: Option<String>,
    pub follow_up_qa_item_id: Option<i64>,
    pub interview_complete: bool,
    pub current_difficulty: u8,
    pub turn_count: u32,
}

/// The rubric result plus the interviewer's continuation signals.
#[derive(Debug, Clone, Deserialize)]
pub struct InterviewEvaluationJson {
    #[serde(flatten)]
    pub rubric: EvaluationJson,
    pub should_follow_up: bool,
    #[serde(default)]
    pub follow_up_reason: String,
    pub difficulty_adjustment: i8,
}

impl InterviewEvaluationJson {
    fn validate(&self) -> Result<(), AppError> {
        self.rubric.validate()?;
        if !(-1..=1).contains(&self.difficulty_adjustment) {
            return Err(AppError::Parse(format!(
                "difficulty_adjustment {} is not -1, 0 or 1",
                self.difficulty_adjustment
            )));
        }
        Ok(())
    }
}

/// True when the turn just answered is the last one allowed.
pub fn turn_limit_reached(turn_count: u32) -> bool {
    turn_count + 1 >= MAX_INTERVIEW_TURNS
}

fn interview_type_of(session: &SessionRow) -> Result<InterviewType, AppError> {
    if session.mode != Mode::MockInterview.as_str() {
        return Err(AppError::Validation(format!(
            "session {} is not a mock interview",
            session.id
        )));
    }
    session
        .interview_type
        .as_deref()
        .unwrap_or("Technical")
        .parse()
        .map_err(AppError::Validation)
}

fn item_template(
    session: &SessionRow,
    interview_type: InterviewType,
    skill: String,
    topic: String,
    difficulty: Difficulty,
    provenance: Provenance,
) -> ItemTemplate {
    ItemTemplate {
        session_id: session.id,
        skill,
        topic,
        question_type: interview_type.as_str().to_ascii_lowercase(),
        difficulty,
        provenance,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Opening context
// ────────────────────────────────────────────────────────────────────────────

fn push_unique(list: &mut Vec<String>, value: &str) {
    if list.len() < CONTEXT_LIST_LIMIT && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Weak topics and MCQ mistake topics from the user's recent sessions.
async fn opening_context(
    store: &dyn PracticeStore,
    user_id: i64,
) -> Result<(Vec<String>, Vec<String>), AppError> {
    let sessions = store.list_sessions(user_id, HISTORY_SESSIONS).await?;
    let mut weak_topics = Vec::new();
    let mut mcq_mistakes = Vec::new();

    for session in &sessions {
        for weak in rank_weak_topics(store, session.id, WEAK_TOPICS_PER_SESSION).await? {
            push_unique(&mut weak_topics, &weak.topic);
        }
        for item in store.list_qa_items(session.id).await? {
            if item.is_mcq() && item.overall.is_some_and(|o| o < MCQ_MISTAKE_BELOW) {
                push_unique(&mut mcq_mistakes, &item.topic);
            }
        }
    }

    Ok((weak_topics, mcq_mistakes))
}

/// Asks for an opening question before any session exists, so a failed start
/// leaves nothing behind. A fresh session has no fingerprints to collide with.
async fn opening_question(
    llm: &dyn CompletionGateway,
    prompt: &str,
) -> Result<(String, u32), AppError> {
    for attempt in 1..=MAX_QUESTION_ATTEMPTS {
        match llm.complete(INTERVIEWER_SYSTEM, prompt).await {
            Ok(text) => {
                let question = text.trim().to_string();
                if question.chars().count() >= MIN_QUESTION_CHARS {
                    return Ok((question, attempt));
                }
                warn!("Opening question attempt {} rejected: too short", attempt);
            }
            Err(CompletionError::MissingCredential) => {
                return Err(CompletionError::MissingCredential.into())
            }
            Err(e) => warn!("Opening question attempt {} failed: {e}", attempt),
        }
    }
    Err(AppError::Generation(format!(
        "no acceptable opening question after {MAX_QUESTION_ATTEMPTS} attempts"
    )))
}

// ────────────────────────────────────────────────────────────────────────────
// Transitions
// ────────────────────────────────────────────────────────────────────────────

/// Opens a mock interview: new session, first question, turn 1.
pub async fn start(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: StartInterviewRequest,
) -> Result<StartInterviewResponse, AppError> {
    let (weak_topics, mcq_mistakes) = opening_context(store, user_id).await?;
    let difficulty = Difficulty::default();

    let mut state = ConversationState {
        weak_spots_identified: weak_topics.clone(),
        ..Default::default()
    };
    let (skill, topic) = select_topic(request.interview_type, Some(request.track), &state);

    let prompt = start_prompt(
        request.track.as_str(),
        request.level.as_str(),
        request.interview_type,
        &weak_topics,
        &mcq_mistakes,
    );
    let (question, attempts) = opening_question(llm, &prompt).await?;

    state.cover_topic(&topic);
    state.push_question(&question, difficulty.get());

    let session = store
        .create_session(NewSession {
            user_id,
            mode: Mode::MockInterview.as_str().to_string(),
            domain: None,
            role: None,
            track: request.track.as_str().to_string(),
            level: request.level.as_str().to_string(),
            interview_type: Some(request.interview_type.as_str().to_string()),
            difficulty_current: difficulty.into(),
            conversation_state: Some(state.clone()),
        })
        .await?;

    let mut provenance = Provenance::new("interview_start", llm.model(), PROMPT_VERSION);
    provenance.attempts = Some(attempts);
    provenance.turn = Some(state.turn_count);

    let new_item = NewQaItem {
        session_id: session.id,
        skill,
        topic,
        question_type: request.interview_type.as_str().to_ascii_lowercase(),
        format: QuestionFormat::OpenEnded,
        difficulty: difficulty.into(),
        question_hash: Some(fingerprint(&question)),
        question,
        mcq: None,
        provenance,
    };
    let item = match store.insert_qa_item(new_item).await? {
        InsertOutcome::Inserted(row) => row,
        InsertOutcome::Duplicate => {
            return Err(AppError::Generation(format!(
                "opening question collided in new session {}",
                session.id
            )))
        }
    };

    info!(
        "User {} started {} interview in session {} (weak topics: {})",
        user_id,
        request.interview_type,
        session.id,
        weak_topics.len()
    );

    Ok(StartInterviewResponse {
        session_id: session.id,
        qa_item_id: item.id,
        first_question: item.question,
        turn_count: state.turn_count,
    })
}

/// Grades an interview answer, adapts difficulty and decides whether to ask a
/// follow-up. A failed follow-up ends the interview instead of failing the
/// request.
pub async fn answer(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: InterviewAnswerRequest,
) -> Result<InterviewAnswerResponse, AppError> {
    let user_answer = validate_answer(&request.user_answer)?;
    let (item, session) = owned_item(store, request.qa_item_id, user_id).await?;
    let interview_type = interview_type_of(&session)?;
    let track = session.track.parse::<Track>().ok();
    if item.overall.is_some() {
        return Err(AppError::Validation(format!(
            "QA item {} has already been answered",
            item.id
        )));
    }

    store.store_user_answer(item.id, user_answer).await?;

    let mut state = session.conversation();
    let difficulty = Difficulty::clamped(session.difficulty_current.into());

    let prompt = evaluate_prompt(&InterviewEvaluateInput {
        interview_type,
        skill: &item.skill,
        topic: &item.topic,
        difficulty,
        question: &item.question,
        answer: user_answer,
    });
    let raw = llm
        .complete(INTERVIEW_EVALUATOR_SYSTEM, &prompt)
        .await
        .map_err(|e| {
            warn!("Interview evaluation failed for item {}: {e}", item.id);
            AppError::from(e)
        })?;
    let graded: InterviewEvaluationJson = parse_model_object(&raw, "interview evaluation")?;
    graded.validate()?;

    let mut provenance = Provenance::new("interview_evaluate", llm.model(), PROMPT_VERSION);
    provenance.turn = Some(state.turn_count);
    provenance.should_follow_up = Some(graded.should_follow_up);
    provenance.difficulty_adjustment = Some(graded.difficulty_adjustment);
    apply_evaluation(store, &item, &session, &graded.rubric, provenance).await?;

    let overall = graded.rubric.overall;
    let quality = AnswerQuality::from_overall(overall);
    state.record_answer(user_answer, overall);
    state.last_evaluation_summary = evaluation_summary(quality, &item.topic, overall);

    let next_difficulty = difficulty.adjusted(graded.difficulty_adjustment);

    let mut follow_up: Option<QaItemRow> = None;
    if graded.should_follow_up && !turn_limit_reached(state.turn_count) {
        let (skill, topic) = select_topic(interview_type, track, &state);
        debug!(
            "Follow-up on {}/{} for session {}: {}",
            skill, topic, session.id, graded.follow_up_reason
        );
        let prompt = followup_prompt(
            &session.track,
            &session.level,
            interview_type,
            next_difficulty,
            &state.conversation_history,
            quality.as_str(),
        );
        let mut provenance = Provenance::new("interview_follow_up", llm.model(), PROMPT_VERSION);
        provenance.turn = Some(state.turn_count + 1);
        let template = item_template(
            &session,
            interview_type,
            skill,
            topic.clone(),
            next_difficulty,
            provenance,
        );

        match generate_unique_item(store, llm, template, INTERVIEWER_SYSTEM, &prompt).await {
            Ok(row) => {
                state.cover_topic(&topic);
                state.push_question(&row.question, next_difficulty.get());
                follow_up = Some(row);
            }
            Err(e) => warn!(
                "Follow-up generation failed for session {}, ending interview: {e}",
                session.id
            ),
        }
    }

    store
        .save_interview_state(session.id, next_difficulty.into(), &state)
        .await?;

    info!(
        "Interview session {} turn {}: {} (difficulty {} -> {}, follow-up: {})",
        session.id,
        state.turn_count,
        state.last_evaluation_summary,
        difficulty,
        next_difficulty,
        follow_up.is_some()
    );

    Ok(InterviewAnswerResponse {
        evaluation: graded.rubric,
        interview_complete: follow_up.is_none(),
        follow_up_qa_item_id: follow_up.as_ref().map(|row| row.id),
        follow_up_question: follow_up.map(|row| row.question),
        current_difficulty: next_difficulty.get(),
        turn_count: state.turn_count,
    })
}

/// Asks the next question outside the answer flow. Failures propagate.
pub async fn next_question(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: NextQuestionRequest,
) -> Result<NextQuestionResponse, AppError> {
    let session = owned_session(store, request.session_id, user_id).await?;
    let interview_type = interview_type_of(&session)?;
    let track = session.track.parse::<Track>().ok();

    let mut state = session.conversation();
    if state.turn_count >= MAX_INTERVIEW_TURNS {
        return Err(AppError::Validation(format!(
            "interview in session {} is already complete",
            session.id
        )));
    }

    let difficulty = Difficulty::clamped(session.difficulty_current.into());
    let (skill, topic) = select_topic(interview_type, track, &state);
    let quality = if state.last_evaluation_summary.is_empty() {
        "unknown"
    } else {
        state.last_evaluation_summary.as_str()
    };
    let prompt = followup_prompt(
        &session.track,
        &session.level,
        interview_type,
        difficulty,
        &state.conversation_history,
        quality,
    );

    let mut provenance = Provenance::new("interview_next", llm.model(), PROMPT_VERSION);
    provenance.turn = Some(state.turn_count + 1);
    let template = item_template(&session, interview_type, skill, topic.clone(), difficulty, provenance);
    let item = generate_unique_item(store, llm, template, INTERVIEWER_SYSTEM, &prompt).await?;

    state.cover_topic(&topic);
    state.push_question(&item.question, difficulty.get());
    store
        .save_interview_state(session.id, difficulty.into(), &state)
        .await?;

    Ok(NextQuestionResponse {
        qa_item_id: item.id,
        question: item.question,
        turn_count: state.turn_count,
    })
}
