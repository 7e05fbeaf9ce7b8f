use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::conversation::ConversationState;
use crate::models::profile::{ProfileFields, UserProfileRow};
use crate::models::progress::TopicProgressRow;
use crate::models::qa_item::{EvaluationRecord, McqSubmission, NewQaItem, QaItemRow};
use crate::models::roadmap::{NewRoadmap, RoadmapRow};
use crate::models::session::{NewSession, SessionRow};
use crate::store::{AttemptRecord, InsertOutcome, PracticeStore};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Grading updates are conditional on `overall IS NULL`; zero rows means a
/// concurrent request graded the item first.
fn ensure_first_grade(item_id: i64, rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::Validation(format!(
            "QA item {item_id} has already been graded"
        )));
    }
    Ok(())
}

#[async_trait]
impl PracticeStore for PgStore {
    async fn create_session(&self, new: NewSession) -> Result<SessionRow, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions
                (user_id, mode, domain, role, track, level, interview_type,
                 difficulty_current, conversation_state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.mode)
        .bind(&new.domain)
        .bind(&new.role)
        .bind(&new.track)
        .bind(&new.level)
        .bind(&new.interview_type)
        .bind(new.difficulty_current)
        .bind(new.conversation_state.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Created {} session {} for user {}",
            row.mode, row.id, new.user_id
        );
        Ok(row)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<SessionRow>, AppError> {
        Ok(
            sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_sessions(&self, user_id: i64, limit: i64) -> Result<Vec<SessionRow>, AppError> {
        Ok(sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn save_interview_state(
        &self,
        session_id: i64,
        difficulty_current: i32,
        state: &ConversationState,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE sessions SET difficulty_current = $2, conversation_state = $3 WHERE id = $1",
        )
        .bind(session_id)
        .bind(difficulty_current)
        .bind(Json(state))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_qa_item(&self, new: NewQaItem) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query_as::<_, QaItemRow>(
            r#"
            INSERT INTO qa_items
                (session_id, skill, topic, question_type, format, difficulty,
                 question, question_hash, mcq, provenance)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.session_id)
        .bind(&new.skill)
        .bind(&new.topic)
        .bind(&new.question_type)
        .bind(new.format.as_str())
        .bind(new.difficulty)
        .bind(&new.question)
        .bind(&new.question_hash)
        .bind(new.mcq.as_ref().map(Json))
        .bind(Json(&new.provenance))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(row)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(
                    "Fingerprint collision on insert for session {}",
                    new.session_id
                );
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_qa_item(&self, item_id: i64) -> Result<Option<QaItemRow>, AppError> {
        Ok(
            sqlx::query_as::<_, QaItemRow>("SELECT * FROM qa_items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_qa_items(&self, session_id: i64) -> Result<Vec<QaItemRow>, AppError> {
        Ok(sqlx::query_as::<_, QaItemRow>(
            "SELECT * FROM qa_items WHERE session_id = $1 ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn recent_questions(&self, session_id: i64, limit: i64) -> Result<Vec<String>, AppError> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"
            SELECT question FROM (
                SELECT id, question FROM qa_items
                WHERE session_id = $1 AND btrim(question) <> ''
                ORDER BY id DESC
                LIMIT $2
            ) recent
            ORDER BY id ASC
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fingerprint_exists(&self, session_id: i64, fingerprint: &str) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM qa_items WHERE session_id = $1 AND question_hash = $2)",
        )
        .bind(session_id)
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn store_user_answer(&self, item_id: i64, answer: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE qa_items SET user_answer = $2 WHERE id = $1")
            .bind(item_id)
            .bind(answer)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_evaluation(&self, item_id: i64, record: &EvaluationRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE qa_items
            SET overall = $2, scores = $3, feedback = $4, model_answer = $5,
                provenance = $6, evaluated_at = now()
            WHERE id = $1 AND overall IS NULL
            "#,
        )
        .bind(item_id)
        .bind(record.overall)
        .bind(Json(&record.scores))
        .bind(Json(&record.feedback))
        .bind(&record.model_answer)
        .bind(Json(&record.provenance))
        .execute(&self.pool)
        .await?;
        ensure_first_grade(item_id, result.rows_affected())
    }

    async fn record_mcq_submission(&self, item_id: i64, submission: &McqSubmission) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE qa_items
            SET user_answer = $2, overall = $3, feedback = $4, mcq = $5, evaluated_at = now()
            WHERE id = $1 AND overall IS NULL
            "#,
        )
        .bind(item_id)
        .bind(submission.selected.to_string())
        .bind(submission.overall)
        .bind(Json(&submission.feedback))
        .bind(Json(&submission.mcq))
        .execute(&self.pool)
        .await?;
        ensure_first_grade(item_id, result.rows_affected())
    }

    async fn record_attempt(&self, attempt: AttemptRecord<'_>) -> Result<TopicProgressRow, AppError> {
        // Single statement: the conflict path takes the row lock, and every SET
        // expression reads the committed values of that row.
        Ok(sqlx::query_as::<_, TopicProgressRow>(
            r#"
            INSERT INTO topic_progress
                (session_id, track, skill, topic, attempts, avg_overall, last_seen_at)
            VALUES ($1, $2, $3, $4, 1, $5, now())
            ON CONFLICT (session_id, skill, topic) DO UPDATE SET
                avg_overall = CASE
                    WHEN topic_progress.attempts = 0 OR topic_progress.avg_overall IS NULL
                        THEN EXCLUDED.avg_overall
                    ELSE (topic_progress.avg_overall * topic_progress.attempts + EXCLUDED.avg_overall)
                        / (topic_progress.attempts + 1)
                END,
                attempts = topic_progress.attempts + 1,
                last_seen_at = now(),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(attempt.session_id)
        .bind(attempt.track)
        .bind(attempt.skill)
        .bind(attempt.topic)
        .bind(attempt.score)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_topic_progress(&self, session_id: i64) -> Result<Vec<TopicProgressRow>, AppError> {
        Ok(sqlx::query_as::<_, TopicProgressRow>(
            "SELECT * FROM topic_progress WHERE session_id = $1 ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_roadmap(&self, new: NewRoadmap) -> Result<RoadmapRow, AppError> {
        Ok(sqlx::query_as::<_, RoadmapRow>(
            r#"
            INSERT INTO roadmaps (user_id, session_id, title, duration_days, plan)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.session_id)
        .bind(&new.title)
        .bind(new.duration_days)
        .bind(Json(&new.plan))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn latest_roadmap(&self, user_id: i64) -> Result<Option<RoadmapRow>, AppError> {
        Ok(sqlx::query_as::<_, RoadmapRow>(
            "SELECT * FROM roadmaps WHERE user_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, UserProfileRow>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn upsert_user_profile(&self, user_id: i64, fields: &ProfileFields) -> Result<UserProfileRow, AppError> {
        Ok(sqlx::query_as::<_, UserProfileRow>(
            r#"
            INSERT INTO user_profiles (user_id, domain, role, track, level)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                domain = EXCLUDED.domain,
                role = EXCLUDED.role,
                track = EXCLUDED.track,
                level = EXCLUDED.level,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&fields.domain)
        .bind(&fields.role)
        .bind(&fields.track)
        .bind(&fields.level)
        .fetch_one(&self.pool)
        .await?)
    }
}
