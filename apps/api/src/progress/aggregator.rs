//! Rolling per-topic statistics and weak-topic ranking.
//!
//! One aggregate per (session, skill, topic). The mean is maintained
//! incrementally and never recomputed from the items.

use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;
use crate::models::progress::TopicProgressRow;
use crate::models::qa_item::QaItemRow;
use crate::models::session::SessionRow;
use crate::store::{AttemptRecord, PracticeStore};

/// Default length of weak-topic lists.
pub const WEAK_TOPIC_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakTopic {
    pub skill: String,
    pub topic: String,
    pub avg_overall: f64,
    pub attempts: i32,
}

/// `(old_avg * old_attempts + value) / (old_attempts + 1)`; the first value
/// (or a missing previous mean) seeds the average.
pub fn online_mean(old_avg: Option<f64>, old_attempts: i32, value: f64) -> f64 {
    match old_avg {
        Some(avg) if old_attempts > 0 => {
            (avg * old_attempts as f64 + value) / (old_attempts as f64 + 1.0)
        }
        _ => value,
    }
}

/// Records one graded attempt against the item's (skill, topic).
pub async fn record_attempt(
    store: &dyn PracticeStore,
    session: &SessionRow,
    skill: &str,
    topic: &str,
    score: f64,
) -> Result<TopicProgressRow, AppError> {
    let row = store
        .record_attempt(AttemptRecord {
            session_id: session.id,
            track: &session.track,
            skill,
            topic,
            score,
        })
        .await?;
    debug!(
        "Topic {}/{} in session {}: attempts={}, avg={:?}",
        skill, topic, session.id, row.attempts, row.avg_overall
    );
    Ok(row)
}

/// Ranks aggregates worst first. Rows are expected in insertion order, which
/// breaks ties. Rows without a mean are skipped.
pub fn rank_from_aggregates(rows: &[TopicProgressRow], limit: usize) -> Vec<WeakTopic> {
    let mut ranked: Vec<WeakTopic> = rows
        .iter()
        .filter_map(|row| {
            row.avg_overall.map(|avg| WeakTopic {
                skill: row.skill.clone(),
                topic: row.topic.clone(),
                avg_overall: avg,
                attempts: row.attempts,
            })
        })
        .collect();
    ranked.sort_by(|a, b| a.avg_overall.total_cmp(&b.avg_overall));
    ranked.truncate(limit);
    ranked
}

/// Bootstrap ranking for sessions without aggregates: replays answered items
/// in grading order through the same online-mean update, so the result matches
/// what the aggregate table would hold.
pub fn rank_from_items(items: &[QaItemRow], limit: usize) -> Vec<WeakTopic> {
    let mut answered: Vec<&QaItemRow> = items.iter().filter(|i| i.overall.is_some()).collect();
    answered.sort_by_key(|i| (i.evaluated_at, i.id));

    let mut groups: Vec<WeakTopic> = Vec::new();
    for item in answered {
        let Some(score) = item.overall else { continue };
        match groups
            .iter_mut()
            .find(|g| g.skill == item.skill && g.topic == item.topic)
        {
            Some(group) => {
                group.avg_overall = online_mean(Some(group.avg_overall), group.attempts, score);
                group.attempts += 1;
            }
            None => groups.push(WeakTopic {
                skill: item.skill.clone(),
                topic: item.topic.clone(),
                avg_overall: score,
                attempts: 1,
            }),
        }
    }

    groups.sort_by(|a, b| a.avg_overall.total_cmp(&b.avg_overall));
    groups.truncate(limit);
    groups
}

/// Weakest topics of a session, from the aggregates when any exist.
pub async fn rank_weak_topics(
    store: &dyn PracticeStore,
    session_id: i64,
    limit: usize,
) -> Result<Vec<WeakTopic>, AppError> {
    let rows = store.list_topic_progress(session_id).await?;
    if !rows.is_empty() {
        return Ok(rank_from_aggregates(&rows, limit));
    }
    let items = store.list_qa_items(session_id).await?;
    Ok(rank_from_items(&items, limit))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::types::Json;

    use super::*;
    use crate::models::qa_item::{
        EvaluationRecord, Feedback, NewQaItem, Provenance, QuestionFormat, RubricScores,
    };
    use crate::models::session::NewSession;
    use crate::store::memory::MemoryStore;
    use crate::store::InsertOutcome;

    fn item(id: i64, skill: &str, topic: &str, overall: Option<f64>, minutes: i64) -> QaItemRow {
        let created = Utc::now();
        QaItemRow {
            id,
            session_id: 1,
            skill: skill.to_string(),
            topic: topic.to_string(),
            question_type: "conceptual".to_string(),
            format: "open_ended".to_string(),
            difficulty: 3,
            question: format!("Question {id}"),
            question_hash: None,
            mcq: None,
            user_answer: None,
            model_answer: None,
            overall,
            scores: None,
            feedback: None,
            provenance: Some(Json(Provenance::default())),
            created_at: created,
            evaluated_at: overall.map(|_| created + Duration::minutes(minutes)),
        }
    }

    #[test]
    fn test_online_mean_matches_arithmetic_mean() {
        let values = [4.2, 3.0, 1.5, 5.0, 0.0, 2.75];
        let mut avg = None;
        for (n, v) in values.iter().enumerate() {
            avg = Some(online_mean(avg, n as i32, *v));
        }
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_online_mean_seeds_from_first_value() {
        assert_eq!(online_mean(None, 0, 4.2), 4.2);
        assert_eq!(online_mean(Some(1.0), 0, 4.2), 4.2);
        assert_eq!(online_mean(None, 3, 2.0), 2.0);
    }

    #[test]
    fn test_rank_from_items_groups_by_skill_and_topic() {
        let items = vec![
            item(1, "SQL", "joins", Some(4.0), 1),
            item(2, "DSA", "heaps", Some(2.0), 2),
            item(3, "SQL", "joins", Some(2.0), 3),
            item(4, "SQL", "indexes", None, 0),
            item(5, "DSA", "joins", Some(3.0), 4),
        ];
        let ranked = rank_from_items(&items, 5);
        let order: Vec<(&str, &str, f64, i32)> = ranked
            .iter()
            .map(|w| (w.skill.as_str(), w.topic.as_str(), w.avg_overall, w.attempts))
            .collect();
        assert_eq!(
            order,
            vec![
                ("DSA", "heaps", 2.0, 1),
                ("SQL", "joins", 3.0, 2),
                ("DSA", "joins", 3.0, 1),
            ]
        );
        assert_eq!(rank_from_items(&items, 1).len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_matches_aggregate_ranking() {
        let store = MemoryStore::new();
        let session = store
            .create_session(NewSession {
                user_id: 1,
                mode: "learn".to_string(),
                domain: None,
                role: None,
                track: "backend".to_string(),
                level: "advanced".to_string(),
                interview_type: None,
                difficulty_current: 3,
                conversation_state: None,
            })
            .await
            .unwrap();

        let history = [
            ("SQL", "joins", 4.2),
            ("DSA", "graphs", 1.4),
            ("SQL", "joins", 3.0),
            ("SQL", "indexes", 3.3),
            ("DSA", "graphs", 2.6),
            ("SQL", "indexes", 2.9),
            ("SQL", "joins", 0.7),
        ];

        for (n, (skill, topic, score)) in history.iter().enumerate() {
            let InsertOutcome::Inserted(row) = store
                .insert_qa_item(NewQaItem {
                    session_id: session.id,
                    skill: skill.to_string(),
                    topic: topic.to_string(),
                    question_type: "conceptual".to_string(),
                    format: QuestionFormat::OpenEnded,
                    difficulty: 3,
                    question: format!("Question number {n}"),
                    question_hash: Some(format!("hash-{n}")),
                    mcq: None,
                    provenance: Provenance::default(),
                })
                .await
                .unwrap()
            else {
                panic!("unexpected duplicate");
            };
            store
                .record_evaluation(
                    row.id,
                    &EvaluationRecord {
                        overall: *score,
                        scores: RubricScores {
                            correctness: 3,
                            completeness: 3,
                            clarity: 3,
                            depth: 3,
                            reasoning: 3,
                        },
                        feedback: Feedback::Rubric {
                            strengths: vec![],
                            gaps: vec![],
                            improvements: vec![],
                            next_drill_topic: String::new(),
                        },
                        model_answer: String::new(),
                        provenance: Provenance::default(),
                    },
                )
                .await
                .unwrap();
        }

        // No aggregates yet: fallback path.
        let fallback = rank_weak_topics(&store, session.id, 5).await.unwrap();

        for (skill, topic, score) in history {
            record_attempt(&store, &session, skill, topic, score).await.unwrap();
        }
        let aggregated = rank_weak_topics(&store, session.id, 5).await.unwrap();

        assert_eq!(fallback, aggregated);
        assert_eq!(aggregated.len(), 3);
        assert!(aggregated
            .windows(2)
            .all(|w| w[0].avg_overall <= w[1].avg_overall));
        assert_eq!(aggregated[0].topic, "graphs");
    }
}
