//! Read-only dashboard projection of a session.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::qa_item::QaItemRow;
use crate::models::session::SessionRow;
use crate::progress::aggregator::{rank_weak_topics, WeakTopic, WEAK_TOPIC_LIMIT};
use crate::store::{owned_session, PracticeStore};

pub const RECENT_ITEMS: usize = 20;
pub const QUESTION_PREVIEW_CHARS: usize = 220;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub questions_total: usize,
    pub answered: usize,
    pub avg_overall: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentItem {
    pub id: i64,
    pub skill: String,
    pub topic: String,
    pub question_type: String,
    pub difficulty: i32,
    pub overall: Option<f64>,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillBreakdown {
    pub skill: String,
    pub avg_overall: f64,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub session_id: i64,
    pub mode: String,
    pub track: String,
    pub level: String,
    pub totals: Totals,
    pub recent: Vec<RecentItem>,
    pub weak_topics: Vec<WeakTopic>,
    pub by_skill: Vec<SkillBreakdown>,
}

/// Cuts a question to the preview length, marking the cut with `…`.
pub fn preview(question: &str) -> String {
    if question.chars().count() > QUESTION_PREVIEW_CHARS {
        let mut cut: String = question.chars().take(QUESTION_PREVIEW_CHARS).collect();
        cut.push('…');
        cut
    } else {
        question.to_string()
    }
}

pub fn totals(items: &[QaItemRow]) -> Totals {
    let scores: Vec<f64> = items.iter().filter_map(|i| i.overall).collect();
    Totals {
        questions_total: items.len(),
        answered: scores.len(),
        avg_overall: (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64),
    }
}

/// Mean overall per skill over answered items, weakest first.
pub fn skill_breakdown(items: &[QaItemRow]) -> Vec<SkillBreakdown> {
    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    for item in items {
        let Some(score) = item.overall else { continue };
        match sums.iter_mut().find(|(skill, _, _)| *skill == item.skill) {
            Some(entry) => {
                entry.1 += score;
                entry.2 += 1;
            }
            None => sums.push((item.skill.clone(), score, 1)),
        }
    }

    let mut breakdown: Vec<SkillBreakdown> = sums
        .into_iter()
        .map(|(skill, sum, n)| SkillBreakdown {
            skill,
            avg_overall: sum / n as f64,
            attempts: n,
        })
        .collect();
    breakdown.sort_by(|a, b| a.avg_overall.total_cmp(&b.avg_overall));
    breakdown
}

/// Newest first, capped at `RECENT_ITEMS`.
pub fn recent_items(items: &[QaItemRow]) -> Vec<RecentItem> {
    let mut newest: Vec<&QaItemRow> = items.iter().collect();
    newest.sort_by(|a, b| b.id.cmp(&a.id));
    newest
        .into_iter()
        .take(RECENT_ITEMS)
        .map(|item| RecentItem {
            id: item.id,
            skill: item.skill.clone(),
            topic: item.topic.clone(),
            question_type: item.question_type.clone(),
            difficulty: item.difficulty,
            overall: item.overall,
            question: preview(&item.question),
        })
        .collect()
}

pub fn build_dashboard(session: &SessionRow, items: &[QaItemRow], weak_topics: Vec<WeakTopic>) -> Dashboard {
    Dashboard {
        session_id: session.id,
        mode: session.mode.clone(),
        track: session.track.clone(),
        level: session.level.clone(),
        totals: totals(items),
        recent: recent_items(items),
        weak_topics,
        by_skill: skill_breakdown(items),
    }
}

pub async fn session_dashboard(
    store: &dyn PracticeStore,
    user_id: i64,
    session_id: i64,
) -> Result<Dashboard, AppError> {
    let session = owned_session(store, session_id, user_id).await?;
    dashboard_for(store, &session).await
}

/// Dashboard of the caller's most recent session.
pub async fn my_dashboard(store: &dyn PracticeStore, user_id: i64) -> Result<Dashboard, AppError> {
    let session = store
        .list_sessions(user_id, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("No sessions yet".to_string()))?;
    dashboard_for(store, &session).await
}

async fn dashboard_for(store: &dyn PracticeStore, session: &SessionRow) -> Result<Dashboard, AppError> {
    let items = store.list_qa_items(session.id).await?;
    let weak = rank_weak_topics(store, session.id, WEAK_TOPIC_LIMIT).await?;
    Ok(build_dashboard(session, &items, weak))
}
