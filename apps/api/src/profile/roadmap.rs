//! Study roadmaps built from the user's latest practice signal.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::CompletionGateway;
use crate::models::roadmap::{NewRoadmap, RoadmapMicroTask, RoadmapPlan, RoadmapRow};
use crate::models::session::SessionRow;
use crate::practice::evaluation::parse_model_object;
use crate::profile::prompts::{roadmap_prompt, ROADMAP_SYSTEM};
use crate::profile::resources::{is_youtube_search, youtube_search_url};
use crate::progress::aggregator::{rank_weak_topics, WEAK_TOPIC_LIMIT};
use crate::store::{owned_session, PracticeStore};

pub const MIN_ROADMAP_DAYS: i32 = 3;
pub const MAX_ROADMAP_DAYS: i32 = 60;
pub const DEFAULT_ROADMAP_DAYS: i32 = 14;

const FALLBACK_TASK_TOPIC: &str = "interview preparation";

fn default_duration() -> i32 {
    DEFAULT_ROADMAP_DAYS
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapGenerateRequest {
    /// Session to plan from. Defaults to the caller's latest session.
    pub session_id: Option<i64>,
    #[serde(default = "default_duration")]
    pub duration_days: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapResponse {
    pub roadmap: RoadmapRow,
}

/// Shape the model is asked to return.
#[derive(Debug, Clone, Deserialize)]
struct RoadmapJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration_days: Option<f64>,
    #[serde(default)]
    two_week_plan: String,
    #[serde(default)]
    micro_tasks: Vec<RoadmapMicroTask>,
}

/// Every task keeps at least one YouTube search link.
fn ensure_search_links(tasks: &mut [RoadmapMicroTask]) -> Result<(), AppError> {
    for task in tasks {
        if task.resources.iter().any(|r| is_youtube_search(r)) {
            continue;
        }
        let query = match task.topic.trim() {
            "" => FALLBACK_TASK_TOPIC,
            topic => topic,
        };
        task.resources.push(youtube_search_url(query)?);
    }
    Ok(())
}

/// The model's duration when it is in range, else the requested one.
fn resolve_duration(returned: Option<f64>, requested: i32) -> i32 {
    returned
        .filter(|d| d.is_finite())
        .map(|d| d.round() as i32)
        .filter(|d| (MIN_ROADMAP_DAYS..=MAX_ROADMAP_DAYS).contains(d))
        .unwrap_or(requested)
}

async fn planning_session(
    store: &dyn PracticeStore,
    user_id: i64,
    session_id: Option<i64>,
) -> Result<Option<SessionRow>, AppError> {
    match session_id {
        Some(id) => Ok(Some(owned_session(store, id, user_id).await?)),
        None => Ok(store.list_sessions(user_id, 1).await?.into_iter().next()),
    }
}

pub async fn generate_roadmap(
    store: &dyn PracticeStore,
    llm: &dyn CompletionGateway,
    user_id: i64,
    request: RoadmapGenerateRequest,
) -> Result<RoadmapResponse, AppError> {
    if !(MIN_ROADMAP_DAYS..=MAX_ROADMAP_DAYS).contains(&request.duration_days) {
        return Err(AppError::Validation(format!(
            "duration_days must be between {MIN_ROADMAP_DAYS} and {MAX_ROADMAP_DAYS}"
        )));
    }

    let session = planning_session(store, user_id, request.session_id).await?;
    let weak_topics: Vec<String> = match &session {
        Some(s) => rank_weak_topics(store, s.id, WEAK_TOPIC_LIMIT)
            .await?
            .into_iter()
            .map(|w| format!("{} / {} (avg {:.1})", w.skill, w.topic, w.avg_overall))
            .collect(),
        None => Vec::new(),
    };

    let profile = store.get_user_profile(user_id).await?;

    let context = json!({
        "user_id": user_id,
        "profile": profile.as_ref().map(|p| json!({
            "domain": p.domain,
            "role": p.role,
            "track": p.track,
            "level": p.level,
        })),
        "session": session.as_ref().map(|s| json!({
            "id": s.id,
            "mode": s.mode,
            "track": s.track,
            "level": s.level,
            "domain": s.domain,
            "role": s.role,
        })),
        "weak_topics": weak_topics,
        "duration_days": request.duration_days,
    });

    let raw = llm.complete(ROADMAP_SYSTEM, &roadmap_prompt(&context)).await?;
    let mut parsed: RoadmapJson = parse_model_object(&raw, "roadmap")?;
    ensure_search_links(&mut parsed.micro_tasks)?;

    let duration_days = resolve_duration(parsed.duration_days, request.duration_days);
    let title = match parsed.title.trim() {
        "" => format!("{duration_days}-day roadmap"),
        title => title.to_string(),
    };

    let roadmap = store
        .insert_roadmap(NewRoadmap {
            user_id,
            session_id: session.as_ref().map(|s| s.id),
            title,
            duration_days,
            plan: RoadmapPlan {
                two_week_plan: parsed.two_week_plan,
                micro_tasks: parsed.micro_tasks,
            },
        })
        .await?;

    info!(
        "Roadmap {} generated for user {} ({} days, {} tasks)",
        roadmap.id,
        user_id,
        roadmap.duration_days,
        roadmap.plan.micro_tasks.len()
    );
    Ok(RoadmapResponse { roadmap })
}

pub async fn latest_roadmap(store: &dyn PracticeStore, user_id: i64) -> Result<RoadmapRow, AppError> {
    store
        .latest_roadmap(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No roadmap found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::models::profile::ProfileFields;
    use crate::models::session::NewSession;
    use crate::store::memory::MemoryStore;
    use crate::store::AttemptRecord;

    const USER: i64 = 31;

    const PLAN: &str = r#"{
  "title": "Backend sprint",
  "duration_days": 90,
  "two_week_plan": "Week 1 SQL, week 2 system design.",
  "micro_tasks": [
    {"topic": "SQL joins", "drill_prompt": "Write three joins", "resources": ["https://www.youtube.com/results?search_query=sql+joins"], "expected_output": "Queries"},
    {"topic": "Caching", "drill_prompt": "Design a cache", "resources": ["https://redis.io/docs"], "expected_output": "Diagram"},
    {"drill_prompt": "Mock round", "expected_output": "Notes"}
  ]
}"#;

    async fn session_with_weak_topic(store: &MemoryStore) -> SessionRow {
        let session = store
            .create_session(NewSession {
                user_id: USER,
                mode: "learn".to_string(),
                domain: None,
                role: Some("Backend Developer".to_string()),
                track: "backend".to_string(),
                level: "intermediate".to_string(),
                interview_type: None,
                difficulty_current: 3,
                conversation_state: None,
            })
            .await
            .unwrap();
        store
            .record_attempt(AttemptRecord {
                session_id: session.id,
                track: "backend",
                skill: "SQL",
                topic: "joins",
                score: 1.5,
            })
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_generate_persists_and_links_every_task() {
        let store = MemoryStore::new();
        let session = session_with_weak_topic(&store).await;
        let llm = ScriptedGateway::ok([PLAN]);

        let response = generate_roadmap(
            &store,
            &llm,
            USER,
            RoadmapGenerateRequest {
                session_id: None,
                duration_days: DEFAULT_ROADMAP_DAYS,
            },
        )
        .await
        .unwrap();
        let roadmap = response.roadmap;

        assert_eq!(roadmap.session_id, Some(session.id));
        assert_eq!(roadmap.title, "Backend sprint");
        assert_eq!(roadmap.duration_days, 14);
        let tasks = &roadmap.plan.micro_tasks;
        assert_eq!(tasks[0].resources.len(), 1);
        assert_eq!(
            tasks[1].resources[1],
            "https://www.youtube.com/results?search_query=Caching"
        );
        assert_eq!(
            tasks[2].resources[0],
            "https://www.youtube.com/results?search_query=interview+preparation"
        );

        let prompt = llm.last_user_prompt().unwrap();
        assert!(prompt.contains("SQL / joins (avg 1.5)"));
        assert!(prompt.contains("Backend Developer"));

        assert_eq!(latest_roadmap(&store, USER).await.unwrap().id, roadmap.id);
    }

    #[tokio::test]
    async fn test_duration_out_of_range_is_rejected() {
        let store = MemoryStore::new();
        let llm = ScriptedGateway::ok(Vec::<String>::new());
        for days in [2, 61] {
            let result = generate_roadmap(
                &store,
                &llm,
                USER,
                RoadmapGenerateRequest {
                    session_id: None,
                    duration_days: days,
                },
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_session_and_missing_roadmap_are_not_found() {
        let store = MemoryStore::new();
        let session = session_with_weak_topic(&store).await;
        let llm = ScriptedGateway::ok([PLAN]);

        let result = generate_roadmap(
            &store,
            &llm,
            USER + 1,
            RoadmapGenerateRequest {
                session_id: Some(session.id),
                duration_days: 7,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(
            latest_roadmap(&store, USER).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_only_roadmap_without_sessions() {
        let store = MemoryStore::new();
        store
            .upsert_user_profile(
                USER,
                &ProfileFields {
                    domain: Some("Fintech".to_string()),
                    role: Some("Frontend Engineer".to_string()),
                    track: Some("frontend".to_string()),
                    level: None,
                },
            )
            .await
            .unwrap();
        let llm = ScriptedGateway::ok([r#"{"micro_tasks": []}"#]);
        let roadmap = generate_roadmap(
            &store,
            &llm,
            USER,
            RoadmapGenerateRequest {
                session_id: None,
                duration_days: 10,
            },
        )
        .await
        .unwrap()
        .roadmap;
        assert_eq!(roadmap.session_id, None);
        assert_eq!(roadmap.title, "10-day roadmap");
        let prompt = llm.last_user_prompt().unwrap();
        assert!(prompt.contains("\"session\":null"));
        assert!(prompt.contains("\"role\":\"Frontend Engineer\""));
        assert!(prompt.contains("\"track\":\"frontend\""));
    }

    #[test]
    fn test_default_duration_on_deserialize() {
        let request: RoadmapGenerateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.duration_days, 14);
        assert_eq!(request.session_id, None);
    }
}
