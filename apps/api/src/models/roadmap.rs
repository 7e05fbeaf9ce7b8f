use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapMicroTask {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub drill_prompt: String,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub expected_output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapPlan {
    #[serde(default)]
    pub two_week_plan: String,
    #[serde(default)]
    pub micro_tasks: Vec<RoadmapMicroTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub id: i64,
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub title: String,
    pub duration_days: i32,
    pub plan: Json<RoadmapPlan>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRoadmap {
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub title: String,
    pub duration_days: i32,
    pub plan: RoadmapPlan,
}
