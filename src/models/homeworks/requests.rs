use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

/// 创建作业请求
///
/// 作业的增删改由外部课程系统负责，这里只用于初始化数据和测试。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct CreateHomeworkRequest {
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: Option<String>,
    pub max_score: Option<f64>,
    pub deadline: Option<DateTime<Utc>>, // ISO 8601 格式，如 "2026-01-24T12:00:00Z"
    pub evaluations_per_submission: Option<i32>,
    pub max_evaluations_per_student: Option<i32>,
    pub allow_self_evaluation: Option<bool>,
    pub anonymous_evaluation: Option<bool>,
    pub evaluation_deadline: Option<DateTime<Utc>>,
}
