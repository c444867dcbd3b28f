use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use super::entities::{CriterionScore, EvaluationStatus, PeerEvaluation};

/// 一条分配结果（评价人 -> 提交）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct AssignmentPairView {
    pub evaluation_id: i64,
    pub submission_id: i64,
    pub submitter_id: i64,
    pub evaluator_id: i64,
    pub priority: i32,
}

/// 分配统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct AllocationStatistics {
    pub total_evaluations: usize,
    // 至少被分配一次评价的学生数
    pub evaluator_count: usize,
    // 至少有一位评价人的提交数
    pub covered_submissions: usize,
    pub min_workload: usize,
    pub max_workload: usize,
    pub average_workload: f64,
    pub min_coverage: usize,
    pub max_coverage: usize,
    pub average_coverage: f64,
    pub under_assigned_submissions: usize,
}

/// 评价人不足的提交
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct UnderAssignmentWarning {
    pub submission_id: i64,
    pub requested: u32,
    pub assigned: u32,
}

/// 触发互评分配响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct TriggerPeerEvaluationResponse {
    pub homework_id: i64,
    pub round: i32,
    pub total_evaluations: usize,
    pub assignments: Vec<AssignmentPairView>,
    pub statistics: AllocationStatistics,
    pub warnings: Vec<UnderAssignmentWarning>,
}

/// 作业互评进度
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct EvaluationProgressResponse {
    pub homework_id: i64,
    pub total_evaluations: i64,
    pub completed_evaluations: i64,
    // 保留两位小数
    pub progress_percentage: f64,
    // 所有状态都会出现，没有记录的状态为 0
    pub status_breakdown: HashMap<String, i64>,
    pub needs_review_count: i64,
}

/// 对账结果
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct ReconciliationReport {
    pub homework_id: i64,
    pub checked: usize,
    // 被修复的提交 ID
    pub repaired: Vec<i64>,
    pub phase_repaired: bool,
}

/// 评价人视角的互评任务
///
/// 匿名互评时不返回被评价者 ID。
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct EvaluatorAssignmentItem {
    pub id: i64,
    pub homework_id: i64,
    pub submission_id: i64,
    pub submitter_id: Option<i64>,
    pub status: EvaluationStatus,
    pub criteria_scores: Vec<CriterionScore>,
    pub total_score: Option<f64>,
    pub max_total_score: f64,
    pub overall_feedback: Option<String>,
    pub due_date: DateTime<Utc>,
    pub round: i32,
    pub priority: i32,
    pub needs_review: bool,
    pub assigned_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl EvaluatorAssignmentItem {
    pub fn from_evaluation(evaluation: PeerEvaluation, anonymous: bool) -> Self {
        Self {
            id: evaluation.id,
            homework_id: evaluation.homework_id,
            submission_id: evaluation.submission_id,
            submitter_id: (!anonymous).then_some(evaluation.submitter_id),
            status: evaluation.status,
            criteria_scores: evaluation.criteria_scores,
            total_score: evaluation.total_score,
            max_total_score: evaluation.max_total_score,
            overall_feedback: evaluation.overall_feedback,
            due_date: evaluation.due_date,
            round: evaluation.round,
            priority: evaluation.priority,
            needs_review: evaluation.needs_review,
            assigned_at: evaluation.assigned_at,
            submitted_at: evaluation.submitted_at,
        }
    }
}

/// 评价人任务列表
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct EvaluatorAssignmentListResponse {
    pub user_id: i64,
    pub items: Vec<EvaluatorAssignmentItem>,
}
