use serde::Deserialize;
use ts_rs::TS;

use super::entities::{CriterionScore, EvaluationStatus};

/// 触发互评分配请求
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct TriggerPeerEvaluationRequest {
    // 固定随机种子可复现分配结果
    #[ts(type = "number | null")]
    pub seed: Option<u64>,
    pub evaluations_per_submission: Option<u32>,
    pub max_evaluations_per_student: Option<u32>,
}

/// 开始评价请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct StartEvaluationRequest {
    pub evaluator_id: i64,
}

/// 提交评分请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct SubmitEvaluationRequest {
    pub evaluator_id: i64,
    pub criteria_scores: Vec<CriterionScore>,
    pub overall_feedback: Option<String>,
}

/// 复核评价请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct ReviewEvaluationRequest {
    pub note: Option<String>,
}

/// 改派评价人请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct ReassignEvaluationRequest {
    pub new_evaluator_id: i64,
    pub reason: String,
}

/// 查询用户互评任务参数
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct UserEvaluationQuery {
    pub status: Option<EvaluationStatus>,
}
