use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{HWSystemError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct PeerEvaluation {
    pub id: i64,
    pub homework_id: i64,
    pub submission_id: i64,
    // 被评价提交的作者
    pub submitter_id: i64,
    pub evaluator_id: i64,
    pub status: EvaluationStatus,
    pub criteria_scores: Vec<CriterionScore>,
    pub total_score: Option<f64>,
    // 满分，等于作业的 max_score
    pub max_total_score: f64,
    pub overall_feedback: Option<String>,
    pub due_date: DateTime<Utc>,
    // 第几轮互评分配
    pub round: i32,
    // 在同一提交的评价人中的排序（从 1 开始）
    pub priority: i32,
    pub needs_review: bool,
    pub review_note: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 互评状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub enum EvaluationStatus {
    Assigned,
    InProgress,
    Submitted,
    Reviewed,
    Finalized,
}

impl EvaluationStatus {
    pub const ALL: [EvaluationStatus; 5] = [
        EvaluationStatus::Assigned,
        EvaluationStatus::InProgress,
        EvaluationStatus::Submitted,
        EvaluationStatus::Reviewed,
        EvaluationStatus::Finalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Assigned => "assigned",
            EvaluationStatus::InProgress => "in_progress",
            EvaluationStatus::Submitted => "submitted",
            EvaluationStatus::Reviewed => "reviewed",
            EvaluationStatus::Finalized => "finalized",
        }
    }

    /// 尚未提交评分，可以改派
    pub fn is_reassignable(&self) -> bool {
        matches!(self, EvaluationStatus::Assigned | EvaluationStatus::InProgress)
    }

    /// 已产出评分
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            EvaluationStatus::Submitted | EvaluationStatus::Reviewed | EvaluationStatus::Finalized
        )
    }

    /// 计入评价人工作量
    pub fn is_live(&self) -> bool {
        !matches!(self, EvaluationStatus::Finalized)
    }

    pub fn can_transition_to(&self, next: EvaluationStatus) -> bool {
        use EvaluationStatus::*;
        matches!(
            (self, next),
            (Assigned, InProgress)
                | (Assigned, Submitted)
                | (InProgress, Submitted)
                | (Submitted, Reviewed)
                | (Submitted, Finalized)
                | (Reviewed, Finalized)
        )
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationStatus {
    type Err = HWSystemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "assigned" => Ok(EvaluationStatus::Assigned),
            "in_progress" => Ok(EvaluationStatus::InProgress),
            "submitted" => Ok(EvaluationStatus::Submitted),
            "reviewed" => Ok(EvaluationStatus::Reviewed),
            "finalized" => Ok(EvaluationStatus::Finalized),
            other => Err(HWSystemError::serialization(format!(
                "未知的互评状态: {other}"
            ))),
        }
    }
}

/// 单个评分项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/peer_evaluation.ts")]
pub struct CriterionScore {
    pub criterion: String,
    pub score: f64,
    pub max_score: f64,
    pub comment: Option<String>,
}

/// 待写入的互评记录，由分配结果生成
#[derive(Debug, Clone, PartialEq)]
pub struct NewPeerEvaluation {
    pub homework_id: i64,
    pub submission_id: i64,
    pub submitter_id: i64,
    pub evaluator_id: i64,
    pub max_total_score: f64,
    pub due_date: DateTime<Utc>,
    pub round: i32,
    pub priority: i32,
}
