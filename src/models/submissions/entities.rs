use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{HWSystemError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub homework_id: i64,
    pub creator_id: i64,
    pub content: String,
    pub status: SubmissionStatus,
    // 由互评记录派生的分配镜像，可随时重建
    pub evaluation_assignments: Vec<EvaluationAssignment>,
    pub final_evaluation: Option<FinalEvaluation>,
    // 每次写入递增，用于乐观并发控制
    pub revision: i32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// 所有分配条目均已完成（空列表不算完成）
    pub fn all_assignments_completed(&self) -> bool {
        !self.evaluation_assignments.is_empty()
            && self
                .evaluation_assignments
                .iter()
                .all(|a| a.status == AssignmentStatus::Completed)
    }
}

/// 提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    UnderEvaluation,
    Evaluated,
    Finalized,
    Returned,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::UnderEvaluation => "under_evaluation",
            SubmissionStatus::Evaluated => "evaluated",
            SubmissionStatus::Finalized => "finalized",
            SubmissionStatus::Returned => "returned",
        }
    }

    /// 显式操作允许的状态迁移
    ///
    /// 互评镜像的派生状态（submitted/under_evaluation/evaluated 之间）由
    /// 投影逻辑负责，不经过这里。
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted, UnderEvaluation)
                | (UnderEvaluation, Evaluated)
                | (Evaluated, UnderEvaluation)
                | (Evaluated, Finalized)
                | (Finalized, Finalized)
                | (Finalized, Returned)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = HWSystemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(SubmissionStatus::Draft),
            "submitted" => Ok(SubmissionStatus::Submitted),
            "under_evaluation" => Ok(SubmissionStatus::UnderEvaluation),
            "evaluated" => Ok(SubmissionStatus::Evaluated),
            "finalized" => Ok(SubmissionStatus::Finalized),
            "returned" => Ok(SubmissionStatus::Returned),
            other => Err(HWSystemError::serialization(format!(
                "未知的提交状态: {other}"
            ))),
        }
    }
}

/// 分配条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
}

/// 提交上的互评分配条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct EvaluationAssignment {
    pub evaluation_id: i64,
    pub evaluator_id: i64,
    pub status: AssignmentStatus,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 汇总后的最终评价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct FinalEvaluation {
    pub total_score: f64,
    pub max_score: f64,
    pub average_score: f64,
    pub percentage: f64,
    pub letter_grade: String,
    pub evaluation_count: i32,
    // 各评价的百分比分差不超过阈值
    pub consensus: bool,
    pub score_spread: f64,
    pub criteria_averages: Vec<CriterionAverage>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub finalized_at: DateTime<Utc>,
}

/// 单个评分项的平均分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct CriterionAverage {
    pub criterion: String,
    pub average_score: f64,
    pub max_score: f64,
    pub count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use SubmissionStatus::*;
        assert!(Draft.can_transition_to(Submitted));
        assert!(Submitted.can_transition_to(UnderEvaluation));
        assert!(Evaluated.can_transition_to(Finalized));
        assert!(Finalized.can_transition_to(Returned));

        assert!(!Draft.can_transition_to(UnderEvaluation));
        assert!(!Submitted.can_transition_to(Finalized));
        assert!(!UnderEvaluation.can_transition_to(Finalized));
        assert!(!Returned.can_transition_to(Submitted));
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&SubmissionStatus::UnderEvaluation).unwrap();
        assert_eq!(json, "\"under_evaluation\"");
        assert_eq!(
            "under_evaluation".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::UnderEvaluation
        );
    }
}
