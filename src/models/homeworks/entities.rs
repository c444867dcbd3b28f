use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{HWSystemError, Result};

/// 每份提交的评价人数允许范围
pub const EVALUATIONS_PER_SUBMISSION_RANGE: RangeInclusive<u32> = 1..=5;
/// 每位学生最多承担的评价数允许范围
pub const MAX_EVALUATIONS_PER_STUDENT_RANGE: RangeInclusive<u32> = 1..=10;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub struct Homework {
    // 唯一 ID
    pub id: i64,
    // 关联的班级 ID
    pub class_id: i64,
    // 作业标题
    pub title: String,
    // 作业描述
    pub content: Option<String>,
    // 作业最高分数（也是每份互评的满分）
    pub max_score: f64,
    // 作业截止时间
    pub deadline: Option<DateTime<Utc>>,
    // 每份提交需要的评价人数
    pub evaluations_per_submission: i32,
    // 每位学生最多承担的评价数
    pub max_evaluations_per_student: i32,
    // 是否允许自评
    pub allow_self_evaluation: bool,
    // 是否匿名互评（仅影响前端展示）
    pub anonymous_evaluation: bool,
    // 互评截止时间
    pub evaluation_deadline: Option<DateTime<Utc>>,
    // 互评阶段
    pub evaluation_phase: EvaluationPhase,
    // 创建者 ID
    pub created_by: i64,
    // 作业创建时间
    pub created_at: DateTime<Utc>,
    // 作业更新时间
    pub updated_at: DateTime<Utc>,
}

/// 作业的互评阶段，用于防止重复触发分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/homework.ts")]
pub enum EvaluationPhase {
    SubmissionPhase,
    Allocating,
    EvaluationPhase,
}

impl EvaluationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationPhase::SubmissionPhase => "submission_phase",
            EvaluationPhase::Allocating => "allocating",
            EvaluationPhase::EvaluationPhase => "evaluation_phase",
        }
    }
}

impl fmt::Display for EvaluationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationPhase {
    type Err = HWSystemError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submission_phase" => Ok(EvaluationPhase::SubmissionPhase),
            "allocating" => Ok(EvaluationPhase::Allocating),
            "evaluation_phase" => Ok(EvaluationPhase::EvaluationPhase),
            other => Err(HWSystemError::serialization(format!(
                "未知的互评阶段: {other}"
            ))),
        }
    }
}

/// 单次互评分配使用的不可变配置
///
/// 在触发时从作业读取一次并校验，之后整个批次只读。
#[derive(Debug, Clone, PartialEq)]
pub struct PeerEvaluationConfig {
    pub evaluations_per_submission: u32,
    pub max_evaluations_per_student: u32,
    pub allow_self_evaluation: bool,
    pub anonymous_evaluation: bool,
    pub evaluation_deadline: Option<DateTime<Utc>>,
}

impl Default for PeerEvaluationConfig {
    fn default() -> Self {
        Self {
            evaluations_per_submission: 2,
            max_evaluations_per_student: 3,
            allow_self_evaluation: false,
            anonymous_evaluation: true,
            evaluation_deadline: None,
        }
    }
}

impl PeerEvaluationConfig {
    /// 从作业配置构建，非正数视为未配置并使用默认值
    pub fn from_homework(homework: &Homework) -> Self {
        let defaults = Self::default();
        Self {
            evaluations_per_submission: u32::try_from(homework.evaluations_per_submission)
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(defaults.evaluations_per_submission),
            max_evaluations_per_student: u32::try_from(homework.max_evaluations_per_student)
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_evaluations_per_student),
            allow_self_evaluation: homework.allow_self_evaluation,
            anonymous_evaluation: homework.anonymous_evaluation,
            evaluation_deadline: homework.evaluation_deadline,
        }
    }

    /// 应用触发时的临时覆盖
    pub fn with_overrides(
        mut self,
        evaluations_per_submission: Option<u32>,
        max_evaluations_per_student: Option<u32>,
    ) -> Self {
        if let Some(value) = evaluations_per_submission {
            self.evaluations_per_submission = value;
        }
        if let Some(value) = max_evaluations_per_student {
            self.max_evaluations_per_student = value;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !EVALUATIONS_PER_SUBMISSION_RANGE.contains(&self.evaluations_per_submission) {
            return Err(HWSystemError::validation(format!(
                "每份提交的评价人数必须在 {}-{} 之间，当前为 {}",
                EVALUATIONS_PER_SUBMISSION_RANGE.start(),
                EVALUATIONS_PER_SUBMISSION_RANGE.end(),
                self.evaluations_per_submission
            )));
        }
        if !MAX_EVALUATIONS_PER_STUDENT_RANGE.contains(&self.max_evaluations_per_student) {
            return Err(HWSystemError::validation(format!(
                "每位学生最多评价数必须在 {}-{} 之间，当前为 {}",
                MAX_EVALUATIONS_PER_STUDENT_RANGE.start(),
                MAX_EVALUATIONS_PER_STUDENT_RANGE.end(),
                self.max_evaluations_per_student
            )));
        }
        Ok(())
    }
}
