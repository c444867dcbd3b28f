//! 提交侧的分配镜像
//!
//! 互评记录是唯一数据源，`Submission::evaluation_assignments` 和由其派生的
//! 提交状态都可以随时从互评记录重建。

use crate::models::peer_evaluations::entities::{EvaluationStatus, PeerEvaluation};
use crate::models::submissions::entities::{
    AssignmentStatus, EvaluationAssignment, Submission, SubmissionStatus,
};

/// 由互评记录生成分配条目（按互评 ID 升序）
pub fn project_assignments(evaluations: &[PeerEvaluation]) -> Vec<EvaluationAssignment> {
    let mut sorted: Vec<&PeerEvaluation> = evaluations.iter().collect();
    sorted.sort_by_key(|e| e.id);

    sorted
        .into_iter()
        .map(|e| EvaluationAssignment {
            evaluation_id: e.id,
            evaluator_id: e.evaluator_id,
            status: match e.status {
                EvaluationStatus::Assigned => AssignmentStatus::Assigned,
                EvaluationStatus::InProgress => AssignmentStatus::InProgress,
                _ => AssignmentStatus::Completed,
            },
            assigned_at: e.assigned_at,
            completed_at: if e.status.is_completed() {
                e.submitted_at
            } else {
                None
            },
        })
        .collect()
}

/// 根据分配条目推导提交状态
///
/// 草稿、已定稿和已退回的提交不受互评进度影响。
pub fn derive_status(
    current: SubmissionStatus,
    assignments: &[EvaluationAssignment],
) -> SubmissionStatus {
    match current {
        SubmissionStatus::Draft | SubmissionStatus::Finalized | SubmissionStatus::Returned => {
            current
        }
        _ if assignments.is_empty() => SubmissionStatus::Submitted,
        _ if assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::Completed) =>
        {
            SubmissionStatus::Evaluated
        }
        _ => SubmissionStatus::UnderEvaluation,
    }
}

/// 重建提交的分配镜像，已一致时返回 `None`
pub fn reconcile(submission: &Submission, evaluations: &[PeerEvaluation]) -> Option<Submission> {
    let assignments = project_assignments(evaluations);
    let status = derive_status(submission.status, &assignments);

    if assignments == submission.evaluation_assignments && status == submission.status {
        return None;
    }

    let mut updated = submission.clone();
    updated.evaluation_assignments = assignments;
    updated.status = status;
    Some(updated)
}
