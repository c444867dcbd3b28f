//! 互评改派
//!
//! 把一条尚未提交评分的互评记录转给另一位评价人。

use chrono::Utc;
use tracing::info;

use super::coordinator::PeerEvaluationCoordinator;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::entities::PeerEvaluationConfig;
use crate::models::peer_evaluations::entities::{EvaluationStatus, PeerEvaluation};
use crate::models::submissions::entities::SubmissionStatus;

impl PeerEvaluationCoordinator {
    /// 改派评价人
    ///
    /// 改派后记录回到 assigned 并标记待复核。写入按 revision 比较，与评分提交
    /// 并发时只有一方成功，另一方收到 `ConcurrentModification`。
    pub async fn reassign(
        &self,
        evaluation_id: i64,
        new_evaluator_id: i64,
        reason: &str,
    ) -> Result<PeerEvaluation> {
        let mut evaluation = self.load_evaluation(evaluation_id).await?;

        if !evaluation.status.is_reassignable() {
            return Err(HWSystemError::invalid_state(format!(
                "互评记录 {evaluation_id} 当前状态为 {}，只有 assigned 或 in_progress 的记录可以改派",
                evaluation.status
            )));
        }

        if new_evaluator_id == evaluation.submitter_id {
            return Err(HWSystemError::self_evaluation_violation(format!(
                "用户 {new_evaluator_id} 是提交 {} 的作者，不能评价自己的提交",
                evaluation.submission_id
            )));
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(HWSystemError::validation("改派原因不能为空"));
        }
        if new_evaluator_id == evaluation.evaluator_id {
            return Err(HWSystemError::validation(format!(
                "用户 {new_evaluator_id} 已经是该记录的评价人"
            )));
        }

        let siblings = self
            .storage()
            .list_peer_evaluations_by_submission(evaluation.submission_id)
            .await?;
        if siblings
            .iter()
            .any(|e| e.id != evaluation.id && e.evaluator_id == new_evaluator_id)
        {
            return Err(HWSystemError::validation(format!(
                "用户 {new_evaluator_id} 已被分配评价提交 {}",
                evaluation.submission_id
            )));
        }

        // 评价人必须是本作业的参与者（有非草稿提交）
        let participating = self
            .storage()
            .list_submissions_by_homework(evaluation.homework_id, None)
            .await?
            .iter()
            .any(|s| s.creator_id == new_evaluator_id && s.status != SubmissionStatus::Draft);
        if !participating {
            return Err(HWSystemError::validation(format!(
                "用户 {new_evaluator_id} 没有参与作业 {}，不能作为评价人",
                evaluation.homework_id
            )));
        }

        let homework = self.load_homework(evaluation.homework_id).await?;
        let max_workload =
            PeerEvaluationConfig::from_homework(&homework).max_evaluations_per_student;
        let live = self
            .storage()
            .list_peer_evaluations_by_evaluator(new_evaluator_id, None)
            .await?
            .iter()
            .filter(|e| e.homework_id == evaluation.homework_id && e.status.is_live())
            .count();
        if live >= max_workload as usize {
            return Err(HWSystemError::workload_violation(format!(
                "用户 {new_evaluator_id} 在该作业已有 {live} 份进行中的评价，上限为 {max_workload}"
            )));
        }

        let previous = evaluation.evaluator_id;
        evaluation.evaluator_id = new_evaluator_id;
        evaluation.status = EvaluationStatus::Assigned;
        evaluation.started_at = None;
        evaluation.assigned_at = Utc::now();
        evaluation.needs_review = true;
        evaluation.review_note = Some(format!(
            "评价人由 {previous} 改派为 {new_evaluator_id}，原因: {reason}"
        ));
        let updated = self.storage().update_peer_evaluation(&evaluation).await?;

        info!(
            "Evaluation {} reassigned from {} to {}",
            updated.id, previous, new_evaluator_id
        );

        self.sync_projection_after_commit(updated.submission_id)
            .await?;
        Ok(updated)
    }
}
