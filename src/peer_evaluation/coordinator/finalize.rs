use chrono::Utc;
use tracing::info;

use super::PeerEvaluationCoordinator;
use crate::errors::{HWSystemError, Result};
use crate::models::peer_evaluations::entities::EvaluationStatus;
use crate::models::submissions::entities::{FinalEvaluation, Submission, SubmissionStatus};
use crate::peer_evaluation::{grading, projection};

impl PeerEvaluationCoordinator {
    /// 汇总提交的最终成绩
    ///
    /// 没有已完成的评价时返回 `None`。参与汇总的评价会被锁定为 finalized，
    /// 提交变为 finalized；已定稿的提交可以重新汇总。
    pub async fn compile_final_evaluation(
        &self,
        submission_id: i64,
    ) -> Result<Option<FinalEvaluation>> {
        let _guard = self.locks.acquire(submission_id).await;

        let submission = self.load_submission(submission_id).await?;
        let evaluations = self
            .storage
            .list_peer_evaluations_by_submission(submission_id)
            .await?;

        let Some(final_evaluation) =
            grading::compile(&evaluations, self.settings.consensus_threshold, Utc::now())
        else {
            return Ok(None);
        };

        if !matches!(
            submission.status,
            SubmissionStatus::Evaluated | SubmissionStatus::Finalized
        ) {
            return Err(HWSystemError::invalid_state(format!(
                "提交 {submission_id} 当前状态为 {}，所有评价完成后才能汇总成绩",
                submission.status
            )));
        }

        for evaluation in evaluations
            .iter()
            .filter(|e| e.status.can_transition_to(EvaluationStatus::Finalized))
        {
            let mut locked = evaluation.clone();
            locked.status = EvaluationStatus::Finalized;
            self.storage.update_peer_evaluation(&locked).await?;
        }

        let compiled = final_evaluation.clone();
        self.with_retry("persist final evaluation", || {
            let compiled = compiled.clone();
            async move {
                let submission = self.load_submission(submission_id).await?;
                let evaluations = self
                    .storage
                    .list_peer_evaluations_by_submission(submission_id)
                    .await?;
                let mut updated =
                    projection::reconcile(&submission, &evaluations).unwrap_or(submission);
                updated.status = SubmissionStatus::Finalized;
                updated.final_evaluation = Some(compiled);
                self.storage.update_submission(&updated).await
            }
        })
        .await?;

        info!(
            "Submission {} finalized: {:.2}/{} ({}) from {} evaluations",
            submission_id,
            final_evaluation.average_score,
            final_evaluation.max_score,
            final_evaluation.letter_grade,
            final_evaluation.evaluation_count
        );
        Ok(Some(final_evaluation))
    }

    /// 退回已定稿的提交：finalized -> returned
    pub async fn return_submission(&self, submission_id: i64) -> Result<Submission> {
        let _guard = self.locks.acquire(submission_id).await;

        let mut submission = self.load_submission(submission_id).await?;
        if !submission
            .status
            .can_transition_to(SubmissionStatus::Returned)
        {
            return Err(HWSystemError::invalid_state(format!(
                "提交 {submission_id} 当前状态为 {}，只有已定稿的提交可以退回",
                submission.status
            )));
        }

        submission.status = SubmissionStatus::Returned;
        self.storage.update_submission(&submission).await
    }
}
