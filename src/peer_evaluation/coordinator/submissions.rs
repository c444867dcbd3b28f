use chrono::Utc;
use tracing::info;

use super::PeerEvaluationCoordinator;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::entities::EvaluationPhase;
use crate::models::submissions::{
    entities::{Submission, SubmissionStatus},
    requests::SaveSubmissionRequest,
};

impl PeerEvaluationCoordinator {
    /// 保存草稿，首次保存时创建提交
    pub async fn save_submission(
        &self,
        homework_id: i64,
        req: SaveSubmissionRequest,
    ) -> Result<Submission> {
        self.load_homework(homework_id).await?;
        if req.content.trim().is_empty() {
            return Err(HWSystemError::validation("提交内容不能为空"));
        }

        self.storage
            .save_submission(homework_id, req.creator_id, req.content)
            .await
    }

    /// 正式提交：draft -> submitted，只能在作业的提交阶段进行
    pub async fn submit_submission(
        &self,
        submission_id: i64,
        creator_id: i64,
    ) -> Result<Submission> {
        let _guard = self.locks.acquire(submission_id).await;

        let mut submission = self.load_submission(submission_id).await?;
        if submission.creator_id != creator_id {
            return Err(HWSystemError::authorization(format!(
                "用户 {creator_id} 不是提交 {submission_id} 的作者"
            )));
        }

        let homework = self.load_homework(submission.homework_id).await?;
        if homework.evaluation_phase != EvaluationPhase::SubmissionPhase {
            return Err(HWSystemError::invalid_state(format!(
                "作业 {} 已进入 {} 阶段，不再接受提交",
                homework.id, homework.evaluation_phase
            )));
        }

        if !submission
            .status
            .can_transition_to(SubmissionStatus::Submitted)
        {
            return Err(HWSystemError::invalid_state(format!(
                "提交 {submission_id} 当前状态为 {}，不能再次提交",
                submission.status
            )));
        }

        submission.status = SubmissionStatus::Submitted;
        submission.submitted_at = Some(Utc::now());
        let updated = self.storage.update_submission(&submission).await?;

        info!(
            "Submission {} submitted for homework {}",
            updated.id, updated.homework_id
        );
        Ok(updated)
    }

    pub async fn get_submission(&self, submission_id: i64) -> Result<Submission> {
        self.load_submission(submission_id).await
    }
}
