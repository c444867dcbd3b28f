//! 互评流程协调器
//!
//! 负责触发分配、持久化互评记录、维护提交侧的分配镜像、汇总最终成绩。

mod finalize;
mod queries;
mod reconcile;
mod scoring;
mod submissions;
mod trigger;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use super::locks::SubmissionLocks;
use crate::config::PeerEvaluationSettings;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::entities::Homework;
use crate::models::peer_evaluations::entities::PeerEvaluation;
use crate::models::submissions::entities::Submission;
use crate::storage::Storage;

pub struct PeerEvaluationCoordinator {
    storage: Arc<dyn Storage>,
    settings: PeerEvaluationSettings,
    locks: SubmissionLocks,
}

impl PeerEvaluationCoordinator {
    pub fn new(storage: Arc<dyn Storage>, settings: PeerEvaluationSettings) -> Self {
        Self {
            storage,
            settings,
            locks: SubmissionLocks::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn settings(&self) -> &PeerEvaluationSettings {
        &self.settings
    }

    pub(crate) async fn load_homework(&self, homework_id: i64) -> Result<Homework> {
        self.storage
            .get_homework_by_id(homework_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("作业不存在: {homework_id}")))
    }

    pub(crate) async fn load_submission(&self, submission_id: i64) -> Result<Submission> {
        self.storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("提交不存在: {submission_id}")))
    }

    pub(crate) async fn load_evaluation(&self, evaluation_id: i64) -> Result<PeerEvaluation> {
        self.storage
            .get_peer_evaluation_by_id(evaluation_id)
            .await?
            .ok_or_else(|| HWSystemError::not_found(format!("互评记录不存在: {evaluation_id}")))
    }

    /// 瞬时故障按线性退避重试，每次重试都重新执行整个操作
    pub(crate) async fn with_retry<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.settings.batch_retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        operation, attempt, attempts, e
                    );
                    let backoff = self.settings.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 互评记录已提交后刷新提交镜像，失败时报告数据不一致
    pub(crate) async fn sync_projection_after_commit(&self, submission_id: i64) -> Result<()> {
        if let Err(e) = self.refresh_submission_projection(submission_id).await {
            error!(
                "Submission {} projection diverged from its evaluations: {}",
                submission_id, e
            );
            return Err(HWSystemError::data_integrity(format!(
                "互评记录已保存，但提交 {submission_id} 的分配状态更新失败: {}，请执行对账修复",
                e.message()
            )));
        }
        Ok(())
    }
}
