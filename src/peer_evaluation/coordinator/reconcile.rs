use tracing::{info, warn};

use super::PeerEvaluationCoordinator;
use crate::errors::Result;
use crate::models::homeworks::entities::EvaluationPhase;
use crate::models::peer_evaluations::responses::ReconciliationReport;
use crate::peer_evaluation::projection;

impl PeerEvaluationCoordinator {
    /// 从互评记录重建提交的分配镜像，发生写入时返回 true
    pub(crate) async fn refresh_submission_projection(&self, submission_id: i64) -> Result<bool> {
        let _guard = self.locks.acquire(submission_id).await;
        self.with_retry("refresh submission projection", || {
            self.reconcile_unlocked(submission_id)
        })
        .await
    }

    // 调用方必须持有该提交的锁
    pub(super) async fn reconcile_unlocked(&self, submission_id: i64) -> Result<bool> {
        let submission = self.load_submission(submission_id).await?;
        let evaluations = self
            .storage
            .list_peer_evaluations_by_submission(submission_id)
            .await?;

        match projection::reconcile(&submission, &evaluations) {
            Some(updated) => {
                self.storage.update_submission(&updated).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 对账单份提交，已一致时不写入
    pub async fn reconcile_submission(&self, submission_id: i64) -> Result<bool> {
        let repaired = self.refresh_submission_projection(submission_id).await?;
        if repaired {
            info!("Reconciled submission {} with its evaluations", submission_id);
        }
        Ok(repaired)
    }

    /// 对账作业下的全部提交，并修复停留在分配中的作业阶段
    pub async fn reconcile_homework(&self, homework_id: i64) -> Result<ReconciliationReport> {
        let homework = self.load_homework(homework_id).await?;
        let submissions = self
            .storage
            .list_submissions_by_homework(homework_id, None)
            .await?;

        let mut report = ReconciliationReport {
            homework_id,
            checked: submissions.len(),
            ..Default::default()
        };

        for submission in &submissions {
            if self.reconcile_submission(submission.id).await? {
                report.repaired.push(submission.id);
            }
        }

        if homework.evaluation_phase == EvaluationPhase::Allocating {
            let has_evaluations = !self
                .storage
                .list_peer_evaluations_by_homework(homework_id)
                .await?
                .is_empty();
            if has_evaluations {
                report.phase_repaired = self
                    .storage
                    .update_homework_phase(
                        homework_id,
                        EvaluationPhase::Allocating,
                        EvaluationPhase::EvaluationPhase,
                    )
                    .await?;
            } else {
                warn!(
                    "Homework {} is allocating without evaluations, leaving phase untouched",
                    homework_id
                );
            }
        }

        info!(
            "Reconciled homework {}: {} checked, {} repaired, phase repaired: {}",
            homework_id,
            report.checked,
            report.repaired.len(),
            report.phase_repaired
        );
        Ok(report)
    }
}
