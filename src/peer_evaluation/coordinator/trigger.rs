use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use rand::Rng;
use tracing::{error, info, warn};

use super::PeerEvaluationCoordinator;
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::entities::{EvaluationPhase, Homework, PeerEvaluationConfig};
use crate::models::peer_evaluations::{
    entities::{NewPeerEvaluation, PeerEvaluation},
    requests::TriggerPeerEvaluationRequest,
    responses::{AssignmentPairView, TriggerPeerEvaluationResponse, UnderAssignmentWarning},
};
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::peer_evaluation::{
    allocator::{self, Allocation, AllocatorConfig},
    conflict::{ConflictMatrix, Participant},
    statistics,
};

impl PeerEvaluationCoordinator {
    /// 为作业触发一轮互评分配
    pub async fn trigger_peer_evaluation(
        &self,
        homework_id: i64,
        req: TriggerPeerEvaluationRequest,
    ) -> Result<TriggerPeerEvaluationResponse> {
        let homework = self.load_homework(homework_id).await?;

        let config = PeerEvaluationConfig::from_homework(&homework).with_overrides(
            req.evaluations_per_submission,
            req.max_evaluations_per_student,
        );
        config.validate()?;

        if homework.evaluation_phase != EvaluationPhase::SubmissionPhase {
            return Err(HWSystemError::invalid_state(format!(
                "作业 {homework_id} 当前处于 {} 阶段，不能触发互评",
                homework.evaluation_phase
            )));
        }

        let submitted = self
            .storage
            .list_submissions_by_homework(homework_id, Some(SubmissionStatus::Submitted))
            .await?
            .len();
        if submitted < 2 {
            return Err(HWSystemError::insufficient_submissions(format!(
                "作业 {homework_id} 只有 {submitted} 份已提交的作业，至少需要 2 份"
            )));
        }

        let claimed = self
            .storage
            .update_homework_phase(
                homework_id,
                EvaluationPhase::SubmissionPhase,
                EvaluationPhase::Allocating,
            )
            .await?;
        if !claimed {
            return Err(HWSystemError::invalid_state(format!(
                "作业 {homework_id} 的互评分配已在进行或已完成"
            )));
        }

        // 认领之后重新读取，认领前刚提交的作业也参与分配
        let submissions = match self
            .storage
            .list_submissions_by_homework(homework_id, Some(SubmissionStatus::Submitted))
            .await
        {
            Ok(submissions) => submissions,
            Err(e) => {
                self.release_claim(homework_id).await;
                return Err(e);
            }
        };

        let seed = req.seed.unwrap_or_else(|| rand::rng().random());
        info!(
            "Triggering peer evaluation for homework {} ({} submissions, {} per submission, cap {}, seed {})",
            homework_id,
            submissions.len(),
            config.evaluations_per_submission,
            config.max_evaluations_per_student,
            seed
        );

        let participants: Vec<Participant> = submissions
            .iter()
            .map(|s| Participant {
                student_id: s.creator_id,
                submission_id: s.id,
            })
            .collect();

        let (allocation, created, round) = match self
            .allocate_and_persist(&homework, &config, &submissions, &participants, seed)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                self.release_claim(homework_id).await;
                return Err(e);
            }
        };

        match self
            .storage
            .update_homework_phase(
                homework_id,
                EvaluationPhase::Allocating,
                EvaluationPhase::EvaluationPhase,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Homework {} left the allocating phase during allocation",
                homework_id
            ),
            Err(e) => {
                error!(
                    "Homework {} stuck in allocating phase after evaluations were created: {}",
                    homework_id, e
                );
                return Err(HWSystemError::data_integrity(format!(
                    "互评记录已创建，但作业 {homework_id} 的阶段更新失败: {}，请执行对账修复",
                    e.message()
                )));
            }
        }

        let touched: BTreeSet<i64> = created.iter().map(|e| e.submission_id).collect();
        let results = join_all(
            touched
                .iter()
                .map(|&submission_id| self.refresh_submission_projection(submission_id)),
        )
        .await;

        let failed: Vec<String> = touched
            .iter()
            .zip(results)
            .filter_map(|(submission_id, result)| {
                result.err().map(|e| {
                    error!(
                        "Failed to project evaluations onto submission {}: {}",
                        submission_id, e
                    );
                    submission_id.to_string()
                })
            })
            .collect();
        if !failed.is_empty() {
            return Err(HWSystemError::data_integrity(format!(
                "互评记录已创建，但以下提交的分配状态更新失败: {}，请执行对账修复",
                failed.join(", ")
            )));
        }

        let warnings = allocation
            .warnings
            .iter()
            .map(|w| UnderAssignmentWarning {
                submission_id: participants[w.submission_index].submission_id,
                requested: w.requested,
                assigned: w.assigned,
            })
            .collect();

        let assignments: Vec<AssignmentPairView> = created
            .iter()
            .map(|e| AssignmentPairView {
                evaluation_id: e.id,
                submission_id: e.submission_id,
                submitter_id: e.submitter_id,
                evaluator_id: e.evaluator_id,
                priority: e.priority,
            })
            .collect();

        info!(
            "Peer evaluation round {} created {} evaluations for homework {}",
            round,
            assignments.len(),
            homework_id
        );

        Ok(TriggerPeerEvaluationResponse {
            homework_id,
            round,
            total_evaluations: assignments.len(),
            assignments,
            statistics: statistics::compute(&allocation, participants.len()),
            warnings,
        })
    }

    async fn allocate_and_persist(
        &self,
        homework: &Homework,
        config: &PeerEvaluationConfig,
        submissions: &[Submission],
        participants: &[Participant],
        seed: u64,
    ) -> Result<(Allocation, Vec<PeerEvaluation>, i32)> {
        let conflict = ConflictMatrix::build(participants, config.allow_self_evaluation);
        let allocation = allocator::allocate(
            participants,
            &conflict,
            &AllocatorConfig {
                evaluations_per_submission: config.evaluations_per_submission,
                max_evaluations_per_user: config.max_evaluations_per_student,
                seed,
            },
        )?;

        let round = self
            .storage
            .list_peer_evaluations_by_homework(homework.id)
            .await?
            .iter()
            .map(|e| e.round)
            .max()
            .unwrap_or(0)
            + 1;
        let due_date = self.due_date(homework, config);

        let batch: Vec<NewPeerEvaluation> = allocation
            .pairs
            .iter()
            .map(|pair| {
                let submission = &submissions[pair.submission_index];
                NewPeerEvaluation {
                    homework_id: homework.id,
                    submission_id: submission.id,
                    submitter_id: submission.creator_id,
                    evaluator_id: participants[pair.evaluator_index].student_id,
                    max_total_score: homework.max_score,
                    due_date,
                    round,
                    priority: pair.priority as i32,
                }
            })
            .collect();

        let created = self
            .with_retry("create peer evaluations", || {
                let storage = &self.storage;
                let batch = batch.clone();
                async move { storage.create_peer_evaluations(batch).await }
            })
            .await?;

        Ok((allocation, created, round))
    }

    fn due_date(&self, homework: &Homework, config: &PeerEvaluationConfig) -> DateTime<Utc> {
        config
            .evaluation_deadline
            .unwrap_or_else(|| homework.created_at + Duration::days(self.settings.default_due_days))
    }

    // 分配失败时把作业放回提交阶段，允许重新触发
    async fn release_claim(&self, homework_id: i64) {
        match self
            .storage
            .update_homework_phase(
                homework_id,
                EvaluationPhase::Allocating,
                EvaluationPhase::SubmissionPhase,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(
                "Homework {} was not in allocating phase when releasing claim",
                homework_id
            ),
            Err(e) => error!(
                "Failed to release allocation claim on homework {}: {}",
                homework_id, e
            ),
        }
    }
}
