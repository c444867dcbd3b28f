//! 内存存储实现
//!
//! 所有数据保存在进程内，重启后丢失。配置 `database.url = "memory://"` 时启用，
//! 也用于引擎测试。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::{HWSystemError, Result};
use crate::models::{
    homeworks::{
        entities::{EvaluationPhase, Homework, PeerEvaluationConfig},
        requests::CreateHomeworkRequest,
    },
    peer_evaluations::entities::{EvaluationStatus, NewPeerEvaluation, PeerEvaluation},
    submissions::entities::{Submission, SubmissionStatus},
};
use crate::storage::Storage;

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    homeworks: BTreeMap<i64, Homework>,
    submissions: BTreeMap<i64, Submission>,
    evaluations: BTreeMap<i64, PeerEvaluation>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 内存存储
///
/// 三张表共用一把 `RwLock`，批量写入在同一次写锁内完成，等价于事务。
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
    // 接下来若干次批量创建直接失败，用于验证重试与回滚
    failing_batches: AtomicU32,
    // 接下来若干次提交写入直接失败，用于验证镜像不一致的处理
    failing_submission_updates: AtomicU32,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让接下来的 `count` 次批量创建返回数据库错误
    pub fn fail_next_batches(&self, count: u32) {
        self.failing_batches.store(count, Ordering::SeqCst);
    }

    /// 让接下来的 `count` 次提交更新返回数据库错误，传 0 取消
    pub fn fail_next_submission_updates(&self, count: u32) {
        self.failing_submission_updates.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_homework(&self, req: CreateHomeworkRequest) -> Result<Homework> {
        let now = Utc::now();
        let defaults = PeerEvaluationConfig::default();
        let mut state = self.state.write().await;
        let id = state.allocate_id();

        let homework = Homework {
            id,
            class_id: req.class_id,
            title: req.title,
            content: req.description,
            max_score: req.max_score.unwrap_or(100.0),
            deadline: req.deadline,
            evaluations_per_submission: req
                .evaluations_per_submission
                .unwrap_or(defaults.evaluations_per_submission as i32),
            max_evaluations_per_student: req
                .max_evaluations_per_student
                .unwrap_or(defaults.max_evaluations_per_student as i32),
            allow_self_evaluation: req
                .allow_self_evaluation
                .unwrap_or(defaults.allow_self_evaluation),
            anonymous_evaluation: req
                .anonymous_evaluation
                .unwrap_or(defaults.anonymous_evaluation),
            evaluation_deadline: req.evaluation_deadline,
            evaluation_phase: EvaluationPhase::SubmissionPhase,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        };
        state.homeworks.insert(id, homework.clone());
        Ok(homework)
    }

    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>> {
        let state = self.state.read().await;
        Ok(state.homeworks.get(&homework_id).cloned())
    }

    async fn update_homework_phase(
        &self,
        homework_id: i64,
        expected: EvaluationPhase,
        next: EvaluationPhase,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.homeworks.get_mut(&homework_id) {
            Some(homework) if homework.evaluation_phase == expected => {
                homework.evaluation_phase = next;
                homework.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save_submission(
        &self,
        homework_id: i64,
        creator_id: i64,
        content: String,
    ) -> Result<Submission> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        if let Some(existing) = state
            .submissions
            .values_mut()
            .find(|s| s.homework_id == homework_id && s.creator_id == creator_id)
        {
            if existing.status != SubmissionStatus::Draft {
                return Err(HWSystemError::invalid_state(format!(
                    "提交 {} 当前状态为 {}，不能再修改内容",
                    existing.id, existing.status
                )));
            }
            existing.content = content;
            existing.revision += 1;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = state.allocate_id();
        let submission = Submission {
            id,
            homework_id,
            creator_id,
            content,
            status: SubmissionStatus::Draft,
            evaluation_assignments: Vec::new(),
            final_evaluation: None,
            revision: 0,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        };
        state.submissions.insert(id, submission.clone());
        Ok(submission)
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        let state = self.state.read().await;
        Ok(state.submissions.get(&submission_id).cloned())
    }

    async fn list_submissions_by_homework(
        &self,
        homework_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .values()
            .filter(|s| s.homework_id == homework_id)
            .filter(|s| status.is_none_or(|status| s.status == status))
            .cloned()
            .collect())
    }

    async fn update_submission(&self, submission: &Submission) -> Result<Submission> {
        if Self::take_failure(&self.failing_submission_updates) {
            return Err(HWSystemError::database_operation(
                "更新提交失败: injected failure",
            ));
        }

        let mut state = self.state.write().await;
        let current = state
            .submissions
            .get_mut(&submission.id)
            .ok_or_else(|| HWSystemError::not_found(format!("提交不存在: {}", submission.id)))?;

        if current.revision != submission.revision {
            return Err(HWSystemError::concurrent_modification(format!(
                "提交 {} 已被修改（期望 revision {}，当前 {}）",
                submission.id, submission.revision, current.revision
            )));
        }

        let mut updated = submission.clone();
        updated.revision += 1;
        updated.updated_at = Utc::now();
        *current = updated.clone();
        Ok(updated)
    }

    async fn create_peer_evaluations(
        &self,
        evaluations: Vec<NewPeerEvaluation>,
    ) -> Result<Vec<PeerEvaluation>> {
        if Self::take_failure(&self.failing_batches) {
            return Err(HWSystemError::database_operation(
                "创建互评记录失败: injected failure",
            ));
        }

        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut created = Vec::with_capacity(evaluations.len());

        for new in evaluations {
            let existing = state.evaluations.values().find(|e| {
                e.homework_id == new.homework_id
                    && e.evaluator_id == new.evaluator_id
                    && e.submission_id == new.submission_id
            });
            if let Some(existing) = existing {
                created.push(existing.clone());
                continue;
            }

            let id = state.allocate_id();
            let evaluation = PeerEvaluation {
                id,
                homework_id: new.homework_id,
                submission_id: new.submission_id,
                submitter_id: new.submitter_id,
                evaluator_id: new.evaluator_id,
                status: EvaluationStatus::Assigned,
                criteria_scores: Vec::new(),
                total_score: None,
                max_total_score: new.max_total_score,
                overall_feedback: None,
                due_date: new.due_date,
                round: new.round,
                priority: new.priority,
                needs_review: false,
                review_note: None,
                assigned_at: now,
                started_at: None,
                submitted_at: None,
                reviewed_at: None,
                revision: 0,
                created_at: now,
                updated_at: now,
            };
            state.evaluations.insert(id, evaluation.clone());
            created.push(evaluation);
        }

        Ok(created)
    }

    async fn get_peer_evaluation_by_id(
        &self,
        evaluation_id: i64,
    ) -> Result<Option<PeerEvaluation>> {
        let state = self.state.read().await;
        Ok(state.evaluations.get(&evaluation_id).cloned())
    }

    async fn list_peer_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        let state = self.state.read().await;
        Ok(state
            .evaluations
            .values()
            .filter(|e| e.submission_id == submission_id)
            .cloned()
            .collect())
    }

    async fn list_peer_evaluations_by_homework(
        &self,
        homework_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        let state = self.state.read().await;
        Ok(state
            .evaluations
            .values()
            .filter(|e| e.homework_id == homework_id)
            .cloned()
            .collect())
    }

    async fn list_peer_evaluations_by_evaluator(
        &self,
        evaluator_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>> {
        let state = self.state.read().await;
        let mut items: Vec<PeerEvaluation> = state
            .evaluations
            .values()
            .filter(|e| e.evaluator_id == evaluator_id)
            .filter(|e| status.is_none_or(|status| e.status == status))
            .cloned()
            .collect();
        items.sort_by_key(|e| (e.due_date, e.id));
        Ok(items)
    }

    async fn update_peer_evaluation(&self, evaluation: &PeerEvaluation) -> Result<PeerEvaluation> {
        let mut state = self.state.write().await;
        let current = state
            .evaluations
            .get_mut(&evaluation.id)
            .ok_or_else(|| HWSystemError::not_found(format!("互评记录不存在: {}", evaluation.id)))?;

        if current.revision != evaluation.revision {
            return Err(HWSystemError::concurrent_modification(format!(
                "互评记录 {} 已被修改（期望 revision {}，当前 {}）",
                evaluation.id, evaluation.revision, current.revision
            )));
        }

        let mut updated = evaluation.clone();
        updated.revision += 1;
        updated.updated_at = Utc::now();
        *current = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn homework_request() -> CreateHomeworkRequest {
        CreateHomeworkRequest {
            class_id: 1,
            created_by: 1,
            title: "Lab 1".to_string(),
            description: None,
            max_score: Some(100.0),
            deadline: None,
            evaluations_per_submission: None,
            max_evaluations_per_student: None,
            allow_self_evaluation: None,
            anonymous_evaluation: None,
            evaluation_deadline: None,
        }
    }

    #[tokio::test]
    async fn test_homework_phase_compare_and_set() {
        let storage = MemoryStorage::new();
        let homework = storage.create_homework(homework_request()).await.unwrap();
        assert_eq!(homework.evaluations_per_submission, 2);

        assert!(
            storage
                .update_homework_phase(
                    homework.id,
                    EvaluationPhase::SubmissionPhase,
                    EvaluationPhase::Allocating
                )
                .await
                .unwrap()
        );
        assert!(
            !storage
                .update_homework_phase(
                    homework.id,
                    EvaluationPhase::SubmissionPhase,
                    EvaluationPhase::Allocating
                )
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_save_submission_only_while_draft() {
        let storage = MemoryStorage::new();
        let first = storage.save_submission(1, 10, "v1".into()).await.unwrap();
        let second = storage.save_submission(1, 10, "v2".into()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.content, "v2");

        let mut submitted = second.clone();
        submitted.status = SubmissionStatus::Submitted;
        storage.update_submission(&submitted).await.unwrap();

        let err = storage.save_submission(1, 10, "v3".into()).await.unwrap_err();
        assert_eq!(err.code(), "E018");
    }

    #[tokio::test]
    async fn test_update_submission_rejects_stale_revision() {
        let storage = MemoryStorage::new();
        let submission = storage.save_submission(1, 10, "v1".into()).await.unwrap();

        let updated = storage.update_submission(&submission).await.unwrap();
        assert_eq!(updated.revision, submission.revision + 1);

        let err = storage.update_submission(&submission).await.unwrap_err();
        assert_eq!(err.code(), "E020");
    }

    #[tokio::test]
    async fn test_create_peer_evaluations_is_idempotent() {
        let storage = MemoryStorage::new();
        let new = NewPeerEvaluation {
            homework_id: 1,
            submission_id: 2,
            submitter_id: 20,
            evaluator_id: 30,
            max_total_score: 100.0,
            due_date: Utc::now() + Duration::days(7),
            round: 1,
            priority: 1,
        };

        let first = storage
            .create_peer_evaluations(vec![new.clone()])
            .await
            .unwrap();
        let second = storage.create_peer_evaluations(vec![new]).await.unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(
            storage.list_peer_evaluations_by_homework(1).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_injected_batch_failure_writes_nothing() {
        let storage = MemoryStorage::new();
        storage.fail_next_batches(1);
        let new = NewPeerEvaluation {
            homework_id: 1,
            submission_id: 2,
            submitter_id: 20,
            evaluator_id: 30,
            max_total_score: 100.0,
            due_date: Utc::now(),
            round: 1,
            priority: 1,
        };

        let err = storage
            .create_peer_evaluations(vec![new.clone()])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(
            storage
                .list_peer_evaluations_by_homework(1)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(storage.create_peer_evaluations(vec![new]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_submission_failure_keeps_revision() {
        let storage = MemoryStorage::new();
        let submission = storage.save_submission(1, 10, "v1".into()).await.unwrap();
        storage.fail_next_submission_updates(2);

        for _ in 0..2 {
            let err = storage.update_submission(&submission).await.unwrap_err();
            assert_eq!(err.code(), "E005");
        }
        let updated = storage.update_submission(&submission).await.unwrap();
        assert_eq!(updated.revision, submission.revision + 1);

        storage.fail_next_submission_updates(5);
        storage.fail_next_submission_updates(0);
        storage.update_submission(&updated).await.unwrap();
    }
}
