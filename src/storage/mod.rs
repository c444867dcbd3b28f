use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::{
    homeworks::{
        entities::{EvaluationPhase, Homework},
        requests::CreateHomeworkRequest,
    },
    peer_evaluations::entities::{EvaluationStatus, NewPeerEvaluation, PeerEvaluation},
    submissions::entities::{Submission, SubmissionStatus},
};

pub mod memory_storage;
pub mod sea_orm_storage;

/// 使用内存存储的数据库 URL
pub const MEMORY_STORAGE_URL: &str = "memory://";

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 作业管理方法
    // 创建作业（作业由外部课程系统维护，这里用于初始化数据）
    async fn create_homework(&self, req: CreateHomeworkRequest) -> Result<Homework>;
    // 通过ID获取作业
    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>>;
    // 比较并设置互评阶段，当前阶段不等于 expected 时返回 false
    async fn update_homework_phase(
        &self,
        homework_id: i64,
        expected: EvaluationPhase,
        next: EvaluationPhase,
    ) -> Result<bool>;

    /// 提交管理方法
    // 保存草稿，不存在时创建；非草稿状态返回 InvalidState
    async fn save_submission(
        &self,
        homework_id: i64,
        creator_id: i64,
        content: String,
    ) -> Result<Submission>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    // 列出作业下的提交（按 ID 升序），可按状态筛选
    async fn list_submissions_by_homework(
        &self,
        homework_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>>;
    // 按 revision 比较并写入，返回 revision 递增后的提交
    async fn update_submission(&self, submission: &Submission) -> Result<Submission>;

    /// 互评记录管理方法
    // 在一个事务内批量创建，按 (作业, 评价人, 提交) 幂等
    async fn create_peer_evaluations(
        &self,
        evaluations: Vec<NewPeerEvaluation>,
    ) -> Result<Vec<PeerEvaluation>>;
    // 通过ID获取互评记录
    async fn get_peer_evaluation_by_id(&self, evaluation_id: i64)
    -> Result<Option<PeerEvaluation>>;
    // 列出提交的互评记录（按 ID 升序）
    async fn list_peer_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<PeerEvaluation>>;
    // 列出作业的互评记录（按 ID 升序）
    async fn list_peer_evaluations_by_homework(
        &self,
        homework_id: i64,
    ) -> Result<Vec<PeerEvaluation>>;
    // 列出评价人的互评任务，可按状态筛选
    async fn list_peer_evaluations_by_evaluator(
        &self,
        evaluator_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>>;
    // 按 revision 比较并写入，返回 revision 递增后的记录
    async fn update_peer_evaluation(&self, evaluation: &PeerEvaluation) -> Result<PeerEvaluation>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let config = AppConfig::get();
    if config.database.url == MEMORY_STORAGE_URL {
        tracing::warn!("Using in-memory storage, all data will be lost on shutdown");
        return Ok(Arc::new(memory_storage::MemoryStorage::new()));
    }

    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
