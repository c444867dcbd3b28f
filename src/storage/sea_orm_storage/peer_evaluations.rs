//! 互评记录存储操作

use super::SeaOrmStorage;
use crate::entity::peer_evaluations::{ActiveModel, Column, Entity as PeerEvaluations};
use crate::errors::{HWSystemError, Result};
use crate::models::peer_evaluations::entities::{
    EvaluationStatus, NewPeerEvaluation, PeerEvaluation,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 批量创建互评记录
    ///
    /// 整批在一个事务内完成，任何一条失败都会回滚。已存在的
    /// (作业, 评价人, 提交) 组合直接返回原记录。
    pub async fn create_peer_evaluations_impl(
        &self,
        evaluations: Vec<NewPeerEvaluation>,
    ) -> Result<Vec<PeerEvaluation>> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_connection(format!("开启事务失败: {e}")))?;

        let mut created = Vec::with_capacity(evaluations.len());
        for new in evaluations {
            let existing = PeerEvaluations::find()
                .filter(Column::HomeworkId.eq(new.homework_id))
                .filter(Column::EvaluatorId.eq(new.evaluator_id))
                .filter(Column::SubmissionId.eq(new.submission_id))
                .one(&txn)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("查询互评记录失败: {e}")))?;

            let model = match existing {
                Some(model) => model,
                None => ActiveModel {
                    homework_id: Set(new.homework_id),
                    submission_id: Set(new.submission_id),
                    submitter_id: Set(new.submitter_id),
                    evaluator_id: Set(new.evaluator_id),
                    status: Set(EvaluationStatus::Assigned.to_string()),
                    criteria_scores: Set("[]".to_string()),
                    total_score: Set(None),
                    max_total_score: Set(new.max_total_score),
                    overall_feedback: Set(None),
                    due_date: Set(new.due_date.timestamp()),
                    round: Set(new.round),
                    priority: Set(new.priority),
                    needs_review: Set(false),
                    review_note: Set(None),
                    assigned_at: Set(now),
                    started_at: Set(None),
                    submitted_at: Set(None),
                    reviewed_at: Set(None),
                    revision: Set(0),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("创建互评记录失败: {e}")))?,
            };

            created.push(model.try_into_evaluation()?);
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(created)
    }

    /// 通过 ID 获取互评记录
    pub async fn get_peer_evaluation_by_id_impl(
        &self,
        evaluation_id: i64,
    ) -> Result<Option<PeerEvaluation>> {
        let result = PeerEvaluations::find_by_id(evaluation_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询互评记录失败: {e}")))?;

        result.map(|m| m.try_into_evaluation()).transpose()
    }

    /// 列出提交的互评记录
    pub async fn list_peer_evaluations_by_submission_impl(
        &self,
        submission_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        let results = PeerEvaluations::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询互评记录失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_evaluation())
            .collect()
    }

    /// 列出作业的互评记录
    pub async fn list_peer_evaluations_by_homework_impl(
        &self,
        homework_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        let results = PeerEvaluations::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询互评记录失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_evaluation())
            .collect()
    }

    /// 列出评价人的互评任务
    pub async fn list_peer_evaluations_by_evaluator_impl(
        &self,
        evaluator_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>> {
        let mut select = PeerEvaluations::find().filter(Column::EvaluatorId.eq(evaluator_id));

        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let results = select
            .order_by_asc(Column::DueDate)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询互评任务失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_evaluation())
            .collect()
    }

    /// 按 revision 比较并写入互评记录
    pub async fn update_peer_evaluation_impl(
        &self,
        evaluation: &PeerEvaluation,
    ) -> Result<PeerEvaluation> {
        use sea_orm::sea_query::Expr;

        let now = chrono::Utc::now();
        let criteria_scores = serde_json::to_string(&evaluation.criteria_scores)?;
        let next_revision = evaluation.revision + 1;

        let result = PeerEvaluations::update_many()
            .col_expr(Column::EvaluatorId, Expr::value(evaluation.evaluator_id))
            .col_expr(Column::Status, Expr::value(evaluation.status.to_string()))
            .col_expr(Column::CriteriaScores, Expr::value(criteria_scores))
            .col_expr(Column::TotalScore, Expr::value(evaluation.total_score))
            .col_expr(
                Column::OverallFeedback,
                Expr::value(evaluation.overall_feedback.clone()),
            )
            .col_expr(Column::DueDate, Expr::value(evaluation.due_date.timestamp()))
            .col_expr(Column::NeedsReview, Expr::value(evaluation.needs_review))
            .col_expr(Column::ReviewNote, Expr::value(evaluation.review_note.clone()))
            .col_expr(
                Column::AssignedAt,
                Expr::value(evaluation.assigned_at.timestamp()),
            )
            .col_expr(
                Column::StartedAt,
                Expr::value(evaluation.started_at.map(|dt| dt.timestamp())),
            )
            .col_expr(
                Column::SubmittedAt,
                Expr::value(evaluation.submitted_at.map(|dt| dt.timestamp())),
            )
            .col_expr(
                Column::ReviewedAt,
                Expr::value(evaluation.reviewed_at.map(|dt| dt.timestamp())),
            )
            .col_expr(Column::Revision, Expr::value(next_revision))
            .col_expr(Column::UpdatedAt, Expr::value(now.timestamp()))
            .filter(Column::Id.eq(evaluation.id))
            .filter(Column::Revision.eq(evaluation.revision))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新互评记录失败: {e}")))?;

        if result.rows_affected == 0 {
            return match self.get_peer_evaluation_by_id_impl(evaluation.id).await? {
                Some(current) => Err(HWSystemError::concurrent_modification(format!(
                    "互评记录 {} 已被修改（期望 revision {}，当前 {}）",
                    evaluation.id, evaluation.revision, current.revision
                ))),
                None => Err(HWSystemError::not_found(format!(
                    "互评记录不存在: {}",
                    evaluation.id
                ))),
            };
        }

        let mut updated = evaluation.clone();
        updated.revision = next_revision;
        updated.updated_at = now;
        Ok(updated)
    }
}
