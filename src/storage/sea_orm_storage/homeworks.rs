//! 作业存储操作

use super::SeaOrmStorage;
use crate::entity::homeworks::{ActiveModel, Column, Entity as Homeworks};
use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::{
    entities::{EvaluationPhase, Homework, PeerEvaluationConfig},
    requests::CreateHomeworkRequest,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_homework_impl(&self, req: CreateHomeworkRequest) -> Result<Homework> {
        let now = chrono::Utc::now().timestamp();
        let defaults = PeerEvaluationConfig::default();

        let model = ActiveModel {
            class_id: Set(req.class_id),
            created_by: Set(req.created_by),
            title: Set(req.title),
            content: Set(req.description),
            max_score: Set(req.max_score.unwrap_or(100.0)),
            deadline: Set(req.deadline.map(|dt| dt.timestamp())),
            evaluations_per_submission: Set(req
                .evaluations_per_submission
                .unwrap_or(defaults.evaluations_per_submission as i32)),
            max_evaluations_per_student: Set(req
                .max_evaluations_per_student
                .unwrap_or(defaults.max_evaluations_per_student as i32)),
            allow_self_evaluation: Set(req
                .allow_self_evaluation
                .unwrap_or(defaults.allow_self_evaluation)),
            anonymous_evaluation: Set(req
                .anonymous_evaluation
                .unwrap_or(defaults.anonymous_evaluation)),
            evaluation_deadline: Set(req.evaluation_deadline.map(|dt| dt.timestamp())),
            evaluation_phase: Set(EvaluationPhase::SubmissionPhase.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建作业失败: {e}")))?;

        result.into_homework()
    }

    /// 通过 ID 获取作业
    pub async fn get_homework_by_id_impl(&self, homework_id: i64) -> Result<Option<Homework>> {
        let result = Homeworks::find_by_id(homework_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业失败: {e}")))?;

        result.map(|m| m.into_homework()).transpose()
    }

    /// 比较并设置互评阶段
    pub async fn update_homework_phase_impl(
        &self,
        homework_id: i64,
        expected: EvaluationPhase,
        next: EvaluationPhase,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Homeworks::update_many()
            .col_expr(
                Column::EvaluationPhase,
                sea_orm::sea_query::Expr::value(next.to_string()),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(homework_id))
            .filter(Column::EvaluationPhase.eq(expected.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新互评阶段失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
