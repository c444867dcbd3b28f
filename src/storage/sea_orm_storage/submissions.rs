//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 保存草稿（同一学生同一作业只有一份提交）
    pub async fn save_submission_impl(
        &self,
        homework_id: i64,
        creator_id: i64,
        content: String,
    ) -> Result<Submission> {
        let now = chrono::Utc::now().timestamp();

        let existing = Submissions::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .filter(Column::CreatorId.eq(creator_id))
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        let Some(existing) = existing else {
            let model = ActiveModel {
                homework_id: Set(homework_id),
                creator_id: Set(creator_id),
                content: Set(content),
                status: Set(SubmissionStatus::Draft.to_string()),
                evaluation_assignments: Set("[]".to_string()),
                final_evaluation: Set(None),
                revision: Set(0),
                submitted_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            let result = model
                .insert(&self.db)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("创建提交失败: {e}")))?;

            return result.try_into_submission();
        };

        if existing.status != SubmissionStatus::Draft.as_str() {
            return Err(HWSystemError::invalid_state(format!(
                "提交 {} 当前状态为 {}，不能再修改内容",
                existing.id, existing.status
            )));
        }

        let mut submission = existing.try_into_submission()?;
        submission.content = content;
        self.update_submission_impl(&submission).await
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.try_into_submission()).transpose()
    }

    /// 列出作业下的提交
    pub async fn list_submissions_by_homework_impl(
        &self,
        homework_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>> {
        let mut select = Submissions::find().filter(Column::HomeworkId.eq(homework_id));

        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let results = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交列表失败: {e}")))?;

        results
            .into_iter()
            .map(|m| m.try_into_submission())
            .collect()
    }

    /// 按 revision 比较并写入提交
    pub async fn update_submission_impl(&self, submission: &Submission) -> Result<Submission> {
        use sea_orm::sea_query::Expr;

        let now = chrono::Utc::now();
        let assignments = serde_json::to_string(&submission.evaluation_assignments)?;
        let final_evaluation = submission
            .final_evaluation
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let next_revision = submission.revision + 1;

        let result = Submissions::update_many()
            .col_expr(Column::Content, Expr::value(submission.content.clone()))
            .col_expr(Column::Status, Expr::value(submission.status.to_string()))
            .col_expr(Column::EvaluationAssignments, Expr::value(assignments))
            .col_expr(Column::FinalEvaluation, Expr::value(final_evaluation))
            .col_expr(
                Column::SubmittedAt,
                Expr::value(submission.submitted_at.map(|dt| dt.timestamp())),
            )
            .col_expr(Column::Revision, Expr::value(next_revision))
            .col_expr(Column::UpdatedAt, Expr::value(now.timestamp()))
            .filter(Column::Id.eq(submission.id))
            .filter(Column::Revision.eq(submission.revision))
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新提交失败: {e}")))?;

        if result.rows_affected == 0 {
            return match self.get_submission_by_id_impl(submission.id).await? {
                Some(current) => Err(HWSystemError::concurrent_modification(format!(
                    "提交 {} 已被修改（期望 revision {}，当前 {}）",
                    submission.id, submission.revision, current.revision
                ))),
                None => Err(HWSystemError::not_found(format!(
                    "提交不存在: {}",
                    submission.id
                ))),
            };
        }

        let mut updated = submission.clone();
        updated.revision = next_revision;
        updated.updated_at = now;
        Ok(updated)
    }
}
