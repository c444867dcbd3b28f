//! 提交实体

use sea_orm::entity::prelude::*;

use crate::models::submissions::entities::Submission;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub homework_id: i64,
    pub creator_id: i64,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: String,
    // JSON 数组，互评分配镜像
    #[sea_orm(column_type = "Text")]
    pub evaluation_assignments: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub final_evaluation: Option<String>,
    pub revision: i32,
    pub submitted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::homeworks::Entity",
        from = "Column::HomeworkId",
        to = "super::homeworks::Column::Id"
    )]
    Homework,
    #[sea_orm(has_many = "super::peer_evaluations::Entity")]
    PeerEvaluations,
}

impl Related<super::homeworks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homework.def()
    }
}

impl Related<super::peer_evaluations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeerEvaluations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// JSON 列解析失败时返回序列化错误
    pub fn try_into_submission(self) -> crate::errors::Result<Submission> {
        use chrono::{DateTime, Utc};

        let final_evaluation = match self.final_evaluation.as_deref() {
            Some(raw) => Some(serde_json::from_str(raw)?),
            None => None,
        };

        Ok(Submission {
            id: self.id,
            homework_id: self.homework_id,
            creator_id: self.creator_id,
            content: self.content,
            status: self.status.parse()?,
            evaluation_assignments: serde_json::from_str(&self.evaluation_assignments)?,
            final_evaluation,
            revision: self.revision,
            submitted_at: self
                .submitted_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
