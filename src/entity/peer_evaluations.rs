//! 互评记录实体

use sea_orm::entity::prelude::*;

use crate::models::peer_evaluations::entities::PeerEvaluation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "peer_evaluations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub homework_id: i64,
    pub submission_id: i64,
    pub submitter_id: i64,
    pub evaluator_id: i64,
    pub status: String,
    // JSON 数组，各评分项得分
    #[sea_orm(column_type = "Text")]
    pub criteria_scores: String,
    pub total_score: Option<f64>,
    pub max_total_score: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub overall_feedback: Option<String>,
    pub due_date: i64,
    pub round: i32,
    pub priority: i32,
    pub needs_review: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_note: Option<String>,
    pub assigned_at: i64,
    pub started_at: Option<i64>,
    pub submitted_at: Option<i64>,
    pub reviewed_at: Option<i64>,
    pub revision: i32,
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
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id"
    )]
    Submission,
}

impl Related<super::homeworks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Homework.def()
    }
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn try_into_evaluation(self) -> crate::errors::Result<PeerEvaluation> {
        use chrono::{DateTime, Utc};

        let ts = |value: i64| DateTime::<Utc>::from_timestamp(value, 0).unwrap_or_default();
        let opt_ts = |value: Option<i64>| value.and_then(|v| DateTime::<Utc>::from_timestamp(v, 0));

        Ok(PeerEvaluation {
            id: self.id,
            homework_id: self.homework_id,
            submission_id: self.submission_id,
            submitter_id: self.submitter_id,
            evaluator_id: self.evaluator_id,
            status: self.status.parse()?,
            criteria_scores: serde_json::from_str(&self.criteria_scores)?,
            total_score: self.total_score,
            max_total_score: self.max_total_score,
            overall_feedback: self.overall_feedback,
            due_date: ts(self.due_date),
            round: self.round,
            priority: self.priority,
            needs_review: self.needs_review,
            review_note: self.review_note,
            assigned_at: ts(self.assigned_at),
            started_at: opt_ts(self.started_at),
            submitted_at: opt_ts(self.submitted_at),
            reviewed_at: opt_ts(self.reviewed_at),
            revision: self.revision,
            created_at: ts(self.created_at),
            updated_at: ts(self.updated_at),
        })
    }
}
