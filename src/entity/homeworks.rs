//! 作业实体

use sea_orm::entity::prelude::*;

use crate::models::homeworks::entities::Homework;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "homeworks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub created_by: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub max_score: f64,
    pub deadline: Option<i64>,
    pub evaluations_per_submission: i32,
    pub max_evaluations_per_student: i32,
    pub allow_self_evaluation: bool,
    pub anonymous_evaluation: bool,
    pub evaluation_deadline: Option<i64>,
    pub evaluation_phase: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::submissions::Entity")]
    Submissions,
    #[sea_orm(has_many = "super::peer_evaluations::Entity")]
    PeerEvaluations,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::peer_evaluations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeerEvaluations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_homework(self) -> crate::errors::Result<Homework> {
        use chrono::{DateTime, Utc};

        Ok(Homework {
            id: self.id,
            class_id: self.class_id,
            title: self.title,
            content: self.content,
            max_score: self.max_score,
            deadline: self
                .deadline
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            evaluations_per_submission: self.evaluations_per_submission,
            max_evaluations_per_student: self.max_evaluations_per_student,
            allow_self_evaluation: self.allow_self_evaluation,
            anonymous_evaluation: self.anonymous_evaluation,
            evaluation_deadline: self
                .evaluation_deadline
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            evaluation_phase: self.evaluation_phase.parse()?,
            created_by: self.created_by,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homeworks::entities::EvaluationPhase;

    fn model(phase: &str) -> Model {
        Model {
            id: 1,
            class_id: 2,
            created_by: 3,
            title: "Essay".to_string(),
            content: None,
            max_score: 100.0,
            deadline: None,
            evaluations_per_submission: 2,
            max_evaluations_per_student: 3,
            allow_self_evaluation: false,
            anonymous_evaluation: true,
            evaluation_deadline: Some(1_900_000_000),
            evaluation_phase: phase.to_string(),
            created_at: 1_800_000_000,
            updated_at: 1_800_000_000,
        }
    }

    #[test]
    fn test_into_homework() {
        let homework = model("allocating").into_homework().unwrap();
        assert_eq!(homework.evaluation_phase, EvaluationPhase::Allocating);
        assert_eq!(
            homework.evaluation_deadline.map(|d| d.timestamp()),
            Some(1_900_000_000)
        );
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let err = model("grading").into_homework().unwrap_err();
        assert_eq!(err.code(), "E009");
    }
}
