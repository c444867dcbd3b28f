//! 预导入模块，方便使用

pub use super::homeworks::{
    ActiveModel as HomeworkActiveModel, Entity as Homeworks, Model as HomeworkModel,
};
pub use super::peer_evaluations::{
    ActiveModel as PeerEvaluationActiveModel, Entity as PeerEvaluations,
    Model as PeerEvaluationModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
