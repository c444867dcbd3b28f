use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建作业表（互评配置随作业保存）
        manager
            .create_table(
                Table::create()
                    .table(Homeworks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Homeworks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Homeworks::ClassId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Homeworks::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Homeworks::Title).string().not_null())
                    .col(ColumnDef::new(Homeworks::Content).text().null())
                    .col(ColumnDef::new(Homeworks::MaxScore).double().not_null())
                    .col(ColumnDef::new(Homeworks::Deadline).big_integer().null())
                    .col(
                        ColumnDef::new(Homeworks::EvaluationsPerSubmission)
                            .integer()
                            .not_null()
                            .default(2),
                    )
                    .col(
                        ColumnDef::new(Homeworks::MaxEvaluationsPerStudent)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(Homeworks::AllowSelfEvaluation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Homeworks::AnonymousEvaluation)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Homeworks::EvaluationDeadline)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Homeworks::EvaluationPhase)
                            .string()
                            .not_null()
                            .default("submission_phase"),
                    )
                    .col(
                        ColumnDef::new(Homeworks::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Homeworks::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建提交表
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::HomeworkId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Content).text().not_null())
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::EvaluationAssignments)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::FinalEvaluation).text().null())
                    .col(
                        ColumnDef::new(Submissions::Revision)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Submissions::SubmittedAt).big_integer().null())
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::HomeworkId)
                            .to(Homeworks::Table, Homeworks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建互评记录表
        manager
            .create_table(
                Table::create()
                    .table(PeerEvaluations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PeerEvaluations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::HomeworkId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::SubmitterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::EvaluatorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PeerEvaluations::Status).string().not_null())
                    .col(
                        ColumnDef::new(PeerEvaluations::CriteriaScores)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PeerEvaluations::TotalScore).double().null())
                    .col(
                        ColumnDef::new(PeerEvaluations::MaxTotalScore)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::OverallFeedback)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::DueDate)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PeerEvaluations::Round).integer().not_null())
                    .col(
                        ColumnDef::new(PeerEvaluations::Priority)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::NeedsReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PeerEvaluations::ReviewNote).text().null())
                    .col(
                        ColumnDef::new(PeerEvaluations::AssignedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::StartedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::SubmittedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::ReviewedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::Revision)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerEvaluations::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PeerEvaluations::Table, PeerEvaluations::HomeworkId)
                            .to(Homeworks::Table, Homeworks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PeerEvaluations::Table, PeerEvaluations::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        // 每个学生每个作业只有一份提交
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_homework_creator")
                    .table(Submissions::Table)
                    .col(Submissions::HomeworkId)
                    .col(Submissions::CreatorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_status")
                    .table(Submissions::Table)
                    .col(Submissions::Status)
                    .to_owned(),
            )
            .await?;

        // 幂等写入键：(作业, 评价者, 提交)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_peer_evaluations_unique_pair")
                    .table(PeerEvaluations::Table)
                    .col(PeerEvaluations::HomeworkId)
                    .col(PeerEvaluations::EvaluatorId)
                    .col(PeerEvaluations::SubmissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_peer_evaluations_submission_id")
                    .table(PeerEvaluations::Table)
                    .col(PeerEvaluations::SubmissionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_peer_evaluations_evaluator_id")
                    .table(PeerEvaluations::Table)
                    .col(PeerEvaluations::EvaluatorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(PeerEvaluations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Homeworks::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Homeworks {
    #[sea_orm(iden = "homeworks")]
    Table,
    Id,
    ClassId,
    CreatedBy,
    Title,
    Content,
    MaxScore,
    Deadline,
    EvaluationsPerSubmission,
    MaxEvaluationsPerStudent,
    AllowSelfEvaluation,
    AnonymousEvaluation,
    EvaluationDeadline,
    EvaluationPhase,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
    HomeworkId,
    CreatorId,
    Content,
    Status,
    EvaluationAssignments,
    FinalEvaluation,
    Revision,
    SubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PeerEvaluations {
    #[sea_orm(iden = "peer_evaluations")]
    Table,
    Id,
    HomeworkId,
    SubmissionId,
    SubmitterId,
    EvaluatorId,
    Status,
    CriteriaScores,
    TotalScore,
    MaxTotalScore,
    OverallFeedback,
    DueDate,
    Round,
    Priority,
    NeedsReview,
    ReviewNote,
    AssignedAt,
    StartedAt,
    SubmittedAt,
    ReviewedAt,
    Revision,
    CreatedAt,
    UpdatedAt,
}
