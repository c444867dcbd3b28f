//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod homeworks;
mod peer_evaluations;
mod submissions;

use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| HWSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(HWSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    homeworks::{
        entities::{EvaluationPhase, Homework},
        requests::CreateHomeworkRequest,
    },
    peer_evaluations::entities::{EvaluationStatus, NewPeerEvaluation, PeerEvaluation},
    submissions::entities::{Submission, SubmissionStatus},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 作业模块
    async fn create_homework(&self, req: CreateHomeworkRequest) -> Result<Homework> {
        self.create_homework_impl(req).await
    }

    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>> {
        self.get_homework_by_id_impl(homework_id).await
    }

    async fn update_homework_phase(
        &self,
        homework_id: i64,
        expected: EvaluationPhase,
        next: EvaluationPhase,
    ) -> Result<bool> {
        self.update_homework_phase_impl(homework_id, expected, next)
            .await
    }

    // 提交模块
    async fn save_submission(
        &self,
        homework_id: i64,
        creator_id: i64,
        content: String,
    ) -> Result<Submission> {
        self.save_submission_impl(homework_id, creator_id, content)
            .await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn list_submissions_by_homework(
        &self,
        homework_id: i64,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<Submission>> {
        self.list_submissions_by_homework_impl(homework_id, status)
            .await
    }

    async fn update_submission(&self, submission: &Submission) -> Result<Submission> {
        self.update_submission_impl(submission).await
    }

    // 互评模块
    async fn create_peer_evaluations(
        &self,
        evaluations: Vec<NewPeerEvaluation>,
    ) -> Result<Vec<PeerEvaluation>> {
        self.create_peer_evaluations_impl(evaluations).await
    }

    async fn get_peer_evaluation_by_id(
        &self,
        evaluation_id: i64,
    ) -> Result<Option<PeerEvaluation>> {
        self.get_peer_evaluation_by_id_impl(evaluation_id).await
    }

    async fn list_peer_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        self.list_peer_evaluations_by_submission_impl(submission_id)
            .await
    }

    async fn list_peer_evaluations_by_homework(
        &self,
        homework_id: i64,
    ) -> Result<Vec<PeerEvaluation>> {
        self.list_peer_evaluations_by_homework_impl(homework_id)
            .await
    }

    async fn list_peer_evaluations_by_evaluator(
        &self,
        evaluator_id: i64,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<PeerEvaluation>> {
        self.list_peer_evaluations_by_evaluator_impl(evaluator_id, status)
            .await
    }

    async fn update_peer_evaluation(&self, evaluation: &PeerEvaluation) -> Result<PeerEvaluation> {
        self.update_peer_evaluation_impl(evaluation).await
    }
}
