use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};
use crate::peer_evaluation::PeerEvaluationCoordinator;

pub struct StartupContext {
    pub coordinator: Arc<PeerEvaluationCoordinator>,
}

/// 准备服务器启动的上下文
/// 包括存储后端（含数据库迁移）和互评协调器
pub async fn prepare_server_startup() -> Result<StartupContext> {
    // 已安装过 provider 时返回 Err，忽略即可
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("Rustls crypto provider already installed");
    }

    let config = AppConfig::get();

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let settings = config.peer_evaluation.clone();
    if settings.batch_retry_attempts == 0 {
        return Err(HWSystemError::validation(
            "peer_evaluation.batch_retry_attempts 必须大于 0",
        ));
    }
    info!(
        "Peer evaluation settings: due in {} days, {} attempts, {} ms backoff, consensus within {}",
        settings.default_due_days,
        settings.batch_retry_attempts,
        settings.retry_backoff_ms,
        settings.consensus_threshold
    );

    let coordinator = Arc::new(PeerEvaluationCoordinator::new(storage, settings));

    Ok(StartupContext { coordinator })
}
