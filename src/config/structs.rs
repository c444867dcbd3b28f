use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    #[serde(default)]
    pub peer_evaluation: PeerEvaluationSettings,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型，memory:// 为内存存储）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: usize,
}

/// 互评引擎配置
///
/// 作业级别的互评参数（每份提交评价人数等）来自作业本身，这里只放引擎全局行为。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEvaluationSettings {
    /// 作业未配置互评截止时间时，截止时间 = 作业创建时间 + 该天数
    #[serde(default = "default_due_days")]
    pub default_due_days: i64,
    /// 批量写入和乐观锁冲突的最大尝试次数
    #[serde(default = "default_batch_retry_attempts")]
    pub batch_retry_attempts: u32,
    /// 重试退避基数（毫秒），第 n 次重试等待 n * retry_backoff_ms
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// 评分离散度（百分点）不超过该值视为达成共识
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: f64,
}

fn default_due_days() -> i64 {
    7
}

fn default_batch_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_consensus_threshold() -> f64 {
    15.0
}

impl Default for PeerEvaluationSettings {
    fn default() -> Self {
        Self {
            default_due_days: default_due_days(),
            batch_retry_attempts: default_batch_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            consensus_threshold: default_consensus_threshold(),
        }
    }
}
