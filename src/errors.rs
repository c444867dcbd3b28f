//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_hwsystem_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum HWSystemError {
            $($variant(String),)*
        }

        impl HWSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(HWSystemError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl HWSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        HWSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_hwsystem_errors! {
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E011", "Date Parse Error"),
    Authorization("E013", "Authorization Error"),
    InsufficientParticipants("E014", "Insufficient Participants"),
    InsufficientSubmissions("E015", "Insufficient Submissions"),
    SelfEvaluationViolation("E016", "Self Evaluation Violation"),
    WorkloadViolation("E017", "Workload Violation"),
    InvalidState("E018", "Invalid State"),
    DataIntegrity("E019", "Data Integrity Error"),
    ConcurrentModification("E020", "Concurrent Modification"),
}

impl HWSystemError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 分配结果违反不变式（分配器缺陷），整批必须中止
    pub fn is_allocation_invariant_violation(&self) -> bool {
        matches!(
            self,
            HWSystemError::SelfEvaluationViolation(_) | HWSystemError::WorkloadViolation(_)
        )
    }

    /// 瞬时故障，可整体重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HWSystemError::DatabaseConnection(_)
                | HWSystemError::DatabaseOperation(_)
                | HWSystemError::ConcurrentModification(_)
        )
    }
}

impl fmt::Display for HWSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for HWSystemError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for HWSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        HWSystemError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for HWSystemError {
    fn from(err: std::io::Error) -> Self {
        HWSystemError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for HWSystemError {
    fn from(err: serde_json::Error) -> Self {
        HWSystemError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for HWSystemError {
    fn from(err: chrono::ParseError) -> Self {
        HWSystemError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HWSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HWSystemError::database_config("test").code(), "E003");
        assert_eq!(HWSystemError::validation("test").code(), "E007");
        assert_eq!(HWSystemError::insufficient_submissions("test").code(), "E015");
        assert_eq!(HWSystemError::data_integrity("test").code(), "E019");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            HWSystemError::self_evaluation_violation("test").error_type(),
            "Self Evaluation Violation"
        );
        assert_eq!(
            HWSystemError::invalid_state("test").error_type(),
            "Invalid State"
        );
    }

    #[test]
    fn test_error_message() {
        let err = HWSystemError::workload_violation("evaluator 7 over capacity");
        assert_eq!(err.message(), "evaluator 7 over capacity");
    }

    #[test]
    fn test_format_simple() {
        let err = HWSystemError::insufficient_participants("only 1 participant");
        let formatted = err.format_simple();
        assert!(formatted.contains("Insufficient Participants"));
        assert!(formatted.contains("only 1 participant"));
    }

    #[test]
    fn test_error_classification() {
        assert!(HWSystemError::workload_violation("x").is_allocation_invariant_violation());
        assert!(HWSystemError::self_evaluation_violation("x").is_allocation_invariant_violation());
        assert!(!HWSystemError::invalid_state("x").is_allocation_invariant_violation());

        assert!(HWSystemError::database_operation("x").is_retryable());
        assert!(HWSystemError::concurrent_modification("x").is_retryable());
        assert!(!HWSystemError::validation("x").is_retryable());
    }

    #[test]
    fn test_db_err_conversion() {
        let err: HWSystemError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E005");
    }
}
