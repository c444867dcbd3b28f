pub mod common;
pub mod homeworks;
pub mod peer_evaluations;
pub mod submissions;

pub use common::AppStartTime;
pub use common::response::ApiResponse;

/// 业务错误码（随 ApiResponse 返回给前端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Forbidden = 1003,
    NotFound = 1004,

    // 互评流程错误
    InvalidState = 4001,
    InsufficientSubmissions = 4002,
    SelfEvaluationViolation = 4003,
    WorkloadViolation = 4004,
    ConcurrentModification = 4005,

    // 服务端错误
    InternalServerError = 5000,
    DataIntegrity = 5001,
}
