use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use tracing::error;

use crate::errors::HWSystemError;
use crate::models::{ApiResponse, ErrorCode};

/// 把引擎错误转换为 HTTP 响应
pub fn error_response(err: &HWSystemError) -> HttpResponse {
    let (status, code) = match err {
        HWSystemError::Validation(_)
        | HWSystemError::Serialization(_)
        | HWSystemError::DateParse(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
        HWSystemError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        HWSystemError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        HWSystemError::InsufficientParticipants(_) | HWSystemError::InsufficientSubmissions(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InsufficientSubmissions,
        ),
        HWSystemError::SelfEvaluationViolation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::SelfEvaluationViolation,
        ),
        HWSystemError::WorkloadViolation(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::WorkloadViolation,
        ),
        HWSystemError::InvalidState(_) => (StatusCode::CONFLICT, ErrorCode::InvalidState),
        HWSystemError::ConcurrentModification(_) => {
            (StatusCode::CONFLICT, ErrorCode::ConcurrentModification)
        }
        HWSystemError::DataIntegrity(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DataIntegrity)
        }
        HWSystemError::DatabaseConfig(_)
        | HWSystemError::DatabaseConnection(_)
        | HWSystemError::DatabaseOperation(_)
        | HWSystemError::FileOperation(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    };

    if status.is_server_error() {
        error!("Request failed with {}: {}", err.code(), err.message());
    }

    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}
