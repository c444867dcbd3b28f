use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::services::error_response;

pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.get_submission(submission_id).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
