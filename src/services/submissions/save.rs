use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::models::submissions::requests::SaveSubmissionRequest;
use crate::services::error_response;

pub async fn save_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    homework_id: i64,
    req: SaveSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.save_submission(homework_id, req).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "草稿已保存"))),
        Err(e) => Ok(error_response(&e)),
    }
}
