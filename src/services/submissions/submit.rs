use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::models::submissions::requests::SubmitSubmissionRequest;
use crate::services::error_response;

pub async fn submit_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
    req: SubmitSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator
        .submit_submission(submission_id, req.creator_id)
        .await
    {
        Ok(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "提交成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
