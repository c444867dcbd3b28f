use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::ApiResponse;
use crate::services::error_response;

pub async fn compile_final_evaluation(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.compile_final_evaluation(submission_id).await {
        Ok(Some(result)) => Ok(HttpResponse::Ok().json(ApiResponse::success(result, "成绩已汇总"))),
        // 没有已完成的评价，不改动提交
        Ok(None) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("暂无已完成的评价"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn return_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.return_submission(submission_id).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "已退回"))),
        Err(e) => Ok(error_response(&e)),
    }
}
