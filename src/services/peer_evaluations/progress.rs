use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::services::error_response;

pub async fn get_evaluation_progress(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    homework_id: i64,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator
        .get_assignment_evaluation_status(homework_id)
        .await
    {
        Ok(progress) => Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
