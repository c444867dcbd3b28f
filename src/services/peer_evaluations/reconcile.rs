use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::services::error_response;

pub async fn reconcile_homework(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    homework_id: i64,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.reconcile_homework(homework_id).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report, "对账完成"))),
        Err(e) => Ok(error_response(&e)),
    }
}
