use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::models::peer_evaluations::requests::TriggerPeerEvaluationRequest;
use crate::services::error_response;

pub async fn trigger_peer_evaluation(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    homework_id: i64,
    req: TriggerPeerEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.trigger_peer_evaluation(homework_id, req).await {
        Ok(response) => {
            let message = if response.warnings.is_empty() {
                "互评分配完成".to_string()
            } else {
                format!(
                    "互评分配完成，{} 份提交未达到目标评价人数",
                    response.warnings.len()
                )
            };
            Ok(HttpResponse::Created().json(ApiResponse::success(response, message)))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
