use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::models::peer_evaluations::requests::ReassignEvaluationRequest;
use crate::services::error_response;

pub async fn reassign_evaluation(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    evaluation_id: i64,
    req: ReassignEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator
        .reassign(evaluation_id, req.new_evaluator_id, &req.reason)
        .await
    {
        Ok(evaluation) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(evaluation, "改派成功")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
