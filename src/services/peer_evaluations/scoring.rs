use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::models::peer_evaluations::requests::{
    ReviewEvaluationRequest, StartEvaluationRequest, SubmitEvaluationRequest,
};
use crate::services::error_response;

pub async fn start_evaluation(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    evaluation_id: i64,
    req: StartEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator
        .start_evaluation(evaluation_id, req.evaluator_id)
        .await
    {
        Ok(evaluation) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(evaluation, "已开始评价")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn submit_evaluation(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    evaluation_id: i64,
    req: SubmitEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.submit_evaluation(evaluation_id, req).await {
        Ok(evaluation) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(evaluation, "评分已提交")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn review_evaluation(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    evaluation_id: i64,
    req: ReviewEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator.review_evaluation(evaluation_id, req.note).await {
        Ok(evaluation) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(evaluation, "复核完成")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
