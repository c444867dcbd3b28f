use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::PeerEvaluationService;
use crate::models::ApiResponse;
use crate::models::peer_evaluations::requests::UserEvaluationQuery;
use crate::services::error_response;

pub async fn list_user_assignments(
    service: &PeerEvaluationService,
    request: &HttpRequest,
    user_id: i64,
    query: UserEvaluationQuery,
) -> ActixResult<HttpResponse> {
    let coordinator = service.get_coordinator(request)?;

    match coordinator
        .list_evaluator_assignments(user_id, query.status)
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
