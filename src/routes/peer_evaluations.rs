use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::peer_evaluations::requests::{
    ReassignEvaluationRequest, ReviewEvaluationRequest, StartEvaluationRequest,
    SubmitEvaluationRequest, UserEvaluationQuery,
};
use crate::services::PeerEvaluationService;

// 懒加载的全局 PeerEvaluationService 实例
static PEER_EVALUATION_SERVICE: Lazy<PeerEvaluationService> =
    Lazy::new(PeerEvaluationService::new_lazy);

// 用户的互评任务
pub async fn list_user_assignments(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<UserEvaluationQuery>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .list_user_assignments(&req, path.into_inner(), query.into_inner())
        .await
}

// 开始评价
pub async fn start_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<StartEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .start_evaluation(&req, path.into_inner(), body.into_inner())
        .await
}

// 提交评分
pub async fn submit_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SubmitEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .submit_evaluation(&req, path.into_inner(), body.into_inner())
        .await
}

// 复核评价
pub async fn review_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<ReviewEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .review_evaluation(&req, path.into_inner(), body.into_inner())
        .await
}

// 改派评价人
pub async fn reassign_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<ReassignEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .reassign_evaluation(&req, path.into_inner(), body.into_inner())
        .await
}

// 配置路由
pub fn configure_peer_evaluation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/peer-evaluations")
            .service(web::resource("/{id}/start").route(web::post().to(start_evaluation)))
            .service(web::resource("/{id}/submit").route(web::post().to(submit_evaluation)))
            .service(web::resource("/{id}/review").route(web::post().to(review_evaluation)))
            .service(web::resource("/{id}/reassign").route(web::post().to(reassign_evaluation))),
    )
    .service(
        web::resource("/api/v1/users/{id}/peer-evaluations")
            .route(web::get().to(list_user_assignments)),
    );
}
