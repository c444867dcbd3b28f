use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::peer_evaluations::requests::TriggerPeerEvaluationRequest;
use crate::models::submissions::requests::SaveSubmissionRequest;
use crate::services::{PeerEvaluationService, SubmissionService};

// 懒加载的全局服务实例
static PEER_EVALUATION_SERVICE: Lazy<PeerEvaluationService> =
    Lazy::new(PeerEvaluationService::new_lazy);
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 触发互评分配
pub async fn trigger_peer_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<TriggerPeerEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .trigger_peer_evaluation(&req, path.into_inner(), body.into_inner())
        .await
}

// 互评进度
pub async fn get_evaluation_progress(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .get_evaluation_progress(&req, path.into_inner())
        .await
}

// 对账修复
pub async fn reconcile_homework(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    PEER_EVALUATION_SERVICE
        .reconcile_homework(&req, path.into_inner())
        .await
}

// 保存草稿
pub async fn save_submission(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SaveSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .save_submission(&req, path.into_inner(), body.into_inner())
        .await
}

// 配置路由
pub fn configure_homeworks_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/homeworks")
            .service(
                web::resource("/{id}/peer-evaluations")
                    .route(web::post().to(trigger_peer_evaluation)),
            )
            .service(
                web::resource("/{id}/peer-evaluations/status")
                    .route(web::get().to(get_evaluation_progress)),
            )
            .service(
                web::resource("/{id}/peer-evaluations/reconcile")
                    .route(web::post().to(reconcile_homework)),
            )
            .service(web::resource("/{id}/submissions").route(web::post().to(save_submission))),
    );
}
