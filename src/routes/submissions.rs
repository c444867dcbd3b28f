use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::submissions::requests::SubmitSubmissionRequest;
use crate::services::SubmissionService;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 获取提交详情（含分配镜像与最终成绩）
pub async fn get_submission(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .get_submission(&req, path.into_inner())
        .await
}

// 正式提交
pub async fn submit_submission(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SubmitSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .submit_submission(&req, path.into_inner(), body.into_inner())
        .await
}

// 汇总最终成绩
pub async fn compile_final_evaluation(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .compile_final_evaluation(&req, path.into_inner())
        .await
}

// 退回提交
pub async fn return_submission(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .return_submission(&req, path.into_inner())
        .await
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .service(web::resource("/{id}").route(web::get().to(get_submission)))
            .service(web::resource("/{id}/submit").route(web::post().to(submit_submission)))
            .service(
                web::resource("/{id}/final-evaluation")
                    .route(web::post().to(compile_final_evaluation)),
            )
            .service(web::resource("/{id}/return").route(web::post().to(return_submission))),
    );
}
