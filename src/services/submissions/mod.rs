pub mod detail;
pub mod finalize;
pub mod save;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::submissions::requests::{SaveSubmissionRequest, SubmitSubmissionRequest};
use crate::peer_evaluation::PeerEvaluationCoordinator;

pub struct SubmissionService {
    coordinator: Option<Arc<PeerEvaluationCoordinator>>,
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self { coordinator: None }
    }

    pub(crate) fn get_coordinator(
        &self,
        request: &HttpRequest,
    ) -> ActixResult<Arc<PeerEvaluationCoordinator>> {
        match &self.coordinator {
            Some(coordinator) => Ok(coordinator.clone()),
            None => super::coordinator_from_request(request),
        }
    }

    pub async fn save_submission(
        &self,
        request: &HttpRequest,
        homework_id: i64,
        req: SaveSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        save::save_submission(self, request, homework_id, req).await
    }

    pub async fn submit_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        req: SubmitSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_submission(self, request, submission_id, req).await
    }

    pub async fn get_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_submission(self, request, submission_id).await
    }

    pub async fn compile_final_evaluation(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        finalize::compile_final_evaluation(self, request, submission_id).await
    }

    pub async fn return_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        finalize::return_submission(self, request, submission_id).await
    }
}
