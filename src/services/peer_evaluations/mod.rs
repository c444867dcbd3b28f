pub mod assignments;
pub mod progress;
pub mod reassign;
pub mod reconcile;
pub mod scoring;
pub mod trigger;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::peer_evaluations::requests::{
    ReassignEvaluationRequest, ReviewEvaluationRequest, StartEvaluationRequest,
    SubmitEvaluationRequest, TriggerPeerEvaluationRequest, UserEvaluationQuery,
};
use crate::peer_evaluation::PeerEvaluationCoordinator;

pub struct PeerEvaluationService {
    coordinator: Option<Arc<PeerEvaluationCoordinator>>,
}

impl PeerEvaluationService {
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

    pub async fn trigger_peer_evaluation(
        &self,
        request: &HttpRequest,
        homework_id: i64,
        req: TriggerPeerEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        trigger::trigger_peer_evaluation(self, request, homework_id, req).await
    }

    pub async fn get_evaluation_progress(
        &self,
        request: &HttpRequest,
        homework_id: i64,
    ) -> ActixResult<HttpResponse> {
        progress::get_evaluation_progress(self, request, homework_id).await
    }

    pub async fn reconcile_homework(
        &self,
        request: &HttpRequest,
        homework_id: i64,
    ) -> ActixResult<HttpResponse> {
        reconcile::reconcile_homework(self, request, homework_id).await
    }

    pub async fn list_user_assignments(
        &self,
        request: &HttpRequest,
        user_id: i64,
        query: UserEvaluationQuery,
    ) -> ActixResult<HttpResponse> {
        assignments::list_user_assignments(self, request, user_id, query).await
    }

    pub async fn start_evaluation(
        &self,
        request: &HttpRequest,
        evaluation_id: i64,
        req: StartEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        scoring::start_evaluation(self, request, evaluation_id, req).await
    }

    pub async fn submit_evaluation(
        &self,
        request: &HttpRequest,
        evaluation_id: i64,
        req: SubmitEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        scoring::submit_evaluation(self, request, evaluation_id, req).await
    }

    pub async fn review_evaluation(
        &self,
        request: &HttpRequest,
        evaluation_id: i64,
        req: ReviewEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        scoring::review_evaluation(self, request, evaluation_id, req).await
    }

    pub async fn reassign_evaluation(
        &self,
        request: &HttpRequest,
        evaluation_id: i64,
        req: ReassignEvaluationRequest,
    ) -> ActixResult<HttpResponse> {
        reassign::reassign_evaluation(self, request, evaluation_id, req).await
    }
}
