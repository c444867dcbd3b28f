pub mod peer_evaluations;
pub mod submissions;

mod error_response;

pub use error_response::error_response;
pub use peer_evaluations::PeerEvaluationService;
pub use submissions::SubmissionService;

use std::sync::Arc;

use actix_web::{HttpRequest, Result as ActixResult, error::ErrorInternalServerError, web};

use crate::peer_evaluation::PeerEvaluationCoordinator;

// 从 app_data 中取出协调器
pub(crate) fn coordinator_from_request(
    request: &HttpRequest,
) -> ActixResult<Arc<PeerEvaluationCoordinator>> {
    request
        .app_data::<web::Data<Arc<PeerEvaluationCoordinator>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            ErrorInternalServerError("Peer evaluation coordinator not found in app data")
        })
}
