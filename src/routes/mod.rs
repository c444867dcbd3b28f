pub mod homeworks;

pub mod peer_evaluations;

pub mod submissions;

pub use homeworks::configure_homeworks_routes;
pub use peer_evaluations::configure_peer_evaluation_routes;
pub use submissions::configure_submissions_routes;
