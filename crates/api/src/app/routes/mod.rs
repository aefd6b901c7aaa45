use axum::{Router, routing::get};

pub mod catalog;
pub mod consumptions;
pub mod system;

/// Router for all authenticated (company-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/consumptions", consumptions::router())
        .nest("/catalog", catalog::router())
}
