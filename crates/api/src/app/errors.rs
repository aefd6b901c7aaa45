use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use matcon_core::DomainError;
use matcon_infra::ServiceError;

/// Error side of every handler: a service failure rendered as JSON.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        Self(ServiceError::Domain(value))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        service_error_to_response(self.0)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        ServiceError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        DomainError::Conflict(_)
        | DomainError::InvalidState(_)
        | DomainError::AlreadyAdjusted(_)
        | DomainError::DeletionForbidden(_) => StatusCode::CONFLICT,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_refusals_are_conflicts() {
        let res = domain_error_to_response(DomainError::already_adjusted("MCR/00001"));
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = domain_error_to_response(DomainError::deletion_forbidden("MCR/00001"));
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn permission_refusal_is_forbidden() {
        let res = domain_error_to_response(DomainError::permission_denied("stock.consumption.validate"));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
