//! Material consumption requests: lifecycle actions, lines and adjustment.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use matcon_inventory::{
    ConsumptionChanges, ConsumptionLineId, ConsumptionLineView, ConsumptionRequestId, StockMove,
};
use matcon_infra::{AdjustmentOutcome, NewConsumption};

use crate::app::AppServices;
use crate::app::dto::{self, ConsumptionResponse};
use crate::app::errors::{ApiResult, domain_error_to_response};
use crate::authz::resolve_principal;
use crate::context::{CompanyContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/adjustment", post(adjust_batch))
        .route("/validate-lines", post(validate_lines))
        .route("/lines/:line_id", put(set_consume_qty))
        .route("/:id", get(get_one).patch(update).delete(delete))
        .route("/:id/start", post(start))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .route("/:id/reset", post(reset_to_draft))
        .route("/:id/validate", post(validate))
        .route("/:id/cancel", post(cancel))
        .route("/:id/lines", get(lines))
        .route("/:id/moves", get(moves))
        .route("/:id/account-moves", get(account_moves))
        .route("/:id/adjustment", get(adjustment_preview).post(adjust))
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewConsumption>,
) -> ApiResult<(StatusCode, Json<ConsumptionResponse>)> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.create(&principal, body, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ConsumptionResponse::from(&request))))
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult<Json<Vec<ConsumptionResponse>>> {
    let principal = resolve_principal(&company, &principal);
    let requests = services.consumptions.list(&principal)?;
    Ok(Json(dto::consumptions(&requests)))
}

pub async fn get_one(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.get(&principal, id)?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
    Json(body): Json<ConsumptionChanges>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services
        .consumptions
        .update_draft(&principal, id, body, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services.consumptions.delete(&principal, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.start(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.approve(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn reject(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.reject(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn reset_to_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services
        .consumptions
        .reset_to_draft(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn validate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.validate(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn validate_lines(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ValidateLinesRequest>,
) -> ApiResult<Json<Vec<ConsumptionResponse>>> {
    let principal = resolve_principal(&company, &principal);
    let requests = services
        .consumptions
        .validate_from_lines(&principal, &body.line_ids, Utc::now())?;
    Ok(Json(dto::consumptions(&requests)))
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<ConsumptionResponse>> {
    let principal = resolve_principal(&company, &principal);
    let request = services.consumptions.cancel(&principal, id, Utc::now())?;
    Ok(Json(ConsumptionResponse::from(&request)))
}

pub async fn lines(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<Vec<ConsumptionLineView>>> {
    let principal = resolve_principal(&company, &principal);
    Ok(Json(services.consumptions.lines(&principal, id)?))
}

pub async fn set_consume_qty(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(line_id): Path<ConsumptionLineId>,
    Json(body): Json<dto::SetConsumeQtyRequest>,
) -> ApiResult<Json<ConsumptionLineView>> {
    let principal = resolve_principal(&company, &principal);
    let view = services
        .consumptions
        .set_consume_qty(&principal, line_id, body.consume_qty)?;
    Ok(Json(view))
}

pub async fn moves(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<Vec<StockMove>>> {
    let principal = resolve_principal(&company, &principal);
    Ok(Json(services.consumptions.related_moves(&principal, id)?))
}

pub async fn account_moves(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<Json<dto::AccountMovesResponse>> {
    let principal = resolve_principal(&company, &principal);
    let entries = services.consumptions.account_moves(&principal, id)?;
    Ok(Json(dto::AccountMovesResponse {
        has_account_moves: !entries.is_empty(),
        entries,
    }))
}

/// Requests the adjustment of `id` would cover; 409 when it is cancelled.
pub async fn adjustment_preview(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
) -> ApiResult<axum::response::Response> {
    let principal = resolve_principal(&company, &principal);
    Ok(match services.consumptions.adjustment_for(&principal, id)? {
        Some(wizard) => Json(dto::AdjustmentPreview::from(&wizard)).into_response(),
        None => cancelled(),
    })
}

pub async fn adjust(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<ConsumptionRequestId>,
    Json(body): Json<dto::AdjustmentRequest>,
) -> ApiResult<axum::response::Response> {
    let principal = resolve_principal(&company, &principal);
    let Some(wizard) = services.consumptions.adjustment_for(&principal, id)? else {
        return Ok(cancelled());
    };
    let outcome = services
        .consumptions
        .run_adjustment(&principal, &wizard, body.account_id, Utc::now())?;
    Ok(Json(outcome).into_response())
}

pub async fn adjust_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::BatchAdjustmentRequest>,
) -> ApiResult<Json<AdjustmentOutcome>> {
    let principal = resolve_principal(&company, &principal);
    let wizard = services
        .consumptions
        .adjustment_for_batch(&principal, &body.consumption_ids)?;
    let outcome = services
        .consumptions
        .run_adjustment(&principal, &wizard, body.account_id, Utc::now())?;
    Ok(Json(outcome))
}

fn cancelled() -> axum::response::Response {
    domain_error_to_response(matcon_core::DomainError::invalid_state(
        "cancelled consumptions cannot be adjusted",
    ))
}
