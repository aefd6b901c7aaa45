//! Master data endpoints (admin only).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    routing::{post, put},
};

use matcon_accounting::Account;
use matcon_inventory::Location;
use matcon_products::Product;

use crate::app::AppServices;
use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::authz::resolve_principal;
use crate::context::{CompanyContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/products", post(register_product))
        .route("/locations", post(register_location))
        .route("/accounts", post(register_account))
        .route("/consumption-location", put(set_consumption_location))
        .route("/quantities", put(set_quantity))
}

pub async fn register_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Product>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services.catalog.register_product(&principal, body)?;
    Ok(StatusCode::CREATED)
}

pub async fn register_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Location>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services.catalog.register_location(&principal, body)?;
    Ok(StatusCode::CREATED)
}

pub async fn register_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Account>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services.catalog.register_account(&principal, body)?;
    Ok(StatusCode::CREATED)
}

pub async fn set_consumption_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ConsumptionLocationRequest>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services
        .catalog
        .set_consumption_location(&principal, body.location_id, body.product_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::QuantityRequest>,
) -> ApiResult<StatusCode> {
    let principal = resolve_principal(&company, &principal);
    services
        .catalog
        .set_quantity(&principal, body.product_id, body.location_id, body.quantity)?;
    Ok(StatusCode::NO_CONTENT)
}
