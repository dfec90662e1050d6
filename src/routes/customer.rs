use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{dto::registry_dto::CreateCustomerPayload, error::Result, AppState};

#[axum::debug_handler]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let customer = state.customer_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[axum::debug_handler]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let customer = state.customer_service.get(id).await?;
    Ok(Json(customer))
}
