use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{dto::registry_dto::CreateProfessionalPayload, error::Result, AppState};

#[utoipa::path(
    post,
    path = "/api/professionals",
    request_body = CreateProfessionalPayload,
    responses(
        (status = 201, description = "Professional registered as AVAILABLE_FOR_WORK"),
        (status = 400, description = "Negative daily rate"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_professional(
    State(state): State<AppState>,
    Json(payload): Json<CreateProfessionalPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let professional = state.professional_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(professional)))
}

#[axum::debug_handler]
pub async fn get_professional(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let professional = state.professional_service.get(id).await?;
    Ok(Json(professional))
}
