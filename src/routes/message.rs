use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::message_dto::{CreateMessagePayload, HistoryResponse},
    error::Result,
    models::message::UpdateMessage,
    AppState,
};

#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let message = state.message_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.get(id).await?;
    Ok(Json(message))
}

#[utoipa::path(
    patch,
    path = "/api/messages/{id}",
    params(
        ("id" = i64, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message updated"),
        (status = 404, description = "Message not found"),
        (status = 422, description = "Neither state nor priority supplied")
    )
)]
#[axum::debug_handler]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMessage>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.update(id, payload).await?;
    Ok(Json(message))
}

#[axum::debug_handler]
pub async fn get_message_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let items = state.message_service.history(id).await?;
    Ok(Json(HistoryResponse {
        message_id: id,
        items,
    }))
}
