use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use validator::Validate;

use crate::{
    config::get_config,
    dto::message_dto::CreateMessagePayload,
    error::{Error, Result},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct IngestionEnvelope<T> {
    pub event: String,
    #[serde(flatten)]
    pub payload: T,
}

/// Entry point for the mail-ingestion producer.
pub async fn handle_message_received(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(envelope): Json<IngestionEnvelope<CreateMessagePayload>>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    verify_secret(&headers)?;
    if envelope.event != "message_received" {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "unexpected_event" })),
        ));
    }
    envelope.payload.validate()?;

    let message = state.message_service.create(envelope.payload.into()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "id": message.id, "state": message.actual_state })),
    ))
}

fn verify_secret(headers: &axum::http::HeaderMap) -> Result<()> {
    let Some(secret_hdr) = headers.get("x-webhook-secret") else {
        return Err(Error::Unauthorized("missing_webhook_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    let expected = &get_config().ingestion_webhook_secret;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_secret".into()))
    }
}
