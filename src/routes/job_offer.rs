use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::job_offer_dto::{
        ChangeStatusPayload, CreateJobOfferPayload, JobOfferResponse, JobOfferValueResponse,
        JobStatusEntry,
    },
    error::Result,
    models::job_offer::JobStatus,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/job-offers",
    request_body = CreateJobOfferPayload,
    responses(
        (status = 201, description = "Job offer created in CREATED status", body = Json<JobOfferResponse>),
        (status = 404, description = "Customer not found"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_job_offer(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobOfferPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let offer = state.job_offer_service.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(JobOfferResponse::from(offer))))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/{id}",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Job offer found", body = Json<JobOfferResponse>),
        (status = 404, description = "Job offer not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_offer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let offer = state.job_offer_service.get(id).await?;
    Ok(Json(JobOfferResponse::from(offer)))
}

#[utoipa::path(
    delete,
    path = "/api/job-offers/{id}",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 204, description = "Job offer deleted"),
        (status = 404, description = "Job offer not found"),
        (status = 409, description = "Job offer already consolidated")
    )
)]
#[axum::debug_handler]
pub async fn delete_job_offer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.job_offer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/job-offers/{id}/status",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    request_body = ChangeStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Json<JobOfferResponse>),
        (status = 404, description = "Job offer or professional not found"),
        (status = 409, description = "Illegal transition or professional not available"),
        (status = 422, description = "Missing or invalid professional ids")
    )
)]
#[axum::debug_handler]
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse> {
    let offer = state
        .job_offer_service
        .change_status(id, payload.into())
        .await?;
    Ok(Json(JobOfferResponse::from(offer)))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/{id}/value",
    params(
        ("id" = i64, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Contract value", body = Json<JobOfferValueResponse>),
        (status = 404, description = "Job offer not found or not consolidated yet")
    )
)]
#[axum::debug_handler]
pub async fn get_job_offer_value(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let offer = state.job_offer_service.get_value(id).await?;
    Ok(Json(JobOfferValueResponse::from(offer)))
}

pub async fn list_job_offer_statuses() -> Json<Vec<JobStatusEntry>> {
    Json(JobStatus::ALL.into_iter().map(JobStatusEntry::from).collect())
}
