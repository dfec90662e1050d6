use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::job_offer::JobStatus;
use crate::models::professional::EmploymentState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    JobOffer,
    Professional,
    Message,
    Customer,
}

impl Entity {
    pub const fn label(self) -> &'static str {
        match self {
            Entity::JobOffer => "Job offer",
            Entity::Professional => "Professional",
            Entity::Message => "Message",
            Entity::Customer => "Customer",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{} {} not found", .entity.label(), .id)]
    NotFound { entity: Entity, id: i64 },

    #[error("Job offer {job_offer_id} has no computed value yet")]
    ValueNotReady { job_offer_id: i64 },

    #[error("Illegal transition from {} to {}; allowed next statuses: {}", .from, .to, join_statuses(.allowed))]
    IllegalTransition {
        from: JobStatus,
        to: JobStatus,
        allowed: Vec<JobStatus>,
    },

    #[error("Professional id required: {0}")]
    RequiredProfessionalId(String),

    #[error("Professional {professional_id} is not a candidate of job offer {job_offer_id}")]
    ProfessionalNotCandidate {
        job_offer_id: i64,
        professional_id: i64,
    },

    #[error("Professional {professional_id} is not available ({state})")]
    NotAvailable {
        professional_id: i64,
        state: EmploymentState,
    },

    #[error("Professional {professional_id} changed employment state concurrently")]
    InconsistentProfessionalStatus { professional_id: i64 },

    #[error("Job offer {job_offer_id} was modified concurrently")]
    StaleJobOffer { job_offer_id: i64 },

    #[error("Job offer {job_offer_id} can no longer be modified ({status})")]
    JobOfferNotMutable {
        job_offer_id: i64,
        status: JobStatus,
    },

    #[error("Message {message_id} was modified concurrently")]
    StaleMessage { message_id: i64 },

    #[error("Nothing to update")]
    NoOpUpdate,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_statuses(statuses: &[JobStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Stable machine-readable error kind exposed to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound { .. } | Error::ValueNotReady { .. } => "not_found",
            Error::IllegalTransition { .. } => "illegal_transition",
            Error::RequiredProfessionalId(_) => "required_professional_id",
            Error::ProfessionalNotCandidate { .. } => "professional_not_candidate",
            Error::NotAvailable { .. } => "not_available",
            Error::InconsistentProfessionalStatus { .. } => "inconsistent_professional_status",
            Error::StaleJobOffer { .. } => "stale_job_offer",
            Error::StaleMessage { .. } => "stale_message",
            Error::JobOfferNotMutable { .. } => "job_offer_not_mutable",
            Error::NoOpUpdate => "no_op_update",
            Error::Database(_) => "database",
            Error::Validation(_) => "validation",
            Error::Json(_) => "json",
            Error::Reqwest(_) => "upstream",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound { .. } | Error::ValueNotReady { .. } => StatusCode::NOT_FOUND,
            Error::IllegalTransition { .. }
            | Error::NotAvailable { .. }
            | Error::InconsistentProfessionalStatus { .. }
            | Error::StaleJobOffer { .. }
            | Error::StaleMessage { .. }
            | Error::JobOfferNotMutable { .. } => StatusCode::CONFLICT,
            Error::RequiredProfessionalId(_)
            | Error::ProfessionalNotCandidate { .. }
            | Error::NoOpUpdate
            | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Database(_) | Error::Internal(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let kind = self.kind();
        let message = match &self {
            Error::Database(_) | Error::Internal(_) | Error::Io(_) | Error::Config(_) => {
                tracing::error!(error = %self, "request failed");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = match &self {
            Error::IllegalTransition { allowed, .. } => json!({
                "error": message,
                "kind": kind,
                "allowed": allowed,
                "statuses": JobStatus::ALL,
            }),
            _ => json!({ "error": message, "kind": kind }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Database(sqlx::Error::Migrate(Box::new(err)))
    }
}
