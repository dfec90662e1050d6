pub mod customer;
pub mod health;
pub mod ingestion;
pub mod job_offer;
pub mod message;
pub mod professional;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/customers", post(customer::create_customer))
        .route("/api/customers/:id", get(customer::get_customer))
        .route("/api/professionals", post(professional::create_professional))
        .route("/api/professionals/:id", get(professional::get_professional))
        .route("/api/job-offers", post(job_offer::create_job_offer))
        .route(
            "/api/job-offers/:id",
            get(job_offer::get_job_offer).delete(job_offer::delete_job_offer),
        )
        .route("/api/job-offers/:id/status", post(job_offer::change_status))
        .route("/api/job-offers/:id/value", get(job_offer::get_job_offer_value))
        .route(
            "/api/dictionaries/job-offer-statuses",
            get(job_offer::list_job_offer_statuses),
        )
        .route("/api/messages", post(message::create_message))
        .route(
            "/api/messages/:id",
            get(message::get_message).patch(message::update_message),
        )
        .route("/api/messages/:id/history", get(message::get_message_history))
        .route(
            "/api/ingestion/messages",
            post(ingestion::handle_message_received),
        )
}
