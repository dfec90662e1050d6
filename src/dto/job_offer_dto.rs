use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::job_offer::{JobOffer, JobStatus, NewJobOffer};
use crate::services::job_offer_service::StatusChange;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobOfferPayload {
    pub customer_id: i64,
    #[validate(length(min = 1))]
    pub required_skills: Vec<String>,
    #[validate(range(min = 0))]
    pub duration: i32,
    pub note: Option<String>,
}

impl From<CreateJobOfferPayload> for NewJobOffer {
    fn from(p: CreateJobOfferPayload) -> Self {
        Self {
            customer_id: p.customer_id,
            required_skills: p.required_skills,
            duration: p.duration,
            note: p.note,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusPayload {
    pub status: JobStatus,
    #[serde(default)]
    pub candidate_professional_ids: Vec<i64>,
    pub note: Option<String>,
}

impl From<ChangeStatusPayload> for StatusChange {
    fn from(p: ChangeStatusPayload) -> Self {
        Self {
            next_status: p.status,
            candidate_professional_ids: p.candidate_professional_ids,
            note: p.note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOfferResponse {
    pub id: i64,
    pub customer_id: i64,
    pub status: JobStatus,
    pub required_skills: Vec<String>,
    pub duration: i32,
    pub value: Decimal,
    pub note: Option<String>,
    pub candidate_professional_ids: Vec<i64>,
    pub professional_id: Option<i64>,
    pub creation_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub version: i64,
}

impl From<JobOffer> for JobOfferResponse {
    fn from(o: JobOffer) -> Self {
        Self {
            candidate_professional_ids: o.candidate_professional_ids().into_iter().collect(),
            id: o.id,
            customer_id: o.customer_id,
            status: o.status,
            required_skills: o.required_skills,
            duration: o.duration,
            value: o.value,
            note: o.note,
            professional_id: o.professional_id,
            creation_time: o.creation_time,
            end_time: o.end_time,
            version: o.version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOfferValueResponse {
    pub id: i64,
    pub status: JobStatus,
    pub professional_id: Option<i64>,
    pub duration: i32,
    pub value: Decimal,
}

impl From<JobOffer> for JobOfferValueResponse {
    fn from(o: JobOffer) -> Self {
        Self {
            id: o.id,
            status: o.status,
            professional_id: o.professional_id,
            duration: o.duration,
            value: o.value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusEntry {
    pub status: JobStatus,
    pub next_statuses: Vec<JobStatus>,
    pub terminal: bool,
}

impl From<JobStatus> for JobStatusEntry {
    fn from(status: JobStatus) -> Self {
        Self {
            status,
            next_statuses: status.next_statuses().to_vec(),
            terminal: status.is_terminal(),
        }
    }
}
