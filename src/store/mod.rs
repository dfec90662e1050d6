//! Persistence boundary for the lifecycle core.
//!
//! Every mutating call is applied as a single unit: either all of its effects
//! become visible or none do. Job offers and professionals carry a `version`
//! that commits compare-and-swap against.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::customer::{Customer, NewCustomer};
use crate::models::job_offer::{CandidateSnapshot, JobOffer, JobStatus, NewJobOffer};
use crate::models::message::{CreateMessage, HistoryEntry, Message, MessagePriority, MessageState};
use crate::models::professional::{EmploymentState, NewProfessional, Professional};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Reservation guarded by the professional version read before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub professional_id: i64,
    pub expected_version: i64,
}

/// All effects of one job offer status change.
#[derive(Debug, Clone)]
pub struct JobOfferCommit {
    pub job_offer_id: i64,
    pub expected_version: i64,
    pub status: JobStatus,
    pub note: Option<String>,
    pub new_candidates: Vec<CandidateSnapshot>,
    pub professional_id: Option<i64>,
    pub value: Option<Decimal>,
    pub end_time: Option<DateTime<Utc>>,
    pub reservation: Option<Reservation>,
    pub release: Option<i64>,
}

impl JobOfferCommit {
    pub fn new(offer: &JobOffer, status: JobStatus) -> Self {
        Self {
            job_offer_id: offer.id,
            expected_version: offer.version,
            status,
            note: None,
            new_candidates: Vec::new(),
            professional_id: None,
            value: None,
            end_time: None,
            reservation: None,
            release: None,
        }
    }
}

/// New history row written together with a message state change.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub state: MessageState,
    pub date: DateTime<Utc>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MessageCommit {
    pub message_id: i64,
    pub expected_version: i64,
    pub transition: Option<NewHistoryEntry>,
    pub priority: Option<MessagePriority>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Short backend name reported by the health check.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<()>;

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>>;

    async fn insert_professional(&self, professional: NewProfessional) -> Result<Professional>;

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>>;

    /// Sets the employment state when the stored version still matches.
    /// Returns `None` on a version mismatch.
    async fn swap_employment_state(
        &self,
        id: i64,
        expected_version: i64,
        state: EmploymentState,
    ) -> Result<Option<Professional>>;

    async fn insert_job_offer(&self, offer: NewJobOffer) -> Result<JobOffer>;

    /// Logically deleted offers are never returned.
    async fn find_job_offer(&self, id: i64) -> Result<Option<JobOffer>>;

    /// Applies a status change atomically. Fails with `StaleJobOffer` on a
    /// version mismatch and `InconsistentProfessionalStatus` when the
    /// reservation no longer holds.
    async fn commit_job_offer(&self, commit: JobOfferCommit) -> Result<JobOffer>;

    /// Returns `false` when the version no longer matches.
    async fn delete_job_offer(&self, id: i64, expected_version: i64) -> Result<bool>;

    /// Inserts the message in RECEIVED state together with its first history entry.
    async fn insert_message(&self, message: CreateMessage, at: DateTime<Utc>) -> Result<Message>;

    async fn find_message(&self, id: i64) -> Result<Option<Message>>;

    async fn commit_message(&self, commit: MessageCommit) -> Result<Message>;

    /// Oldest first.
    async fn history(&self, message_id: i64) -> Result<Vec<HistoryEntry>>;
}
