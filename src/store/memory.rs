use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{JobOfferCommit, LifecycleStore, MessageCommit};
use crate::error::{Entity, Error, Result};
use crate::models::customer::{Customer, NewCustomer};
use crate::models::job_offer::{JobOffer, JobStatus, NewJobOffer};
use crate::models::message::{CreateMessage, HistoryEntry, Message, MessageState};
use crate::models::professional::{EmploymentState, NewProfessional, Professional};
use crate::utils::time::now;

#[derive(Default)]
struct Tables {
    customers: BTreeMap<i64, Customer>,
    professionals: BTreeMap<i64, Professional>,
    job_offers: BTreeMap<i64, (JobOffer, bool)>,
    messages: BTreeMap<i64, Message>,
    history: Vec<HistoryEntry>,
    sequence: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Process-local store; every call runs under one lock so commits are atomic.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".into()))
    }
}

fn set_employment_state(professional: &mut Professional, state: EmploymentState, at: DateTime<Utc>) {
    if professional.employment_state != state {
        professional.employment_state = state;
        professional.version += 1;
        professional.updated_at = at;
    }
}

#[async_trait]
impl LifecycleStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.tables().map(|_| ())
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut tables = self.tables()?;
        let id = tables.next_id();
        let row = Customer {
            id,
            name: customer.name,
            note: customer.note,
            created_at: now(),
        };
        tables.customers.insert(id, row.clone());
        Ok(row)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        Ok(self.tables()?.customers.get(&id).cloned())
    }

    async fn insert_professional(&self, professional: NewProfessional) -> Result<Professional> {
        let mut tables = self.tables()?;
        let id = tables.next_id();
        let at = now();
        let row = Professional {
            id,
            name: professional.name,
            skills: professional.skills,
            geographical_location: professional.geographical_location,
            daily_rate: professional.daily_rate,
            employment_state: EmploymentState::AvailableForWork,
            version: 0,
            created_at: at,
            updated_at: at,
        };
        tables.professionals.insert(id, row.clone());
        Ok(row)
    }

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>> {
        Ok(self.tables()?.professionals.get(&id).cloned())
    }

    async fn swap_employment_state(
        &self,
        id: i64,
        expected_version: i64,
        state: EmploymentState,
    ) -> Result<Option<Professional>> {
        let mut tables = self.tables()?;
        let professional = tables
            .professionals
            .get_mut(&id)
            .ok_or(Error::NotFound {
                entity: Entity::Professional,
                id,
            })?;
        if professional.version != expected_version {
            return Ok(None);
        }
        set_employment_state(professional, state, now());
        Ok(Some(professional.clone()))
    }

    async fn insert_job_offer(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let mut tables = self.tables()?;
        if !tables.customers.contains_key(&offer.customer_id) {
            return Err(Error::NotFound {
                entity: Entity::Customer,
                id: offer.customer_id,
            });
        }
        let id = tables.next_id();
        let row = JobOffer {
            id,
            customer_id: offer.customer_id,
            status: JobStatus::Created,
            required_skills: offer.required_skills,
            duration: offer.duration,
            value: Decimal::ZERO,
            note: offer.note,
            candidates: Vec::new(),
            professional_id: None,
            creation_time: now(),
            end_time: None,
            version: 0,
        };
        tables.job_offers.insert(id, (row.clone(), false));
        Ok(row)
    }

    async fn find_job_offer(&self, id: i64) -> Result<Option<JobOffer>> {
        Ok(self
            .tables()?
            .job_offers
            .get(&id)
            .filter(|(_, deleted)| !deleted)
            .map(|(offer, _)| offer.clone()))
    }

    async fn commit_job_offer(&self, commit: JobOfferCommit) -> Result<JobOffer> {
        let mut tables = self.tables()?;
        let at = now();

        // Validate everything before touching any row.
        let current = match tables.job_offers.get(&commit.job_offer_id) {
            Some((offer, false)) => offer,
            _ => {
                return Err(Error::NotFound {
                    entity: Entity::JobOffer,
                    id: commit.job_offer_id,
                })
            }
        };
        if current.version != commit.expected_version {
            return Err(Error::StaleJobOffer {
                job_offer_id: commit.job_offer_id,
            });
        }
        if let Some(reservation) = commit.reservation {
            let holds = tables
                .professionals
                .get(&reservation.professional_id)
                .map(|p| p.version == reservation.expected_version && p.is_available())
                .unwrap_or(false);
            if !holds {
                return Err(Error::InconsistentProfessionalStatus {
                    professional_id: reservation.professional_id,
                });
            }
        }
        if let Some(released) = commit.release {
            if !tables.professionals.contains_key(&released) {
                return Err(Error::NotFound {
                    entity: Entity::Professional,
                    id: released,
                });
            }
        }

        if let Some(reservation) = commit.reservation {
            if let Some(professional) = tables.professionals.get_mut(&reservation.professional_id) {
                set_employment_state(professional, EmploymentState::Employed, at);
            }
        }
        if let Some(released) = commit.release {
            if let Some(professional) = tables.professionals.get_mut(&released) {
                set_employment_state(professional, EmploymentState::AvailableForWork, at);
            }
        }

        let (offer, _) = tables
            .job_offers
            .get_mut(&commit.job_offer_id)
            .ok_or_else(|| Error::Internal("job offer vanished during commit".into()))?;
        offer.status = commit.status;
        if let Some(note) = commit.note {
            offer.note = Some(note);
        }
        for candidate in commit.new_candidates {
            if offer.candidate(candidate.professional_id).is_none() {
                offer.candidates.push(candidate);
            }
        }
        if let Some(professional_id) = commit.professional_id {
            offer.professional_id = Some(professional_id);
        }
        if let Some(value) = commit.value {
            offer.value = value;
        }
        if let Some(end_time) = commit.end_time {
            offer.end_time = Some(end_time);
        }
        offer.version += 1;
        Ok(offer.clone())
    }

    async fn delete_job_offer(&self, id: i64, expected_version: i64) -> Result<bool> {
        let mut tables = self.tables()?;
        match tables.job_offers.get_mut(&id) {
            Some((offer, deleted)) if !*deleted && offer.version == expected_version => {
                *deleted = true;
                offer.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_message(&self, message: CreateMessage, at: DateTime<Utc>) -> Result<Message> {
        let mut tables = self.tables()?;
        let id = tables.next_id();
        let row = Message {
            id,
            sender: message.sender,
            channel: message.channel,
            subject: message.subject,
            body: message.body,
            priority: message.priority,
            actual_state: MessageState::Received,
            date: at,
            updated_at: at,
            version: 0,
        };
        let entry_id = tables.next_id();
        tables.history.push(HistoryEntry {
            id: entry_id,
            message_id: id,
            state: MessageState::Received,
            date: at,
            comment: None,
        });
        tables.messages.insert(id, row.clone());
        Ok(row)
    }

    async fn find_message(&self, id: i64) -> Result<Option<Message>> {
        Ok(self.tables()?.messages.get(&id).cloned())
    }

    async fn commit_message(&self, commit: MessageCommit) -> Result<Message> {
        let mut tables = self.tables()?;
        let version = tables
            .messages
            .get(&commit.message_id)
            .map(|m| m.version)
            .ok_or(Error::NotFound {
                entity: Entity::Message,
                id: commit.message_id,
            })?;
        if version != commit.expected_version {
            return Err(Error::StaleMessage {
                message_id: commit.message_id,
            });
        }

        if let Some(entry) = &commit.transition {
            let entry_id = tables.next_id();
            tables.history.push(HistoryEntry {
                id: entry_id,
                message_id: commit.message_id,
                state: entry.state,
                date: entry.date,
                comment: entry.comment.clone(),
            });
        }
        let message = tables
            .messages
            .get_mut(&commit.message_id)
            .ok_or_else(|| Error::Internal("message vanished during commit".into()))?;
        if let Some(entry) = commit.transition {
            message.actual_state = entry.state;
        }
        if let Some(priority) = commit.priority {
            message.priority = priority;
        }
        message.updated_at = commit.updated_at;
        message.version += 1;
        Ok(message.clone())
    }

    async fn history(&self, message_id: i64) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .tables()?
            .history
            .iter()
            .filter(|entry| entry.message_id == message_id)
            .cloned()
            .collect())
    }
}
