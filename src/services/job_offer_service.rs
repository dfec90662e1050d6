use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{Entity, Error, Result};
use crate::models::event::LifecycleEvent;
use crate::models::job_offer::{contract_value, CandidateSnapshot, JobOffer, JobStatus, NewJobOffer};
use crate::services::notification_service::NotificationService;
use crate::services::professional_service::ProfessionalService;
use crate::store::{JobOfferCommit, LifecycleStore};
use crate::utils::keyed_lock::KeyedLocks;
use crate::utils::time::now;

/// Requested move of a job offer along the recruitment pipeline.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub next_status: JobStatus,
    pub candidate_professional_ids: Vec<i64>,
    pub note: Option<String>,
}

/// Coordinates job offer status, candidate professionals and contract value.
#[derive(Clone)]
pub struct JobOfferService {
    store: Arc<dyn LifecycleStore>,
    professionals: ProfessionalService,
    notifications: NotificationService,
    locks: KeyedLocks,
}

impl JobOfferService {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        professionals: ProfessionalService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            professionals,
            notifications,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn create(&self, offer: NewJobOffer) -> Result<JobOffer> {
        if offer.required_skills.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::BadRequest("requiredSkills must not be empty".into()));
        }
        if offer.duration < 0 {
            return Err(Error::BadRequest("duration must not be negative".into()));
        }
        if self.store.find_customer(offer.customer_id).await?.is_none() {
            return Err(Error::NotFound {
                entity: Entity::Customer,
                id: offer.customer_id,
            });
        }
        let created = self.store.insert_job_offer(offer).await?;
        tracing::info!(job_offer_id = created.id, customer_id = created.customer_id, "job offer created");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<JobOffer> {
        self.store.find_job_offer(id).await?.ok_or(Error::NotFound {
            entity: Entity::JobOffer,
            id,
        })
    }

    /// Returns the offer only once its contract value has been computed.
    pub async fn get_value(&self, id: i64) -> Result<JobOffer> {
        let offer = self.get(id).await?;
        if !offer.has_computed_value() {
            return Err(Error::ValueNotReady { job_offer_id: id });
        }
        Ok(offer)
    }

    /// Logical delete, allowed only before consolidation.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let _guard = self.locks.lock(id).await;
        let offer = self.get(id).await?;
        if !offer.status.is_mutable() {
            return Err(Error::JobOfferNotMutable {
                job_offer_id: id,
                status: offer.status,
            });
        }
        if !self.store.delete_job_offer(id, offer.version).await? {
            return Err(Error::StaleJobOffer { job_offer_id: id });
        }
        tracing::info!(job_offer_id = id, "job offer deleted");
        Ok(())
    }

    pub async fn change_status(&self, id: i64, change: StatusChange) -> Result<JobOffer> {
        let _offer_guard = self.locks.lock(id).await;
        let offer = self.get(id).await?;
        let from = offer.status;
        let to = change.next_status;

        if !from.can_transition_to(to) {
            tracing::warn!(job_offer_id = id, %from, %to, "illegal job offer transition rejected");
            return Err(Error::IllegalTransition {
                from,
                to,
                allowed: from.next_statuses().to_vec(),
            });
        }

        let at = now();
        let mut commit = JobOfferCommit::new(&offer, to);
        commit.note = change.note;
        let mut _professional_guard = None;

        match to {
            JobStatus::SelectionPhase | JobStatus::CandidateProposal => {
                for professional_id in candidate_ids(&change.candidate_professional_ids)? {
                    let professional = self.professionals.get(professional_id).await?;
                    if to == JobStatus::SelectionPhase && !professional.is_available() {
                        return Err(Error::NotAvailable {
                            professional_id,
                            state: professional.employment_state,
                        });
                    }
                    if offer.candidate(professional_id).is_none() {
                        commit.new_candidates.push(CandidateSnapshot {
                            professional_id,
                            employment_state: professional.employment_state,
                            added_at: at,
                        });
                    }
                }
            }
            JobStatus::Consolidated => {
                let professional_id = single_professional_id(&change.candidate_professional_ids)?;
                let snapshot = offer.candidate(professional_id).ok_or(
                    Error::ProfessionalNotCandidate {
                        job_offer_id: id,
                        professional_id,
                    },
                )?;
                _professional_guard = Some(self.professionals.lock(professional_id).await);
                let (professional, reservation) = self
                    .professionals
                    .prepare_reservation(professional_id, snapshot.employment_state)
                    .await?;
                let value = contract_value(professional.daily_rate, offer.duration).ok_or_else(
                    || {
                        Error::BadRequest(format!(
                            "contract value of {} days at {} per day is out of range",
                            offer.duration, professional.daily_rate
                        ))
                    },
                )?;
                commit.professional_id = Some(professional_id);
                commit.value = Some(value);
                commit.reservation = Some(reservation);
            }
            JobStatus::Done | JobStatus::Abort => {
                if let Some(professional_id) = offer.professional_id {
                    _professional_guard = Some(self.professionals.lock(professional_id).await);
                    commit.release = Some(professional_id);
                }
                commit.end_time = Some(at);
            }
            // No edge leads back to CREATED.
            JobStatus::Created => {}
        }

        let updated = self.store.commit_job_offer(commit).await?;
        tracing::info!(
            job_offer_id = id,
            %from,
            to = %updated.status,
            professional_id = updated.professional_id,
            value = %updated.value,
            "job offer status changed"
        );
        self.notifications
            .emit(LifecycleEvent::job_offer_transition(from, &updated, at));
        Ok(updated)
    }
}

fn candidate_ids(ids: &[i64]) -> Result<BTreeSet<i64>> {
    if ids.is_empty() {
        return Err(Error::RequiredProfessionalId(
            "at least one candidate professional id is required".into(),
        ));
    }
    if let Some(bad) = ids.iter().find(|id| **id < 0) {
        return Err(Error::RequiredProfessionalId(format!(
            "professional id {} is negative",
            bad
        )));
    }
    Ok(ids.iter().copied().collect())
}

fn single_professional_id(ids: &[i64]) -> Result<i64> {
    let distinct = candidate_ids(ids)?;
    let mut iter = distinct.into_iter();
    match (iter.next(), iter.next()) {
        (Some(id), None) => Ok(id),
        _ => Err(Error::RequiredProfessionalId(
            "consolidation needs exactly one professional id".into(),
        )),
    }
}
