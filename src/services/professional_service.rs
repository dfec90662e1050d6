use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::error::{Entity, Error, Result};
use crate::models::professional::{
    max_daily_rate, EmploymentState, NewProfessional, Professional, DAILY_RATE_SCALE,
};
use crate::store::{LifecycleStore, Reservation};
use crate::utils::keyed_lock::KeyedLocks;

/// Source of truth for professional availability.
///
/// Employment state changes only through `reserve` / `release` here or through
/// a job offer commit carrying a [`Reservation`] prepared by this registry.
#[derive(Clone)]
pub struct ProfessionalService {
    store: Arc<dyn LifecycleStore>,
    locks: KeyedLocks,
}

impl ProfessionalService {
    pub fn new(store: Arc<dyn LifecycleStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn create(&self, professional: NewProfessional) -> Result<Professional> {
        let rate = professional.daily_rate;
        if rate.is_sign_negative() {
            return Err(Error::BadRequest("dailyRate must not be negative".into()));
        }
        if rate > max_daily_rate() {
            return Err(Error::BadRequest(format!(
                "dailyRate must not exceed {}",
                max_daily_rate()
            )));
        }
        if rate.normalize().scale() > DAILY_RATE_SCALE {
            return Err(Error::BadRequest(format!(
                "dailyRate must have at most {} decimal places",
                DAILY_RATE_SCALE
            )));
        }
        let created = self.store.insert_professional(professional).await?;
        tracing::info!(professional_id = created.id, "professional registered");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Professional> {
        self.store
            .find_professional(id)
            .await?
            .ok_or(Error::NotFound {
                entity: Entity::Professional,
                id,
            })
    }

    /// Serializes every employment state change of one professional.
    pub async fn lock(&self, id: i64) -> OwnedMutexGuard<()> {
        self.locks.lock(id).await
    }

    /// Marks the professional EMPLOYED; returns the snapshot taken at reservation time.
    pub async fn reserve(&self, id: i64) -> Result<Professional> {
        let _guard = self.lock(id).await;
        let professional = self.get(id).await?;
        if !professional.is_available() {
            return Err(Error::NotAvailable {
                professional_id: id,
                state: professional.employment_state,
            });
        }
        let reserved = self
            .store
            .swap_employment_state(id, professional.version, EmploymentState::Employed)
            .await?
            .ok_or(Error::InconsistentProfessionalStatus { professional_id: id })?;
        tracing::info!(professional_id = id, "professional reserved");
        Ok(reserved)
    }

    /// Puts the professional back to AVAILABLE_FOR_WORK. Idempotent.
    pub async fn release(&self, id: i64) -> Result<Professional> {
        let _guard = self.lock(id).await;
        let professional = self.get(id).await?;
        if professional.is_available() {
            return Ok(professional);
        }
        let released = self
            .store
            .swap_employment_state(id, professional.version, EmploymentState::AvailableForWork)
            .await?
            .ok_or(Error::InconsistentProfessionalStatus { professional_id: id })?;
        tracing::info!(professional_id = id, from = %professional.employment_state, "professional released");
        Ok(released)
    }

    /// False when the current state no longer equals the caller's snapshot.
    pub async fn check_still_available(&self, id: i64, expected: EmploymentState) -> Result<bool> {
        Ok(self.get(id).await?.employment_state == expected)
    }

    /// Validates a reservation for a job offer commit without mutating anything.
    ///
    /// The returned [`Reservation`] pins the professional version read here;
    /// the commit fails if it moved in between.
    pub async fn prepare_reservation(
        &self,
        id: i64,
        snapshot: EmploymentState,
    ) -> Result<(Professional, Reservation)> {
        if !self.check_still_available(id, snapshot).await? {
            tracing::warn!(
                professional_id = id,
                expected = %snapshot,
                "professional changed since it became a candidate"
            );
            return Err(Error::InconsistentProfessionalStatus { professional_id: id });
        }
        let professional = self.get(id).await?;
        if !professional.is_available() {
            return Err(Error::NotAvailable {
                professional_id: id,
                state: professional.employment_state,
            });
        }
        let reservation = Reservation {
            professional_id: id,
            expected_version: professional.version,
        };
        Ok((professional, reservation))
    }
}
