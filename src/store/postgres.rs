use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use super::{JobOfferCommit, LifecycleStore, MessageCommit};
use crate::error::{Entity, Error, Result};
use crate::models::customer::{Customer, NewCustomer};
use crate::models::job_offer::{CandidateSnapshot, JobOffer, NewJobOffer};
use crate::models::message::{CreateMessage, HistoryEntry, Message, MessageState};
use crate::models::professional::{EmploymentState, NewProfessional, Professional};

const CONSOLIDATED_PROFESSIONAL_INDEX: &str = "job_offers_one_consolidated_per_professional";

const PROFESSIONAL_COLUMNS: &str = "id, name, skills, geographical_location, daily_rate, employment_state, version, created_at, updated_at";
const JOB_OFFER_COLUMNS: &str = "id, customer_id, status, required_skills, duration, value, note, professional_id, creation_time, end_time, version";
const MESSAGE_COLUMNS: &str = "id, sender, channel, subject, body, priority, actual_state, date, updated_at, version";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e| Error::Internal(format!("column {}: {}", column, e)))
}

fn customer_from_row(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}

fn professional_from_row(row: &PgRow) -> Result<Professional> {
    Ok(Professional {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        skills: row.try_get("skills")?,
        geographical_location: row.try_get("geographical_location")?,
        daily_rate: row.try_get("daily_rate")?,
        employment_state: parse_column(row, "employment_state")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        sender: row.try_get("sender")?,
        channel: row.try_get("channel")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        priority: parse_column(row, "priority")?,
        actual_state: parse_column(row, "actual_state")?,
        date: row.try_get("date")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn history_from_row(row: &PgRow) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        message_id: row.try_get("message_id")?,
        state: parse_column(row, "state")?,
        date: row.try_get("date")?,
        comment: row.try_get("comment")?,
    })
}

async fn load_job_offer(conn: &mut PgConnection, id: i64) -> Result<Option<JobOffer>> {
    let sql = format!(
        "SELECT {} FROM job_offers WHERE id = $1 AND deleted = FALSE",
        JOB_OFFER_COLUMNS
    );
    let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };

    let candidate_rows = sqlx::query(
        r#"SELECT professional_id, employment_state_snapshot, added_at
           FROM job_offer_candidates
           WHERE job_offer_id = $1
           ORDER BY added_at ASC, professional_id ASC"#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    let candidates = candidate_rows
        .iter()
        .map(|c| -> Result<CandidateSnapshot> {
            Ok(CandidateSnapshot {
                professional_id: c.try_get("professional_id")?,
                employment_state: parse_column(c, "employment_state_snapshot")?,
                added_at: c.try_get("added_at")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(JobOffer {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        status: parse_column(&row, "status")?,
        required_skills: row.try_get("required_skills")?,
        duration: row.try_get("duration")?,
        value: row.try_get("value")?,
        note: row.try_get("note")?,
        candidates,
        professional_id: row.try_get("professional_id")?,
        creation_time: row.try_get("creation_time")?,
        end_time: row.try_get("end_time")?,
        version: row.try_get("version")?,
    }))
}

fn is_double_booking(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .map(|constraint| constraint == CONSOLIDATED_PROFESSIONAL_INDEX)
        .unwrap_or(false)
}

#[async_trait]
impl LifecycleStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query(
            r#"INSERT INTO customers (name, note) VALUES ($1, $2)
               RETURNING id, name, note, created_at"#,
        )
        .bind(&customer.name)
        .bind(&customer.note)
        .fetch_one(&self.pool)
        .await?;
        customer_from_row(&row)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, note, created_at FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    async fn insert_professional(&self, professional: NewProfessional) -> Result<Professional> {
        let sql = format!(
            r#"INSERT INTO professionals (name, skills, geographical_location, daily_rate, employment_state)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            PROFESSIONAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&professional.name)
            .bind(&professional.skills)
            .bind(&professional.geographical_location)
            .bind(professional.daily_rate)
            .bind(EmploymentState::AvailableForWork.as_str())
            .fetch_one(&self.pool)
            .await?;
        professional_from_row(&row)
    }

    async fn find_professional(&self, id: i64) -> Result<Option<Professional>> {
        let sql = format!("SELECT {} FROM professionals WHERE id = $1", PROFESSIONAL_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(professional_from_row).transpose()
    }

    async fn swap_employment_state(
        &self,
        id: i64,
        expected_version: i64,
        state: EmploymentState,
    ) -> Result<Option<Professional>> {
        let sql = format!(
            r#"UPDATE professionals
               SET employment_state = $3,
                   version = CASE WHEN employment_state = $3 THEN version ELSE version + 1 END,
                   updated_at = NOW()
               WHERE id = $1 AND version = $2
               RETURNING {}"#,
            PROFESSIONAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(state.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(professional_from_row).transpose()
    }

    async fn insert_job_offer(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let mut tx = self.pool.begin().await?;
        let customer = sqlx::query("SELECT id FROM customers WHERE id = $1 FOR SHARE")
            .bind(offer.customer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if customer.is_none() {
            return Err(Error::NotFound {
                entity: Entity::Customer,
                id: offer.customer_id,
            });
        }

        let row = sqlx::query(
            r#"INSERT INTO job_offers (customer_id, required_skills, duration, note)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(offer.customer_id)
        .bind(&offer.required_skills)
        .bind(offer.duration)
        .bind(&offer.note)
        .fetch_one(&mut *tx)
        .await?;
        let id: i64 = row.try_get("id")?;
        let created = load_job_offer(&mut tx, id)
            .await?
            .ok_or_else(|| Error::Internal("inserted job offer not readable".into()))?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_job_offer(&self, id: i64) -> Result<Option<JobOffer>> {
        let mut conn = self.pool.acquire().await?;
        load_job_offer(&mut conn, id).await
    }

    async fn commit_job_offer(&self, commit: JobOfferCommit) -> Result<JobOffer> {
        let id = commit.job_offer_id;
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query("SELECT version FROM job_offers WHERE id = $1 AND deleted = FALSE FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Err(Error::NotFound {
                entity: Entity::JobOffer,
                id,
            });
        };
        let version: i64 = current.try_get("version")?;
        if version != commit.expected_version {
            return Err(Error::StaleJobOffer { job_offer_id: id });
        }

        if let Some(reservation) = commit.reservation {
            let reserved = sqlx::query(
                r#"UPDATE professionals
                   SET employment_state = $3, version = version + 1, updated_at = NOW()
                   WHERE id = $1 AND version = $2 AND employment_state = $4"#,
            )
            .bind(reservation.professional_id)
            .bind(reservation.expected_version)
            .bind(EmploymentState::Employed.as_str())
            .bind(EmploymentState::AvailableForWork.as_str())
            .execute(&mut *tx)
            .await?;
            if reserved.rows_affected() == 0 {
                return Err(Error::InconsistentProfessionalStatus {
                    professional_id: reservation.professional_id,
                });
            }
        }

        if let Some(released) = commit.release {
            sqlx::query(
                r#"UPDATE professionals
                   SET employment_state = $2, version = version + 1, updated_at = NOW()
                   WHERE id = $1 AND employment_state <> $2"#,
            )
            .bind(released)
            .bind(EmploymentState::AvailableForWork.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for candidate in &commit.new_candidates {
            sqlx::query(
                r#"INSERT INTO job_offer_candidates (job_offer_id, professional_id, employment_state_snapshot, added_at)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (job_offer_id, professional_id) DO NOTHING"#,
            )
            .bind(id)
            .bind(candidate.professional_id)
            .bind(candidate.employment_state.as_str())
            .bind(candidate.added_at)
            .execute(&mut *tx)
            .await?;
        }

        let updated = sqlx::query(
            r#"UPDATE job_offers
               SET status = $2,
                   note = COALESCE($3, note),
                   professional_id = COALESCE($4, professional_id),
                   value = COALESCE($5, value),
                   end_time = COALESCE($6, end_time),
                   version = version + 1
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(commit.status.as_str())
        .bind(&commit.note)
        .bind(commit.professional_id)
        .bind(commit.value)
        .bind(commit.end_time)
        .execute(&mut *tx)
        .await;
        match updated {
            Ok(_) => {}
            Err(err) if is_double_booking(&err) => {
                return Err(Error::InconsistentProfessionalStatus {
                    professional_id: commit.professional_id.unwrap_or_default(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let offer = load_job_offer(&mut tx, id)
            .await?
            .ok_or_else(|| Error::Internal("committed job offer not readable".into()))?;
        tx.commit().await?;
        Ok(offer)
    }

    async fn delete_job_offer(&self, id: i64, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE job_offers SET deleted = TRUE, version = version + 1
               WHERE id = $1 AND version = $2 AND deleted = FALSE"#,
        )
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_message(&self, message: CreateMessage, at: DateTime<Utc>) -> Result<Message> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"INSERT INTO messages (sender, channel, subject, body, priority, actual_state, date, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
               RETURNING {}"#,
            MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&message.sender)
            .bind(&message.channel)
            .bind(&message.subject)
            .bind(&message.body)
            .bind(message.priority.as_str())
            .bind(MessageState::Received.as_str())
            .bind(at)
            .fetch_one(&mut *tx)
            .await?;
        let created = message_from_row(&row)?;

        sqlx::query(
            r#"INSERT INTO message_history (message_id, state, date, comment)
               VALUES ($1, $2, $3, NULL)"#,
        )
        .bind(created.id)
        .bind(MessageState::Received.as_str())
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_message(&self, id: i64) -> Result<Option<Message>> {
        let sql = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(message_from_row).transpose()
    }

    async fn commit_message(&self, commit: MessageCommit) -> Result<Message> {
        let id = commit.message_id;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"UPDATE messages
               SET actual_state = COALESCE($3, actual_state),
                   priority = COALESCE($4, priority),
                   updated_at = $5,
                   version = version + 1
               WHERE id = $1 AND version = $2
               RETURNING {}"#,
            MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(commit.expected_version)
            .bind(commit.transition.as_ref().map(|t| t.state.as_str()))
            .bind(commit.priority.map(|p| p.as_str()))
            .bind(commit.updated_at)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            let exists = sqlx::query("SELECT 1 FROM messages WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => Error::StaleMessage { message_id: id },
                None => Error::NotFound {
                    entity: Entity::Message,
                    id,
                },
            });
        };
        let updated = message_from_row(&row)?;

        if let Some(entry) = &commit.transition {
            sqlx::query(
                r#"INSERT INTO message_history (message_id, state, date, comment)
                   VALUES ($1, $2, $3, $4)"#,
            )
            .bind(id)
            .bind(entry.state.as_str())
            .bind(entry.date)
            .bind(&entry.comment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn history(&self, message_id: i64) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"SELECT id, message_id, state, date, comment
               FROM message_history
               WHERE message_id = $1
               ORDER BY id ASC"#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(history_from_row).collect()
    }
}
