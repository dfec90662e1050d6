use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use super::job_offer::{JobOffer, JobStatus};
use super::message::{Message, MessageState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    JobOffer,
    Message,
}

/// Analytics event emitted after every committed lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub event_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub old_state: Option<String>,
    pub new_state: String,
    pub timestamp: DateTime<Utc>,
    pub extra: JsonValue,
}

impl LifecycleEvent {
    pub fn job_offer_transition(old_status: JobStatus, offer: &JobOffer, at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            entity_type: EntityType::JobOffer,
            entity_id: offer.id,
            old_state: Some(old_status.as_str().to_string()),
            new_state: offer.status.as_str().to_string(),
            timestamp: at,
            extra: json!({
                "creationTime": offer.creation_time,
                "endTime": offer.end_time,
                "value": offer.value,
                "professionalId": offer.professional_id,
            }),
        }
    }

    pub fn message_transition(
        old_state: Option<MessageState>,
        message: &Message,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            entity_type: EntityType::Message,
            entity_id: message.id,
            old_state: old_state.map(|s| s.as_str().to_string()),
            new_state: message.actual_state.as_str().to_string(),
            timestamp: at,
            extra: json!({
                "comment": comment,
                "priority": message.priority,
            }),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.entity_type {
            EntityType::JobOffer => "job_offer_status_changed",
            EntityType::Message => "message_state_changed",
        }
    }
}
