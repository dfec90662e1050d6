use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::message::{CreateMessage, HistoryEntry, MessagePriority};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessagePayload {
    #[validate(length(min = 1))]
    pub sender: String,
    #[validate(length(min = 1))]
    pub channel: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub priority: MessagePriority,
}

impl From<CreateMessagePayload> for CreateMessage {
    fn from(p: CreateMessagePayload) -> Self {
        Self {
            sender: p.sender,
            channel: p.channel,
            subject: p.subject,
            body: p.body,
            priority: p.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub message_id: i64,
    pub items: Vec<HistoryEntry>,
}
