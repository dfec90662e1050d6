use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    Received,
    Read,
    Processing,
    Done,
    Failed,
    Discarded,
}

impl MessageState {
    pub const ALL: [MessageState; 6] = [
        MessageState::Received,
        MessageState::Read,
        MessageState::Processing,
        MessageState::Done,
        MessageState::Failed,
        MessageState::Discarded,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MessageState::Received => "RECEIVED",
            MessageState::Read => "READ",
            MessageState::Processing => "PROCESSING",
            MessageState::Done => "DONE",
            MessageState::Failed => "FAILED",
            MessageState::Discarded => "DISCARDED",
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown message state '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl MessagePriority {
    pub const ALL: [MessagePriority; 3] = [
        MessagePriority::Low,
        MessagePriority::Medium,
        MessagePriority::High,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            MessagePriority::Low => "LOW",
            MessagePriority::Medium => "MEDIUM",
            MessagePriority::High => "HIGH",
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessagePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessagePriority::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown message priority '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub channel: String,
    pub subject: String,
    pub body: String,
    pub priority: MessagePriority,
    pub actual_state: MessageState,
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Append-only audit record of one message state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub message_id: i64,
    pub state: MessageState,
    pub date: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Tuple delivered by the ingestion collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub sender: String,
    pub channel: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub priority: MessagePriority,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    pub state: Option<MessageState>,
    pub comment: Option<String>,
    pub priority: Option<MessagePriority>,
}
