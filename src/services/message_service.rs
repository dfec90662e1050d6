use std::sync::Arc;

use crate::error::{Entity, Error, Result};
use crate::models::event::LifecycleEvent;
use crate::models::message::{CreateMessage, HistoryEntry, Message, UpdateMessage};
use crate::services::notification_service::NotificationService;
use crate::store::{LifecycleStore, MessageCommit, NewHistoryEntry};
use crate::utils::keyed_lock::KeyedLocks;
use crate::utils::time::{now, now_not_before};

/// Message state plus its append-only history log.
#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn LifecycleStore>,
    notifications: NotificationService,
    locks: KeyedLocks,
}

impl MessageService {
    pub fn new(store: Arc<dyn LifecycleStore>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn create(&self, msg: CreateMessage) -> Result<Message> {
        let at = now();
        let message = self.store.insert_message(msg, at).await?;
        tracing::info!(message_id = message.id, channel = %message.channel, "message received");
        self.notifications
            .emit(LifecycleEvent::message_transition(None, &message, None, at));
        Ok(message)
    }

    pub async fn get(&self, id: i64) -> Result<Message> {
        self.store.find_message(id).await?.ok_or(Error::NotFound {
            entity: Entity::Message,
            id,
        })
    }

    pub async fn update(&self, id: i64, update: UpdateMessage) -> Result<Message> {
        let _guard = self.locks.lock(id).await;
        let message = self.get(id).await?;
        if update.state.is_none() && update.priority.is_none() {
            return Err(Error::NoOpUpdate);
        }

        let at = now_not_before(message.updated_at);
        let transition = update
            .state
            .filter(|state| *state != message.actual_state)
            .map(|state| NewHistoryEntry {
                state,
                date: at,
                comment: update.comment.clone(),
            });

        if transition.is_none() && update.priority.is_none() {
            // Same state resubmitted: nothing to record.
            return Ok(message);
        }

        let old_state = message.actual_state;
        let state_changed = transition.is_some();
        let updated = self
            .store
            .commit_message(MessageCommit {
                message_id: id,
                expected_version: message.version,
                transition,
                priority: update.priority,
                updated_at: at,
            })
            .await?;

        if state_changed {
            tracing::info!(message_id = id, from = %old_state, to = %updated.actual_state, "message state changed");
            self.notifications.emit(LifecycleEvent::message_transition(
                Some(old_state),
                &updated,
                update.comment.as_deref(),
                at,
            ));
        } else {
            tracing::debug!(message_id = id, priority = %updated.priority, "message priority changed");
        }
        Ok(updated)
    }

    pub async fn history(&self, id: i64) -> Result<Vec<HistoryEntry>> {
        self.get(id).await?;
        self.store.history(id).await
    }
}
