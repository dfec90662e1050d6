use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::models::event::LifecycleEvent;
use crate::utils::signature::sign_payload;

/// Fire-and-forget emitter for lifecycle transition events.
#[derive(Clone)]
pub struct NotificationService {
    sender: mpsc::UnboundedSender<LifecycleEvent>,
}

impl NotificationService {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Never blocks and never fails the caller.
    pub fn emit(&self, event: LifecycleEvent) {
        let event_id = event.event_id;
        if let Err(err) = self.sender.send(event) {
            tracing::warn!(%event_id, entity_id = err.0.entity_id, "notification channel closed, event dropped");
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventDelivery: Send + Sync {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<()>;
}

/// Posts events as JSON to the analytics endpoint.
pub struct WebhookDelivery {
    client: Client,
    target_url: String,
    signing_secret: Option<String>,
}

impl WebhookDelivery {
    pub fn new(client: Client, target_url: String, signing_secret: Option<String>) -> Self {
        Self {
            client,
            target_url,
            signing_secret,
        }
    }
}

#[async_trait]
impl EventDelivery for WebhookDelivery {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<()> {
        let body = serde_json::to_vec(event)?;
        let timestamp = event.timestamp.timestamp();

        let mut request = self
            .client
            .post(&self.target_url)
            .header("content-type", "application/json")
            .header("x-event-type", event.event_type())
            .header("x-event-timestamp", timestamp.to_string());
        if let Some(secret) = &self.signing_secret {
            request = request.header("x-signature", sign_payload(secret, timestamp, &body)?);
        }

        let resp = request.body(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::Internal(format!(
                "analytics endpoint answered {}: {}",
                status, text
            )))
        }
    }
}

/// Used when no analytics endpoint is configured.
pub struct LogDelivery;

#[async_trait]
impl EventDelivery for LogDelivery {
    async fn deliver(&self, event: &LifecycleEvent) -> Result<()> {
        tracing::info!(
            event_type = event.event_type(),
            entity_id = event.entity_id,
            old_state = event.old_state.as_deref().unwrap_or("-"),
            new_state = %event.new_state,
            "lifecycle event"
        );
        Ok(())
    }
}

/// Drains the notification channel and delivers with bounded retries.
pub struct NotificationWorker {
    receiver: mpsc::UnboundedReceiver<LifecycleEvent>,
    delivery: Arc<dyn EventDelivery>,
    max_attempts: u32,
    base_backoff: Duration,
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<LifecycleEvent>,
        delivery: Arc<dyn EventDelivery>,
        max_attempts: u32,
    ) -> Self {
        Self {
            receiver,
            delivery,
            max_attempts: max_attempts.max(1),
            base_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Handles one event. Returns `false` once every sender is gone.
    pub async fn run_once(&mut self) -> bool {
        let Some(event) = self.receiver.recv().await else {
            return false;
        };
        self.deliver_with_retry(&event).await;
        true
    }

    pub async fn run(mut self) {
        while self.run_once().await {}
        tracing::info!("notification worker stopped");
    }

    async fn deliver_with_retry(&self, event: &LifecycleEvent) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.delivery.deliver(event).await {
                Ok(()) => return true,
                Err(err) if attempt < self.max_attempts => {
                    let backoff = self.base_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        event_id = %event.event_id,
                        attempt,
                        error = %err,
                        "event delivery failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    tracing::error!(
                        event_id = %event.event_id,
                        attempts = self.max_attempts,
                        error = %err,
                        "event delivery failed, giving up"
                    );
                }
            }
        }
        false
    }
}
