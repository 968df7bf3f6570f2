//! NATS subscriber for incoming scoring requests

use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Receives transaction payloads to score.
///
/// Requesters use NATS request/reply; the reply subject on each message is
/// where the verdict goes back.
pub struct TransactionConsumer {
    client: Client,
    subject: String,
    queue_group: Option<String>,
}

impl TransactionConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            queue_group: None,
        }
    }

    /// Share the subject with other service instances
    pub fn with_queue_group(mut self, group: &str) -> Self {
        self.queue_group = Some(group.to_string());
        self
    }

    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = match &self.queue_group {
            Some(group) => self
                .client
                .queue_subscribe(self.subject.clone(), group.clone())
                .await
                .with_context(|| format!("Failed to join queue group {group}"))?,
            None => self
                .client
                .subscribe(self.subject.clone())
                .await
                .context("Failed to subscribe")?,
        };
        info!(subject = %self.subject, queue_group = ?self.queue_group, "Subscribed to transaction subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
