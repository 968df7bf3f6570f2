//! NATS publisher for verdict replies and events

use crate::service::ServiceReply;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Sends replies to requesters and publishes verdict events
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    subject: String,
}

impl VerdictProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Answer a request on its reply subject
    pub async fn respond(&self, reply_to: Subject, reply: &ServiceReply) -> Result<()> {
        let body = reply.to_body()?;
        self.client.publish(reply_to, body.into()).await?;
        Ok(())
    }

    /// Publish the verdict event of a scored request
    pub async fn publish_event(&self, reply: &ServiceReply) -> Result<()> {
        let Some(event) = reply.event() else {
            return Ok(());
        };
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            event_id = %event.event_id,
            transaction_id = ?event.transaction_id,
            prediction = ?event.prediction,
            "Published verdict event"
        );
        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
