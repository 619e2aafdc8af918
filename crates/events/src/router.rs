//! Fans bus events out to webhook and email sinks.
//!
//! [`DeliveryRouter`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for each event:
//!
//! - posts it to every webhook subscribed to the event name when the event
//!   asks for the `webhook` channel (or to the single webhook it targets),
//! - emails the configured recipients when it asks for the `email` channel.
//!
//! Each event is handled on its own task so a slow webhook with retries
//! does not hold up later events.

use std::sync::Arc;

use sfmcp_core::channels::{CHANNEL_EMAIL, CHANNEL_WEBHOOK};
use sfmcp_store::WebhookRepo;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::MonitoringEvent;
use crate::delivery::email::EmailDelivery;
use crate::delivery::webhook::WebhookDelivery;

/// Outcome counts for one routed event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub webhooks_ok: usize,
    pub webhooks_failed: usize,
    pub emails_sent: usize,
}

#[derive(Clone)]
pub struct DeliveryRouter {
    webhooks: Arc<WebhookRepo>,
    webhook_delivery: Arc<WebhookDelivery>,
    email: Arc<EmailDelivery>,
}

impl DeliveryRouter {
    pub fn new(
        webhooks: Arc<WebhookRepo>,
        webhook_delivery: Arc<WebhookDelivery>,
        email: Arc<EmailDelivery>,
    ) -> Self {
        Self {
            webhooks,
            webhook_delivery,
            email,
        }
    }

    /// Run the routing loop until cancelled or the bus is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<MonitoringEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Delivery router cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        let router = self.clone();
                        tokio::spawn(async move {
                            router.route(&event).await;
                        });
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Delivery router lagged, some events were not delivered");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, delivery router shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Deliver one event to every sink it asks for.
    pub async fn route(&self, event: &MonitoringEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let targets = match &event.webhook_id {
            Some(id) => self.webhooks.find_by_id(id).await.into_iter().collect(),
            None if event.wants(CHANNEL_WEBHOOK) => {
                self.webhooks.subscribed_to(&event.event_type).await
            }
            None => Vec::new(),
        };
        for webhook in &targets {
            match self.webhook_delivery.deliver(webhook, event).await {
                Ok(()) => report.webhooks_ok += 1,
                Err(_) => report.webhooks_failed += 1,
            }
        }

        if event.wants(CHANNEL_EMAIL) {
            report.emails_sent = self.email.deliver_all(event).await;
        }

        tracing::debug!(
            event_type = %event.event_type,
            profile_id = ?event.profile_id,
            webhooks_ok = report.webhooks_ok,
            webhooks_failed = report.webhooks_failed,
            emails_sent = report.emails_sent,
            "Event routed"
        );
        report
    }
}
