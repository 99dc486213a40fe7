//! Best-effort delivery to every registered subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{Notification, NotifyError, PushTransport, SubscriptionRegistry};

/// Something that can deliver a [`Notification`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError>;
}

/// What happened during one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Subscriptions removed because the push service reported them gone.
    pub dropped: usize,
    /// Failed deliveries whose subscriptions were kept.
    pub failed: usize,
}

/// Sends a notification to every subscriber in a [`SubscriptionRegistry`].
///
/// A subscriber the push service reports gone is removed from the registry.
/// Any other failure is logged and the subscription kept. The remaining
/// subscribers still receive the notification.
pub struct FanOut {
    registry: SubscriptionRegistry,
    transport: Arc<dyn PushTransport>,
}

impl FanOut {
    pub fn new(registry: SubscriptionRegistry, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }
}

#[async_trait]
impl Notifier for FanOut {
    async fn notify(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError> {
        let Some(subscriptions) = self.registry.load().await? else {
            info!("no subscriptions");
            return Ok(DeliveryReport::default());
        };

        let payload = notification.to_bytes()?;
        let mut report = DeliveryReport::default();
        let mut kept = Vec::with_capacity(subscriptions.len());

        for subscription in subscriptions {
            match self.transport.push(&subscription, &payload).await {
                Ok(()) => {
                    info!(endpoint = %subscription.short_id(), "push delivered");
                    report.delivered += 1;
                    kept.push(subscription);
                }
                Err(e) if e.is_gone() => {
                    warn!(
                        endpoint = %subscription.short_id(),
                        error = %e,
                        "subscription gone; removed"
                    );
                    report.dropped += 1;
                }
                Err(e) => {
                    warn!(
                        endpoint = %subscription.short_id(),
                        error = %e,
                        "push failed"
                    );
                    report.failed += 1;
                    kept.push(subscription);
                }
            }
        }

        if report.dropped > 0 {
            self.registry.save(&kept).await?;
        }

        Ok(report)
    }
}
