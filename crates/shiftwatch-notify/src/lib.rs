//! Push notification fan-out for shiftwatch.
//!
//! This crate provides:
//! - [`Notification`], the payload every subscriber receives
//! - [`SubscriptionRegistry`], the persisted subscriber list
//! - [`FanOut`], best-effort delivery that drops subscribers the push service reports gone
//! - [`HttpPushTransport`], encrypted and VAPID-signed Web Push delivery

mod error;
mod fanout;
mod payload;
mod subscription;
mod transport;

pub use error::NotifyError;
pub use fanout::{DeliveryReport, FanOut, Notifier};
pub use payload::Notification;
pub use subscription::{
    DEFAULT_SUBSCRIPTIONS_KEY, Registration, Subscription, SubscriptionKeys, SubscriptionRegistry,
};
pub use transport::{HttpPushTransport, PushTransport, VapidKey};
