//! Persisted push subscriptions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shiftwatch_storage::ObjectStore;
use tracing::info;

use crate::NotifyError;

/// Default object key of the subscriber list.
pub const DEFAULT_SUBSCRIPTIONS_KEY: &str = "subscriptions.json";

/// A push subscription as produced by a browser's push manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    #[serde(
        rename = "expirationTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_time: Option<serde_json::Value>,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl Subscription {
    /// Parse a subscription document, requiring `endpoint` and `keys`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, NotifyError> {
        for field in ["endpoint", "keys"] {
            if value.get(field).is_none() {
                return Err(NotifyError::InvalidSubscription(format!(
                    "missing field `{}`",
                    field
                )));
            }
        }
        serde_json::from_value(value).map_err(|e| NotifyError::InvalidSubscription(e.to_string()))
    }

    /// Last five characters of the endpoint, for log lines.
    pub fn short_id(&self) -> &str {
        let start = self
            .endpoint
            .char_indices()
            .rev()
            .nth(4)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.endpoint[start..]
    }
}

/// Outcome of registering a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyExists,
}

/// The subscriber list, stored as a JSON array in an object store.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn ObjectStore>,
    key: String,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the subscriber list, or `None` if it has never been written.
    pub async fn load(&self) -> Result<Option<Vec<Subscription>>, NotifyError> {
        match self.store.get(&self.key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the subscriber list.
    pub async fn save(&self, subscriptions: &[Subscription]) -> Result<(), NotifyError> {
        let bytes = serde_json::to_vec(subscriptions)?;
        self.store.put(&self.key, &bytes).await?;
        Ok(())
    }

    /// Append a subscription unless an identical one is already registered.
    pub async fn register(&self, subscription: Subscription) -> Result<Registration, NotifyError> {
        let mut subscriptions = self.load().await?.unwrap_or_default();

        if subscriptions.contains(&subscription) {
            info!(endpoint = %subscription.short_id(), "subscription already exists");
            return Ok(Registration::AlreadyExists);
        }

        info!(endpoint = %subscription.short_id(), "creating new subscription");
        subscriptions.push(subscription);
        self.save(&subscriptions).await?;
        Ok(Registration::Created)
    }
}
