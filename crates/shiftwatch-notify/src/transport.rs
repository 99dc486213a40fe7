//! Delivery of a payload to a single subscriber.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder,
};

use crate::{NotifyError, Subscription};

/// Delivers one payload to one subscription endpoint.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, subscription: &Subscription, payload: &[u8]) -> Result<(), NotifyError>;
}

/// Application server identity used to sign push requests.
#[derive(Clone)]
pub struct VapidKey {
    private_key_pem: Vec<u8>,
    subject: String,
}

impl VapidKey {
    /// `private_key_pem` is a P-256 key in PEM form (PKCS#8 or SEC1).
    /// `subject` is the contact for the push service, usually a `mailto:` URL.
    pub fn new(private_key_pem: impl Into<Vec<u8>>, subject: impl Into<String>) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),
            subject: subject.into(),
        }
    }
}

/// Web Push delivery: the payload is encrypted for the subscriber
/// (`aes128gcm`) and the request carries a VAPID signature.
pub struct HttpPushTransport {
    http: Client,
    vapid: VapidKey,
    ttl_secs: u32,
}

impl HttpPushTransport {
    pub fn new(vapid: VapidKey) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            vapid,
            ttl_secs: 86_400,
        })
    }

    /// Seconds the push service should hold an undelivered message.
    pub fn with_ttl(mut self, ttl_secs: u32) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn push(&self, subscription: &Subscription, payload: &[u8]) -> Result<(), NotifyError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_pem(self.vapid.private_key_pem.as_slice(), &info)?;
        signature.add_claim("sub", self.vapid.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(self.ttl_secs);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature.build()?);
        let message = builder.build()?;

        let encrypted = message.payload.ok_or_else(|| {
            NotifyError::InvalidSubscription("push message has no payload".to_string())
        })?;

        let mut request = self
            .http
            .post(&subscription.endpoint)
            .header("ttl", message.ttl.to_string())
            .header("content-encoding", "aes128gcm")
            .header("content-type", "application/octet-stream");
        for (name, value) in &encrypted.crypto_headers {
            request = request.header(name.to_string(), value.to_string());
        }

        debug!(
            endpoint = %subscription.short_id(),
            bytes = encrypted.content.len(),
            "sending push"
        );
        let response = request.body(encrypted.content).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
