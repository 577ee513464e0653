//! Web Push delivery.

use std::path::Path;

use async_trait::async_trait;
use prodsuite_core::push::PushSubscription;
use prodsuite_core::{Storage, SuiteConfig, SuiteResult};
use serde_json::Value;
use thiserror::Error;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

#[derive(Error, Debug)]
pub enum PushError {
    /// The push service no longer knows the endpoint.
    #[error("subscription endpoint is gone")]
    Gone,

    #[error("push delivery failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &Value) -> Result<(), PushError>;
}

impl From<WebPushError> for PushError {
    fn from(err: WebPushError) -> Self {
        match err.short_description() {
            "endpoint_not_valid" | "endpoint_not_found" => PushError::Gone,
            _ => PushError::Failed(err.to_string()),
        }
    }
}

/// Sends notifications signed with the server's VAPID key.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    private_key_pem: Vec<u8>,
    subject: String,
}

impl WebPushSender {
    pub fn new(private_key_file: &Path, subject: &str) -> anyhow::Result<Self> {
        let private_key_pem = std::fs::read(private_key_file).map_err(|e| {
            anyhow::anyhow!(
                "Could not read VAPID private key {}: {e}",
                private_key_file.display()
            )
        })?;

        Ok(WebPushSender {
            client: IsahcWebPushClient::new()?,
            private_key_pem,
            subject: subject.to_string(),
        })
    }

    /// `None` when push is not configured.
    pub fn from_config(config: &SuiteConfig) -> anyhow::Result<Option<Self>> {
        if !config.push.is_configured() {
            return Ok(None);
        }
        match config.vapid_private_key_file() {
            Some(path) => Self::new(&path, &config.push.vapid_subject).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, subscription: &PushSubscription, payload: &Value) -> Result<(), PushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.p256dh.as_str(),
            subscription.auth.as_str(),
        );

        let mut signature = VapidSignatureBuilder::from_pem(self.private_key_pem.as_slice(), &info)?;
        signature.add_claim("sub", self.subject.as_str());
        let signature = signature.build()?;

        let body = serde_json::to_vec(payload).map_err(|e| PushError::Failed(e.to_string()))?;
        let mut message = WebPushMessageBuilder::new(&info);
        message.set_payload(ContentEncoding::Aes128Gcm, &body);
        message.set_vapid_signature(signature);

        self.client.send(message.build()?).await?;
        Ok(())
    }
}

/// Send `payload` to every subscription of `user_id`, dropping endpoints
/// the push service reports as gone. Returns how many deliveries succeeded.
pub async fn notify_user(
    storage: &Storage,
    sender: &dyn PushSender,
    user_id: &str,
    payload: &Value,
) -> SuiteResult<usize> {
    let subscriptions = storage.subscriptions_for(user_id)?;
    let mut delivered = 0;

    for subscription in &subscriptions {
        match sender.send(subscription, payload).await {
            Ok(()) => delivered += 1,
            Err(PushError::Gone) => {
                tracing::info!(user_id, endpoint = %subscription.endpoint, "Removing expired push subscription");
                storage.remove_endpoint(&subscription.endpoint)?;
            }
            Err(e) => {
                tracing::warn!(user_id, endpoint = %subscription.endpoint, error = %e, "Push delivery failed");
            }
        }
    }

    Ok(delivered)
}


#[cfg(test)]
mod tests {
    use chrono::Utc;
    use prodsuite_core::push::NotificationPayload;

    use super::testing::RecordingSender;
    use super::*;

    fn subscribe(storage: &Storage, user: &str, endpoint: &str) {
        storage
            .upsert_subscription(&PushSubscription {
                user_id: user.into(),
                endpoint: endpoint.into(),
                p256dh: "key".into(),
                auth: "secret".into(),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    #[tokio::test]
    async fn gone_endpoints_are_removed() {
        let storage = Storage::open_in_memory().unwrap();
        subscribe(&storage, "u", "https://push/live");
        subscribe(&storage, "u", "https://push/dead");
        let sender = RecordingSender {
            gone: vec!["https://push/dead".into()],
            ..Default::default()
        };

        let payload = NotificationPayload::test().to_json();
        let delivered = notify_user(&storage, &sender, "u", &payload).await.unwrap();

        assert_eq!(delivered, 1);
        let remaining = storage.subscriptions_for("u").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].endpoint, "https://push/live");
        assert_eq!(sender.sent.lock().unwrap()[0].1["tag"], "test-notification");
    }

    #[test]
    fn unconfigured_push_builds_no_sender() {
        let config = SuiteConfig::default();
        assert!(WebPushSender::from_config(&config).unwrap().is_none());
    }
}
