use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Terminal payment events that fan out to the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PaymentConfirmed,
    PaymentFailed,
    PaymentRefunded,
    ReceiptRejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::PaymentConfirmed => "payment_confirmed",
            NotificationKind::PaymentFailed => "payment_failed",
            NotificationKind::PaymentRefunded => "payment_refunded",
            NotificationKind::ReceiptRejected => "receipt_rejected",
        }
    }
}

/// Delivery channels the notification service fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Email,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

const ALL_CHANNELS: [NotificationChannel; 3] = [
    NotificationChannel::InApp,
    NotificationChannel::Email,
    NotificationChannel::Sms,
];

/// External collaborator: template rendering and transport live in the
/// notification service. This core calls it at most once per terminal
/// transition, and every caller treats failures as log-and-continue.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn create_payment_notification(
        &self,
        booking_id: i64,
        kind: NotificationKind,
    ) -> Result<()>;
}

/// HTTP dispatcher posting one request per channel.
///
/// Channel failures are isolated: a dead SMS provider must not block the
/// in-app notice, and none of them may surface to the financial operation.
pub struct HttpNotificationDispatcher {
    client: reqwest::Client,
    service_url: String,
}

impl HttpNotificationDispatcher {
    pub fn new(service_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            service_url,
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn create_payment_notification(
        &self,
        booking_id: i64,
        kind: NotificationKind,
    ) -> Result<()> {
        let url = format!("{}/notifications", self.service_url);

        for channel in ALL_CHANNELS {
            let body = serde_json::json!({
                "booking_id": booking_id,
                "type": kind.as_str(),
                "channel": channel.as_str(),
            });

            let outcome = self.client.post(&url).json(&body).send().await;

            match outcome {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    warn!(
                        booking_id,
                        kind = kind.as_str(),
                        channel = channel.as_str(),
                        status = %response.status(),
                        "Notification channel rejected the request"
                    );
                }
                Err(e) => {
                    warn!(
                        booking_id,
                        kind = kind.as_str(),
                        channel = channel.as_str(),
                        error = %e,
                        "Notification channel unreachable"
                    );
                }
            }
        }

        Ok(())
    }
}
