use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::gateway_trait::{
    CreateRefundRequest, CreateSourceRequest, GatewayRefund, ProviderGateway, Source,
};
use crate::core::{AppError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_RETRIES: u32 = 3;

/// PayMongo gateway client
///
/// Wraps `POST /sources` and `POST /refunds`. Transient failures are retried
/// with exponential backoff up to `MAX_RETRIES`; anything still failing
/// surfaces as `AppError::Gateway` for the caller's fallback policy.
pub struct PaymongoGateway {
    client: ClientWithMiddleware,
    secret_key: String,
    base_url: String,
}

impl PaymongoGateway {
    pub fn new(secret_key: String, base_url: String) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            secret_key,
            base_url,
        })
    }
}

#[derive(Deserialize)]
struct PaymongoEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct SourceData {
    id: String,
    attributes: SourceAttributes,
}

#[derive(Deserialize)]
struct SourceAttributes {
    redirect: SourceRedirect,
}

#[derive(Deserialize)]
struct SourceRedirect {
    checkout_url: String,
}

#[derive(Deserialize)]
struct RefundData {
    id: String,
}

#[async_trait]
impl ProviderGateway for PaymongoGateway {
    async fn create_source(&self, request: CreateSourceRequest) -> Result<Source> {
        let url = format!("{}/sources", self.base_url);

        let body = json!({
            "data": {
                "attributes": {
                    "amount": request.amount_minor,
                    "currency": request.currency,
                    "type": request.source_type,
                    "redirect": {
                        "success": request.success_url,
                        "failed": request.failure_url,
                    },
                    "billing": {
                        "name": request.billing_name,
                        "email": request.billing_email,
                        "phone": request.billing_phone,
                    },
                    "description": request.description,
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayMongo source request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "PayMongo source API error {}: {}",
                status, error_body
            )));
        }

        let envelope: PaymongoEnvelope<SourceData> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse PayMongo source: {}", e)))?;

        Ok(Source {
            id: envelope.data.id,
            checkout_url: envelope.data.attributes.redirect.checkout_url,
        })
    }

    async fn create_refund(&self, request: CreateRefundRequest) -> Result<GatewayRefund> {
        let url = format!("{}/refunds", self.base_url);

        let body = json!({
            "data": {
                "attributes": {
                    "payment_id": request.payment_id,
                    "amount": request.amount_minor,
                    "reason": request.reason.as_str(),
                    "notes": request.notes,
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("PayMongo refund request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "PayMongo refund API error {}: {}",
                status, error_body
            )));
        }

        let envelope: PaymongoEnvelope<RefundData> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse PayMongo refund: {}", e)))?;

        Ok(GatewayRefund {
            id: envelope.data.id,
        })
    }

    fn name(&self) -> &str {
        "paymongo"
    }
}
