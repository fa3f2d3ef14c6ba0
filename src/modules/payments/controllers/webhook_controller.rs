use std::sync::Arc;

use actix_web::{post, web, HttpRequest, HttpResponse};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::payments::services::WebhookProcessor;

type HmacSha256 = Hmac<Sha256>;

/// Inbound PayMongo webhook endpoint
///
/// Verifies the `Paymongo-Signature` header against the raw body, extracts
/// the source id and status, and hands them to the processor. Unknown
/// sources still get a 200 so the provider stops redelivering.
pub struct WebhookController;

/// Shared state for the webhook route
pub struct WebhookContext {
    pub processor: Arc<WebhookProcessor>,
    pub webhook_secret: String,
}

impl WebhookController {
    pub fn configure(cfg: &mut web::ServiceConfig, context: WebhookContext) {
        cfg.app_data(web::Data::new(context))
            .service(web::scope("/webhooks").service(process_paymongo_webhook));
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    data: WebhookEvent,
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    attributes: WebhookEventAttributes,
}

#[derive(Debug, Deserialize)]
struct WebhookEventAttributes {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookResource,
}

#[derive(Debug, Deserialize)]
struct WebhookResource {
    id: String,
    attributes: WebhookResourceAttributes,
}

#[derive(Debug, Deserialize)]
struct WebhookResourceAttributes {
    status: String,
}

#[post("/paymongo")]
async fn process_paymongo_webhook(
    req: HttpRequest,
    body: web::Bytes,
    context: web::Data<WebhookContext>,
) -> Result<HttpResponse> {
    let signature_header = req
        .headers()
        .get("Paymongo-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing Paymongo-Signature header"))?;

    verify_signature(signature_header, &body, &context.webhook_secret)?;

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid webhook payload: {}", e)))?;

    let source_id = envelope.data.attributes.data.id;
    let status = envelope.data.attributes.data.attributes.status;

    info!(
        source_id = %source_id,
        status = %status,
        event_type = %envelope.data.attributes.event_type,
        "Received PayMongo webhook"
    );

    let processed = context
        .processor
        .process_payment_webhook(&source_id, &status)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "processed": processed })))
}

/// Verify `Paymongo-Signature: t=<ts>,te=<hex>,li=<hex>`.
///
/// The signed message is `"{t}.{raw_body}"`; the test-mode (`te`) and
/// live-mode (`li`) digests are both accepted so one deployment config
/// serves both key sets.
fn verify_signature(header: &str, body: &[u8], secret: &str) -> Result<()> {
    let mut timestamp = None;
    let mut digests: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("te", value)) | Some(("li", value)) if !value.is_empty() => {
                digests.push(value)
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::unauthorized("Malformed webhook signature"))?;
    if digests.is_empty() {
        return Err(AppError::unauthorized("Malformed webhook signature"));
    }

    for digest in digests {
        let Ok(expected) = hex::decode(digest) else {
            warn!("Webhook signature digest is not valid hex");
            continue;
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::internal("Webhook secret is unusable as an HMAC key"))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);

        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::unauthorized("Webhook signature mismatch"))
}
