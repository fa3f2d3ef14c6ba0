use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::core::Result;
use crate::middleware::Principal;
use crate::modules::refunds::models::InitiatorType;
use crate::modules::refunds::services::{Initiator, RefundOrchestrator};

/// Refund endpoints
///
/// POST /api/bookings/{booking_id}/refund         refund a paid booking
/// POST /api/refund-requests/{refund_id}/complete settle an approved request
pub struct RefundController;

impl RefundController {
    pub fn configure(cfg: &mut web::ServiceConfig, orchestrator: Arc<RefundOrchestrator>) {
        cfg.app_data(web::Data::new(orchestrator))
            .service(web::scope("/api/bookings").service(refund_booking))
            .service(web::scope("/api/refund-requests").service(complete_refund_request));
    }
}

#[derive(Debug, Deserialize, Default)]
struct RefundBookingBody {
    #[serde(default)]
    reason: Option<String>,
}

#[post("/{booking_id}/refund")]
async fn refund_booking(
    path: web::Path<i64>,
    body: Option<web::Json<RefundBookingBody>>,
    principal: Principal,
    orchestrator: web::Data<Arc<RefundOrchestrator>>,
) -> Result<HttpResponse> {
    principal.require_staff()?;
    let booking_id = path.into_inner();

    info!(
        booking_id,
        account_id = principal.account_id,
        reason = body
            .as_ref()
            .and_then(|b| b.reason.as_deref())
            .unwrap_or("unspecified"),
        "Booking refund requested"
    );

    let outcome = orchestrator
        .process_automatic_refund(
            booking_id,
            Initiator {
                id: principal.account_id,
                kind: InitiatorType::Staff,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/{refund_id}/complete")]
async fn complete_refund_request(
    path: web::Path<String>,
    principal: Principal,
    orchestrator: web::Data<Arc<RefundOrchestrator>>,
) -> Result<HttpResponse> {
    principal.require_staff()?;
    let refund_id = path.into_inner();

    let outcome = orchestrator
        .complete_refund_request(&refund_id, principal.account_id)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}
