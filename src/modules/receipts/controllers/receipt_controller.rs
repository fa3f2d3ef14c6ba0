use std::sync::Arc;

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::core::Result;
use crate::middleware::Principal;
use crate::modules::receipts::services::ReceiptConfirmationWorkflow;

/// Receipt endpoints: customers submit proof of payment, staff review it
///
/// POST /api/receipts/{booking_id}
/// POST /api/receipts/{booking_id}/confirm
/// POST /api/receipts/{booking_id}/reject
pub struct ReceiptController;

impl ReceiptController {
    pub fn configure(cfg: &mut web::ServiceConfig, workflow: Arc<ReceiptConfirmationWorkflow>) {
        cfg.app_data(web::Data::new(workflow)).service(
            web::scope("/api/receipts")
                .service(submit_receipt)
                .service(confirm_receipt)
                .service(reject_receipt),
        );
    }
}

#[derive(Debug, Deserialize)]
struct SubmitReceiptBody {
    receipt_path: String,
}

#[post("/{booking_id}")]
async fn submit_receipt(
    path: web::Path<i64>,
    body: web::Json<SubmitReceiptBody>,
    principal: Principal,
    workflow: web::Data<Arc<ReceiptConfirmationWorkflow>>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();

    let outcome = workflow
        .submit(booking_id, principal.account_id, &body.receipt_path)
        .await?;
    Ok(HttpResponse::Created().json(outcome))
}

#[post("/{booking_id}/confirm")]
async fn confirm_receipt(
    path: web::Path<i64>,
    principal: Principal,
    workflow: web::Data<Arc<ReceiptConfirmationWorkflow>>,
) -> Result<HttpResponse> {
    principal.require_staff()?;
    let booking_id = path.into_inner();

    info!(
        booking_id,
        account_id = principal.account_id,
        "Receipt confirmation requested"
    );

    let outcome = workflow.confirm(booking_id, principal.account_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[derive(Debug, Deserialize)]
struct RejectReceiptBody {
    reason: String,
}

#[post("/{booking_id}/reject")]
async fn reject_receipt(
    path: web::Path<i64>,
    body: web::Json<RejectReceiptBody>,
    principal: Principal,
    workflow: web::Data<Arc<ReceiptConfirmationWorkflow>>,
) -> Result<HttpResponse> {
    principal.require_staff()?;
    let booking_id = path.into_inner();

    let outcome = workflow
        .reject(booking_id, principal.account_id, &body.reason)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}
