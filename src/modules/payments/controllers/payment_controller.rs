use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use tracing::info;

use crate::core::Result;
use crate::modules::payments::services::{CreatePaymentRequest, PaymentIntentService};

/// Payment intent endpoints
///
/// POST /api/payments          open a payment intent for a booking
/// GET  /api/payments/{id}     poll a transaction
pub struct PaymentController;

impl PaymentController {
    pub fn configure(cfg: &mut web::ServiceConfig, service: Arc<PaymentIntentService>) {
        cfg.app_data(web::Data::new(service)).service(
            web::scope("/api/payments")
                .service(create_payment)
                .service(get_transaction),
        );
    }
}

#[post("")]
async fn create_payment(
    body: web::Json<CreatePaymentRequest>,
    service: web::Data<Arc<PaymentIntentService>>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    info!(
        booking_id = request.booking_id,
        method = %request.method,
        "Payment intent requested"
    );

    let intent = service.create(request).await?;
    Ok(HttpResponse::Created().json(intent))
}

#[get("/{transaction_id}")]
async fn get_transaction(
    path: web::Path<String>,
    service: web::Data<Arc<PaymentIntentService>>,
) -> Result<HttpResponse> {
    let transaction = service.get_transaction(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(transaction))
}
