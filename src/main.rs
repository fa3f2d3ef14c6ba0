use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rainbowpay::config::Config;
use rainbowpay::middleware::{PrincipalExtractor, RequestId};
use rainbowpay::modules::bookings::MySqlBookingRepository;
use rainbowpay::modules::gateways::PaymongoGateway;
use rainbowpay::modules::notifications::HttpNotificationDispatcher;
use rainbowpay::modules::payments::controllers::{
    PaymentController, WebhookContext, WebhookController,
};
use rainbowpay::modules::payments::repositories::MySqlTransactionRepository;
use rainbowpay::modules::payments::services::{
    CashStrategy, GcashStrategy, PaymentIntentService, PaymentMethodRegistry, QrManualStrategy,
    RedirectPolicy, WebhookProcessor,
};
use rainbowpay::modules::receipts::controllers::ReceiptController;
use rainbowpay::modules::receipts::repositories::{MySqlReceiptRepository, ReceiptRepository};
use rainbowpay::modules::receipts::services::ReceiptConfirmationWorkflow;
use rainbowpay::modules::refunds::controllers::RefundController;
use rainbowpay::modules::refunds::repositories::MySqlRefundRepository;
use rainbowpay::modules::refunds::services::RefundOrchestrator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rainbowpay=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting RainbowPay Payment Orchestration Service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");

    tracing::info!(
        "Database pool initialized (up to {} connections)",
        config.database.max_connections
    );

    // Repositories
    let bookings = Arc::new(MySqlBookingRepository::new(db_pool.clone()));
    let transactions = Arc::new(MySqlTransactionRepository::new(db_pool.clone()));
    let refund_store = Arc::new(MySqlRefundRepository::new(db_pool.clone()));

    // The receipt store needs DDL on first run; without it the review
    // workflow degrades to operating on the booking alone.
    let receipts: Option<Arc<dyn ReceiptRepository>> =
        match MySqlReceiptRepository::ensure_schema(db_pool.clone()).await {
            Ok(repo) => Some(Arc::new(repo)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Receipt store unavailable; receipt review runs in degraded mode"
                );
                None
            }
        };

    // Gateway and outbound services
    let gateway = Arc::new(
        PaymongoGateway::new(
            config.paymongo.secret_key.clone(),
            config.paymongo.base_url.clone(),
        )
        .expect("Failed to build PayMongo client"),
    );
    let notifier = Arc::new(
        HttpNotificationDispatcher::new(config.notifications.service_url.clone())
            .expect("Failed to build notification client"),
    );
    let redirects =
        RedirectPolicy::from_app_config(&config.app).expect("Invalid redirect configuration");

    // Per-method behavior
    let mut registry = PaymentMethodRegistry::new();
    registry.register(Arc::new(CashStrategy));
    registry.register(Arc::new(GcashStrategy::new(gateway.clone(), redirects)));
    registry.register(Arc::new(QrManualStrategy));
    let strategies = Arc::new(registry);

    // Services
    let intent_service = Arc::new(PaymentIntentService::new(
        bookings.clone(),
        transactions.clone(),
        strategies.clone(),
    ));
    let webhook_processor = Arc::new(WebhookProcessor::new(
        transactions.clone(),
        bookings.clone(),
        notifier.clone(),
    ));
    let refund_orchestrator = Arc::new(RefundOrchestrator::new(
        bookings.clone(),
        transactions.clone(),
        refund_store.clone(),
        strategies.clone(),
        notifier.clone(),
    ));
    let receipt_workflow = Arc::new(ReceiptConfirmationWorkflow::new(
        bookings.clone(),
        receipts.clone(),
        refund_orchestrator.clone(),
        notifier.clone(),
    ));

    let webhook_secret = config.paymongo.webhook_secret.clone();
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestId)
            .wrap(PrincipalExtractor)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(Cors::permissive())
            .configure(|cfg| PaymentController::configure(cfg, intent_service.clone()))
            .configure(|cfg| {
                WebhookController::configure(
                    cfg,
                    WebhookContext {
                        processor: webhook_processor.clone(),
                        webhook_secret: webhook_secret.clone(),
                    },
                )
            })
            .configure(|cfg| ReceiptController::configure(cfg, receipt_workflow.clone()))
            .configure(|cfg| RefundController::configure(cfg, refund_orchestrator.clone()))
            .route("/health", web::get().to(health_check))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "rainbowpay"
    }))
}
