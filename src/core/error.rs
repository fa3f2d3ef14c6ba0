use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
///
/// The taxonomy mirrors how each failure is handled:
/// - `Validation` / `NotFound` / `AlreadyPaid` / `Unsupported` fail fast
///   before any state is written.
/// - `DataIntegrity` marks a paid flag with no backing transaction; the
///   create path self-heals it, the refund path surfaces it.
/// - `Gateway` is recoverable: refund completion falls back to the manual
///   ledger path instead of surfacing it raw.
/// - Notification failures never appear here; dispatch is logged and
///   swallowed per channel.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Booking already has a succeeded payment
    #[error("Already paid: {0}")]
    AlreadyPaid(String),

    /// Payment method has no registered handler for the requested operation
    #[error("Unsupported payment method: {0}")]
    Unsupported(String),

    /// Persisted state contradicts itself (paid flag without a transaction)
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Payment gateway errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyPaid(_) => StatusCode::CONFLICT,
            AppError::Unsupported(_) => StatusCode::BAD_REQUEST,
            AppError::DataIntegrity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn already_paid(msg: impl Into<String>) -> Self {
        AppError::AlreadyPaid(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        AppError::Unsupported(msg.into())
    }

    pub fn data_integrity(msg: impl Into<String>) -> Self {
        AppError::DataIntegrity(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::Gateway(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True for failures the refund approval flow treats as recoverable by
    /// falling back to manual completion.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(self, AppError::Gateway(_) | AppError::HttpClient(_))
    }
}
