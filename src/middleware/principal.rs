use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Account type carried by the upstream session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Admin,
    Business,
    Customer,
}

impl AccountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(AccountType::Admin),
            "business" => Some(AccountType::Business),
            "customer" => Some(AccountType::Customer),
            _ => None,
        }
    }

    /// Staff accounts may review receipts and complete refund requests
    pub fn is_staff(&self) -> bool {
        matches!(self, AccountType::Admin | AccountType::Business)
    }
}

/// Authenticated principal, resolved by the upstream session layer.
///
/// Session verification itself lives outside this service; the reverse
/// proxy forwards the verified identity as `X-Account-Id` and
/// `X-Account-Type` headers and this middleware materializes it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: i64,
    pub account_type: AccountType,
}

impl Principal {
    pub fn require_staff(&self) -> crate::core::Result<()> {
        if self.account_type.is_staff() {
            Ok(())
        } else {
            Err(AppError::unauthorized(
                "This operation requires a staff account",
            ))
        }
    }
}

impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(principal.ok_or_else(|| {
            Error::from(AppError::unauthorized("Missing authenticated principal"))
        }))
    }
}

/// Middleware that extracts the forwarded principal into request extensions
pub struct PrincipalExtractor;

impl<S, B> Transform<S, ServiceRequest> for PrincipalExtractor
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PrincipalExtractorMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PrincipalExtractorMiddleware { service }))
    }
}

pub struct PrincipalExtractorMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PrincipalExtractorMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let account_id = req
            .headers()
            .get("X-Account-Id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok());
        let account_type = req
            .headers()
            .get("X-Account-Type")
            .and_then(|h| h.to_str().ok())
            .and_then(AccountType::parse);

        if let (Some(account_id), Some(account_type)) = (account_id, account_type) {
            req.extensions_mut().insert(Principal {
                account_id,
                account_type,
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await })
    }
}
