use crate::config::AppConfig;
use crate::core::{AppError, Result};
use reqwest::Url;

/// Redirect URLs handed to the gateway for a checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUrls {
    pub success_url: String,
    pub failure_url: String,
}

/// Sanitizes caller-supplied redirect URLs for gateway checkout.
///
/// A supplied URL is honored only when it is same-origin with the deployed
/// dashboard; anything else (other hosts, schemes, or unparseable strings)
/// is replaced with the configured default paths. This closes the
/// open-redirect hole where a crafted payment request bounces the customer
/// to an attacker page after checkout.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    base: Url,
    success_path: String,
    failure_path: String,
}

impl RedirectPolicy {
    pub fn new(base_url: &str, success_path: &str, failure_path: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            base,
            success_path: success_path.to_string(),
            failure_path: failure_path.to_string(),
        })
    }

    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        Self::new(
            &app.base_url,
            &app.success_redirect_path,
            &app.failure_redirect_path,
        )
    }

    /// Resolve the pair of redirect URLs for a checkout session
    pub fn resolve(
        &self,
        requested_return: Option<&str>,
        requested_cancel: Option<&str>,
    ) -> RedirectUrls {
        RedirectUrls {
            success_url: self.sanitize(requested_return, &self.success_path),
            failure_url: self.sanitize(requested_cancel, &self.failure_path),
        }
    }

    fn sanitize(&self, requested: Option<&str>, fallback_path: &str) -> String {
        if let Some(candidate) = requested {
            if let Ok(url) = Url::parse(candidate) {
                if self.same_origin(&url) {
                    return url.to_string();
                }
                tracing::warn!(
                    requested = candidate,
                    "Discarding redirect URL from foreign origin"
                );
            }
        }
        self.default_url(fallback_path)
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.base.scheme()
            && url.host_str() == self.base.host_str()
            && url.port_or_known_default() == self.base.port_or_known_default()
    }

    fn default_url(&self, path: &str) -> String {
        self.base
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base, path))
    }
}
