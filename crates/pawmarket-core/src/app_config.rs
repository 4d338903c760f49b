use std::net::SocketAddr;
use std::path::PathBuf;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub cart_path: PathBuf,
    /// Subtotal at or above which delivery is free, in minor units.
    pub free_shipping_threshold: i64,
    /// Flat delivery fee used when the fee service cannot be reached.
    pub fallback_shipping_fee: i64,
    /// Dispatch origin that delivery distances are measured from.
    pub origin: GeoPoint,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Lower-cased identities that may check out without a payment method.
    pub exempt_emails: Vec<String>,
    pub exempt_payment_method: String,
}

impl AppConfig {
    /// Whether `email` belongs to a payment-exempt test identity.
    #[must_use]
    pub fn is_exempt(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        !email.is_empty() && self.exempt_emails.iter().any(|e| *e == email)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("cart_path", &self.cart_path)
            .field("free_shipping_threshold", &self.free_shipping_threshold)
            .field("fallback_shipping_fee", &self.fallback_shipping_fee)
            .field("origin", &self.origin)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("exempt_emails", &self.exempt_emails.len())
            .field("exempt_payment_method", &self.exempt_payment_method)
            .finish()
    }
}
