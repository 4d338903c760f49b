//! Per-shopper carts keyed by the `x-cart-session` header.
//!
//! Sessions live in memory only. Entries idle for longer than the configured
//! TTL are evicted the next time any session is touched.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{extract::FromRequestParts, http::request::Parts};
use pawmarket_checkout::{CheckoutSession, ShippingPolicy};
use pawmarket_core::Cart;
use tokio::sync::Mutex;

use crate::api::ApiError;
use crate::middleware::RequestId;

pub const SESSION_HEADER: &str = "x-cart-session";
const MAX_SESSION_ID_LEN: usize = 128;

/// Validated value of the `x-cart-session` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

fn is_valid_session_id(value: &str) -> bool {
    value.len() <= MAX_SESSION_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();

        let value = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() {
            return Err(ApiError::new(
                request_id,
                "missing_session",
                format!("the {SESSION_HEADER} header is required"),
            ));
        }
        if !is_valid_session_id(value) {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                format!(
                    "{SESSION_HEADER} must be 1-{MAX_SESSION_ID_LEN} characters of letters, digits, '-' or '_'"
                ),
            ));
        }
        Ok(Self(value.to_owned()))
    }
}

#[derive(Debug)]
struct SessionEntry {
    session: Arc<CheckoutSession>,
    last_seen: Instant,
}

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    policy: ShippingPolicy,
    idle_ttl: Duration,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(policy: ShippingPolicy, idle_ttl: Duration) -> Self {
        Self {
            policy,
            idle_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the session for `id`, creating an empty one on first use.
    pub async fn get_or_create(&self, id: &SessionId) -> Arc<CheckoutSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        let ttl = self.idle_ttl;
        sessions.retain(|key, entry| *key == id.0 || now.duration_since(entry.last_seen) < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle cart sessions");
        }

        let entry = sessions.entry(id.0.clone()).or_insert_with(|| {
            tracing::debug!(session = %id.0, "new cart session");
            SessionEntry {
                session: Arc::new(CheckoutSession::new(Cart::new(), self.policy.clone())),
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Arc::clone(&entry.session)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use pawmarket_core::{CartItem, GeoPoint, ProductId};

    use super::*;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            free_shipping_threshold: 50_000,
            fallback_fee: 2_990,
            origin: GeoPoint::new(-33.4372, -70.6506),
            deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn session_id_charset_is_restricted() {
        assert!(is_valid_session_id("abc-123_XYZ"));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("semi;colon"));
        assert!(!is_valid_session_id(&"a".repeat(MAX_SESSION_ID_LEN + 1)));
    }

    #[tokio::test]
    async fn same_id_returns_same_cart() {
        let registry = SessionRegistry::new(policy(), Duration::from_secs(3600));
        let id = SessionId("shopper-1".to_owned());

        let first = registry.get_or_create(&id).await;
        first
            .cart
            .lock()
            .await
            .add_item(CartItem::new(ProductId(1), "Collar", 4_990))
            .expect("add");

        let second = registry.get_or_create(&id).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.cart.snapshot().await.total_item_count(), 1);
    }

    #[tokio::test]
    async fn different_ids_get_separate_carts() {
        let registry = SessionRegistry::new(policy(), Duration::from_secs(3600));
        let a = registry.get_or_create(&SessionId("a".to_owned())).await;
        let b = registry.get_or_create(&SessionId("b".to_owned())).await;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new(policy(), Duration::ZERO);
        registry.get_or_create(&SessionId("stale".to_owned())).await;
        registry.get_or_create(&SessionId("fresh".to_owned())).await;
        assert_eq!(registry.len().await, 1);
    }
}
