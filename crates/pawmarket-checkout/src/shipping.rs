//! Shipping fee resolution: free-shipping and pickup short-circuits, the
//! delivery-fee service, and a flat fallback when the service is unusable.

use std::time::Duration;

use pawmarket_core::{AppConfig, DeliveryMethod, GeoPoint, ShippingAddress};
use tokio::sync::Mutex;

use crate::ports::DeliveryFeeQuoter;
use crate::resolution::Resolution;

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingPolicy {
    /// Subtotal at or above which delivery is free.
    pub free_shipping_threshold: i64,
    pub fallback_fee: i64,
    /// Dispatch origin for distance estimates.
    pub origin: GeoPoint,
    /// Upper bound on a single fee-service call.
    pub deadline: Duration,
}

impl ShippingPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            free_shipping_threshold: config.free_shipping_threshold,
            fallback_fee: config.fallback_shipping_fee,
            origin: config.origin,
            deadline: Duration::from_secs(config.request_timeout_secs),
        }
    }

    #[must_use]
    pub fn qualifies_for_free_shipping(&self, subtotal: i64) -> bool {
        subtotal >= self.free_shipping_threshold
    }
}

#[derive(Debug, Clone, PartialEq)]
struct QuoteKey {
    method: DeliveryMethod,
    address: Option<ShippingAddress>,
    free_shipping: bool,
}

#[derive(Debug, Default)]
struct QuoteCache {
    key: Option<QuoteKey>,
    fee: Option<i64>,
}

/// Resolves the delivery fee for a checkout session.
///
/// A successful quote is cached until the delivery method, the address or
/// the free-shipping qualification changes. Fallback fees are not cached, so
/// the next resolution asks the service again.
#[derive(Debug)]
pub struct ShippingFeeResolver {
    policy: ShippingPolicy,
    cache: Mutex<QuoteCache>,
}

impl ShippingFeeResolver {
    #[must_use]
    pub fn new(policy: ShippingPolicy) -> Self {
        Self {
            policy,
            cache: Mutex::new(QuoteCache::default()),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ShippingPolicy {
        &self.policy
    }

    /// Fee for a delivery over `distance_km`, without caching.
    ///
    /// Pickup and orders at or above the free-shipping threshold resolve to
    /// `0` without calling the service. Any service failure, including the
    /// deadline elapsing, degrades to the fallback fee.
    pub async fn resolve_fee<Q: DeliveryFeeQuoter>(
        &self,
        quoter: &Q,
        method: DeliveryMethod,
        subtotal: i64,
        distance_km: f64,
    ) -> Resolution<i64> {
        if method == DeliveryMethod::Pickup || self.policy.qualifies_for_free_shipping(subtotal) {
            return Resolution::Resolved(0);
        }

        match tokio::time::timeout(self.policy.deadline, quoter.quote_delivery_fee(distance_km))
            .await
        {
            Ok(Ok(fee)) => {
                tracing::debug!(distance_km, fee, "delivery fee quoted");
                Resolution::Resolved(fee)
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    distance_km,
                    fallback = self.policy.fallback_fee,
                    error = %err,
                    "delivery fee quote failed, using fallback fee"
                );
                Resolution::degraded(
                    self.policy.fallback_fee,
                    format!("delivery fee service failed: {err}"),
                )
            }
            Err(_) => {
                tracing::warn!(
                    distance_km,
                    fallback = self.policy.fallback_fee,
                    deadline_ms = u64::try_from(self.policy.deadline.as_millis()).unwrap_or(u64::MAX),
                    "delivery fee quote timed out, using fallback fee"
                );
                Resolution::degraded(
                    self.policy.fallback_fee,
                    "delivery fee service timed out",
                )
            }
        }
    }

    /// Fee for delivering the cart to `address`, reusing the cached quote
    /// when nothing relevant changed since the last call.
    ///
    /// Distance is measured from the policy origin to the address
    /// coordinates; an address without coordinates falls back to the flat fee.
    pub async fn resolve_for_address<Q: DeliveryFeeQuoter>(
        &self,
        quoter: &Q,
        method: DeliveryMethod,
        subtotal: i64,
        address: Option<&ShippingAddress>,
    ) -> Resolution<i64> {
        let free_shipping = self.policy.qualifies_for_free_shipping(subtotal);
        let key = QuoteKey {
            method,
            address: match method {
                DeliveryMethod::Delivery => address.cloned(),
                DeliveryMethod::Pickup => None,
            },
            free_shipping,
        };

        let mut cache = self.cache.lock().await;
        if cache.key.as_ref() != Some(&key) {
            cache.key = Some(key);
            cache.fee = None;
        }

        if method == DeliveryMethod::Pickup || free_shipping {
            return Resolution::Resolved(0);
        }
        if let Some(fee) = cache.fee {
            return Resolution::Resolved(fee);
        }

        let Some(destination) = address.and_then(|a| a.location) else {
            tracing::warn!(
                fallback = self.policy.fallback_fee,
                "delivery address has no coordinates, using fallback fee"
            );
            return Resolution::degraded(
                self.policy.fallback_fee,
                "delivery address has no coordinates",
            );
        };

        let distance_km = self.policy.origin.distance_km_to(&destination);
        let resolution = self.resolve_fee(quoter, method, subtotal, distance_km).await;
        if let Resolution::Resolved(fee) = resolution {
            cache.fee = Some(fee);
        }
        resolution
    }

    /// Drops the cached quote.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        cache.key = None;
        cache.fee = None;
    }
}

#[cfg(test)]
#[path = "shipping_test.rs"]
mod tests;
