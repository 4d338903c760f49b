//! Coupon code normalisation and validation against the coupon service.

use std::time::Duration;

use pawmarket_api::ClientError;
use pawmarket_core::{AppliedCoupon, VendorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::CouponService;
use crate::session::SharedCart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    InvalidCode,
    NotApplicable,
    BelowMinimum,
    Expired,
    /// The coupon service could not be reached or answered nonsense.
    Unavailable,
}

impl RejectionKind {
    fn from_api_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "NOT_APPLICABLE" => RejectionKind::NotApplicable,
            "BELOW_MINIMUM" => RejectionKind::BelowMinimum,
            "EXPIRED" => RejectionKind::Expired,
            _ => RejectionKind::InvalidCode,
        }
    }
}

/// Why a coupon was not applied. `message` is the coupon service's own text
/// when it gave one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CouponRejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl CouponRejection {
    fn from_client_error(err: &ClientError) -> Self {
        match err {
            ClientError::Api { status, code, .. } if *status < 500 => Self {
                kind: RejectionKind::from_api_code(code),
                message: err.to_string(),
            },
            _ => Self {
                kind: RejectionKind::Unavailable,
                message: "the coupon service is unavailable, try again later".to_owned(),
            },
        }
    }
}

/// Trims and upper-cases a code. Returns `None` for blank input.
#[must_use]
pub fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_uppercase())
    }
}

#[derive(Debug, Clone)]
pub struct CouponValidator {
    deadline: Duration,
}

impl CouponValidator {
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// Validates `code` for a cart with the given vendors and subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponRejection`] when the code is blank (no service call
    /// is made), when the service rejects it, or when the service fails.
    pub async fn validate<C: CouponService>(
        &self,
        service: &C,
        code: &str,
        vendor_ids: &[VendorId],
        subtotal: i64,
    ) -> Result<AppliedCoupon, CouponRejection> {
        let Some(code) = normalize_code(code) else {
            return Err(CouponRejection {
                kind: RejectionKind::InvalidCode,
                message: "enter a coupon code".to_owned(),
            });
        };

        let outcome = tokio::time::timeout(
            self.deadline,
            service.validate_coupon(&code, vendor_ids, subtotal),
        )
        .await;

        match outcome {
            Ok(Ok(mut coupon)) => {
                coupon.code = code;
                Ok(coupon)
            }
            Ok(Err(err)) => {
                let rejection = CouponRejection::from_client_error(&err);
                tracing::info!(code = %code, kind = ?rejection.kind, error = %err, "coupon rejected");
                Err(rejection)
            }
            Err(_) => {
                tracing::warn!(code = %code, "coupon validation timed out");
                Err(CouponRejection {
                    kind: RejectionKind::Unavailable,
                    message: "the coupon service did not answer in time".to_owned(),
                })
            }
        }
    }

    /// Validates `code` against the current cart contents and, on success,
    /// replaces whatever coupon the cart held. A rejection leaves the cart
    /// untouched.
    ///
    /// # Errors
    ///
    /// Same as [`CouponValidator::validate`].
    pub async fn apply<C: CouponService>(
        &self,
        service: &C,
        cart: &SharedCart,
        code: &str,
    ) -> Result<AppliedCoupon, CouponRejection> {
        let (vendor_ids, subtotal) = {
            let cart = cart.lock().await;
            let vendors: Vec<VendorId> = cart.vendor_ids().into_iter().collect();
            (vendors, cart.subtotal())
        };

        let coupon = self.validate(service, code, &vendor_ids, subtotal).await?;
        let replaced = cart.lock().await.apply_coupon(coupon.clone());
        if let Some(previous) = replaced {
            tracing::debug!(previous = %previous.code, current = %coupon.code, "coupon replaced");
        }
        Ok(coupon)
    }
}

#[cfg(test)]
mod tests {
    use pawmarket_core::{Cart, CartItem, CouponScope, DiscountDescriptor, ProductId};

    use super::*;
    use crate::testing::FakeMarketplace;

    fn validator() -> CouponValidator {
        CouponValidator::new(Duration::from_secs(1))
    }

    fn amount_coupon(code: &str, amount: i64) -> AppliedCoupon {
        AppliedCoupon {
            code: code.to_owned(),
            discount: DiscountDescriptor::Amount(amount),
            scope: CouponScope::Unrestricted,
            minimum_subtotal: 0,
        }
    }

    fn cart_with_item() -> SharedCart {
        let mut cart = Cart::new();
        cart.add_item(CartItem::new(ProductId(1), "Arena sanitaria", 25_000).with_vendor(VendorId(7)))
            .unwrap();
        SharedCart::new(cart)
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  guau10 "), Some("GUAU10".to_owned()));
        assert_eq!(normalize_code("   "), None);
    }

    #[tokio::test]
    async fn blank_code_is_rejected_without_service_call() {
        let fake = FakeMarketplace::new();
        let err = validator()
            .validate(&fake, "  ", &[VendorId(1)], 10_000)
            .await
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidCode);
        assert_eq!(fake.coupon_calls(), 0);
    }

    #[tokio::test]
    async fn code_is_normalized_before_lookup() {
        let fake = FakeMarketplace::new().with_coupon(amount_coupon("GUAU10", 1_000));
        let coupon = validator()
            .validate(&fake, " guau10", &[VendorId(1)], 10_000)
            .await
            .unwrap();
        assert_eq!(coupon.code, "GUAU10");
    }

    #[tokio::test]
    async fn expired_coupon_is_rejected_and_cart_unchanged() {
        let fake = FakeMarketplace::new().with_coupon_rejection(
            "EXPIRED10",
            "EXPIRED",
            "Este cupón expiró el 01-09-2026",
        );
        let cart = cart_with_item();

        let err = validator()
            .apply(&fake, &cart, "expired10")
            .await
            .unwrap_err();

        assert_eq!(err.kind, RejectionKind::Expired);
        assert_eq!(err.message, "Este cupón expiró el 01-09-2026");
        let cart = cart.lock().await;
        assert!(cart.coupon().is_none());
        assert_eq!(cart.discount_amount(), 0);
    }

    #[tokio::test]
    async fn rejection_keeps_previously_applied_coupon() {
        let fake = FakeMarketplace::new()
            .with_coupon(amount_coupon("GUAU10", 1_000))
            .with_coupon_rejection("MIAU", "BELOW_MINIMUM", "Monto mínimo no alcanzado");
        let cart = cart_with_item();

        validator().apply(&fake, &cart, "GUAU10").await.unwrap();
        let err = validator().apply(&fake, &cart, "MIAU").await.unwrap_err();

        assert_eq!(err.kind, RejectionKind::BelowMinimum);
        assert_eq!(cart.lock().await.coupon().unwrap().code, "GUAU10");
    }

    #[tokio::test]
    async fn success_replaces_applied_coupon() {
        let fake = FakeMarketplace::new()
            .with_coupon(amount_coupon("GUAU10", 1_000))
            .with_coupon(amount_coupon("MIAU5", 5_000));
        let cart = cart_with_item();

        validator().apply(&fake, &cart, "GUAU10").await.unwrap();
        validator().apply(&fake, &cart, "miau5").await.unwrap();

        let cart = cart.lock().await;
        assert_eq!(cart.coupon().unwrap().code, "MIAU5");
        assert_eq!(cart.discount_amount(), 5_000);
    }

    #[tokio::test]
    async fn unknown_code_maps_to_invalid_code() {
        let fake = FakeMarketplace::new();
        let err = validator()
            .validate(&fake, "NOPE", &[], 1_000)
            .await
            .unwrap_err();
        assert_eq!(err.kind, RejectionKind::InvalidCode);
        assert_eq!(err.message, "El cupón no existe");
    }

    #[test]
    fn server_errors_map_to_unavailable() {
        let rejection = CouponRejection::from_client_error(&ClientError::Api {
            status: 503,
            code: "DOWN".to_owned(),
            message: "maintenance".to_owned(),
        });
        assert_eq!(rejection.kind, RejectionKind::Unavailable);
    }
}
