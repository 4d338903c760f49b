//! Applied promotional coupon and the client-side discount estimate derived
//! from it. The order service remains authoritative for the discount that is
//! actually charged; this estimate only drives the totals shown before
//! submission.

use std::collections::BTreeSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::ids::VendorId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountDescriptor {
    /// Fixed amount in minor currency units.
    Amount(i64),
    /// Percentage of the eligible subtotal, `0..=100`.
    Percentage(Decimal),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "vendor_ids", rename_all = "snake_case")]
pub enum CouponScope {
    #[default]
    Unrestricted,
    Vendors(BTreeSet<VendorId>),
}

impl CouponScope {
    #[must_use]
    pub fn covers(&self, vendor: Option<VendorId>) -> bool {
        match self {
            CouponScope::Unrestricted => true,
            CouponScope::Vendors(ids) => vendor.is_some_and(|v| ids.contains(&v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// Trimmed, upper-cased code as submitted to the coupon service.
    pub code: String,
    pub discount: DiscountDescriptor,
    #[serde(default)]
    pub scope: CouponScope,
    #[serde(default)]
    pub minimum_subtotal: i64,
}

impl AppliedCoupon {
    /// Discount this coupon grants on `items`, clamped to `[0, eligible subtotal]`.
    ///
    /// Returns `0` when the cart subtotal is below the coupon minimum or no
    /// item belongs to a vendor in the coupon scope.
    #[must_use]
    pub fn discount_for(&self, items: &[CartItem]) -> i64 {
        let subtotal: i64 = items.iter().map(CartItem::line_total).sum();
        if subtotal < self.minimum_subtotal {
            return 0;
        }

        let eligible: i64 = items
            .iter()
            .filter(|item| self.scope.covers(item.vendor_id))
            .map(CartItem::line_total)
            .sum();
        if eligible <= 0 {
            return 0;
        }

        let raw = match &self.discount {
            DiscountDescriptor::Amount(amount) => *amount,
            DiscountDescriptor::Percentage(pct) => {
                let pct = (*pct).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                (Decimal::from(eligible) * pct / Decimal::ONE_HUNDRED)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                    .to_i64()
                    .unwrap_or(0)
            }
        };

        raw.clamp(0, eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ProductId;

    fn item(product: i64, price: i64, quantity: u32, vendor: Option<i64>) -> CartItem {
        let mut item = CartItem::new(ProductId(product), format!("Product {product}"), price);
        item.quantity = quantity;
        item.vendor_id = vendor.map(VendorId);
        item
    }

    fn coupon(discount: DiscountDescriptor) -> AppliedCoupon {
        AppliedCoupon {
            code: "PERROS10".to_string(),
            discount,
            scope: CouponScope::Unrestricted,
            minimum_subtotal: 0,
        }
    }

    #[test]
    fn fixed_amount_applies_in_full() {
        let items = vec![item(1, 10_000, 2, Some(1))];
        assert_eq!(coupon(DiscountDescriptor::Amount(3_000)).discount_for(&items), 3_000);
    }

    #[test]
    fn fixed_amount_is_clamped_to_subtotal() {
        let items = vec![item(1, 2_000, 1, Some(1))];
        assert_eq!(coupon(DiscountDescriptor::Amount(5_000)).discount_for(&items), 2_000);
    }

    #[test]
    fn negative_amount_is_clamped_to_zero() {
        let items = vec![item(1, 2_000, 1, Some(1))];
        assert_eq!(coupon(DiscountDescriptor::Amount(-100)).discount_for(&items), 0);
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        let items = vec![item(1, 12_345, 1, Some(1))];
        let c = coupon(DiscountDescriptor::Percentage(Decimal::new(10, 0)));
        // 1234.5 → 1235
        assert_eq!(c.discount_for(&items), 1_235);
    }

    #[test]
    fn percentage_over_hundred_is_capped() {
        let items = vec![item(1, 5_000, 1, Some(1))];
        let c = coupon(DiscountDescriptor::Percentage(Decimal::new(150, 0)));
        assert_eq!(c.discount_for(&items), 5_000);
    }

    #[test]
    fn below_minimum_subtotal_grants_nothing() {
        let items = vec![item(1, 5_000, 1, Some(1))];
        let mut c = coupon(DiscountDescriptor::Amount(1_000));
        c.minimum_subtotal = 20_000;
        assert_eq!(c.discount_for(&items), 0);
    }

    #[test]
    fn scoped_coupon_only_discounts_scoped_vendors() {
        let items = vec![item(1, 10_000, 1, Some(1)), item(2, 20_000, 1, Some(2))];
        let mut c = coupon(DiscountDescriptor::Percentage(Decimal::new(10, 0)));
        c.scope = CouponScope::Vendors(BTreeSet::from([VendorId(2)]));
        assert_eq!(c.discount_for(&items), 2_000);
    }

    #[test]
    fn scoped_coupon_without_matching_items_grants_nothing() {
        let items = vec![item(1, 10_000, 1, Some(1)), item(2, 20_000, 1, None)];
        let mut c = coupon(DiscountDescriptor::Amount(1_000));
        c.scope = CouponScope::Vendors(BTreeSet::from([VendorId(9)]));
        assert_eq!(c.discount_for(&items), 0);
    }

    #[test]
    fn descriptor_deserializes_from_tagged_json() {
        let d: DiscountDescriptor =
            serde_json::from_str(r#"{"type":"percentage","value":"12.5"}"#).unwrap();
        assert_eq!(d, DiscountDescriptor::Percentage(Decimal::new(125, 1)));
        let d: DiscountDescriptor =
            serde_json::from_str(r#"{"type":"amount","value":3000}"#).unwrap();
        assert_eq!(d, DiscountDescriptor::Amount(3_000));
    }
}
