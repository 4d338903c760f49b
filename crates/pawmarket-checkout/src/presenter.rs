//! Plain-text rendering of carts, quotes and checkout outcomes. Display only:
//! nothing here changes state.

use std::fmt::Write as _;

use pawmarket_core::{format_clp, Cart, CheckoutTotals, DeliveryMethod};

use crate::orchestrator::{CheckoutQuote, Confirmation, PartialFailure, SubmissionFailure};

pub const SUPPORT_HINT: &str = "Contact support and quote your purchase reference so we can help.";

fn push_totals(out: &mut String, totals: &CheckoutTotals) {
    let _ = writeln!(out, "  Subtotal:  {}", format_clp(totals.subtotal));
    if totals.discount > 0 {
        let _ = writeln!(out, "  Discount:  {}", format_clp(-totals.discount));
    }
    let shipping = if totals.shipping == 0 {
        "free".to_owned()
    } else {
        format_clp(totals.shipping)
    };
    let _ = writeln!(out, "  Shipping:  {shipping}");
    let _ = writeln!(out, "  Total:     {}", format_clp(totals.total));
}

#[must_use]
pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_owned();
    }

    let mut out = String::new();
    for item in cart.items() {
        let vendor = item
            .store_name
            .clone()
            .or_else(|| item.vendor_id.map(|v| format!("vendor {v}")))
            .unwrap_or_else(|| "vendor pending".to_owned());
        let _ = writeln!(
            out,
            "  [{}] {} x{} @ {} = {} ({vendor})",
            item.product_id,
            item.name,
            item.quantity,
            format_clp(item.unit_price),
            format_clp(item.line_total()),
        );
    }
    let _ = writeln!(out, "  Items:     {}", cart.total_item_count());
    let _ = writeln!(out, "  Subtotal:  {}", format_clp(cart.subtotal()));
    if let Some(coupon) = cart.coupon() {
        let discount = cart.discount_amount();
        if discount > 0 {
            let _ = writeln!(out, "  Coupon {}: {}", coupon.code, format_clp(-discount));
        } else {
            let _ = writeln!(
                out,
                "  Coupon {}: does not apply to the current cart",
                coupon.code
            );
        }
    }
    out
}

#[must_use]
pub fn render_quote(quote: &CheckoutQuote) -> String {
    let mut out = String::new();
    if let Some(km) = quote.distance_km {
        let _ = writeln!(out, "  Distance:  {km:.1} km");
    }
    push_totals(&mut out, &quote.totals);
    if let Some(note) = &quote.shipping_note {
        let _ = writeln!(out, "  Note: standard shipping rate applied ({note})");
    }
    out
}

#[must_use]
pub fn render_confirmation(confirmation: &Confirmation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order confirmed!");
    let _ = writeln!(out, "  Purchase reference: {}", confirmation.purchase_group);
    for result in &confirmation.results {
        let store = if result.store_name.is_empty() {
            format!("vendor {}", result.vendor_id)
        } else {
            result.store_name.clone()
        };
        let _ = writeln!(
            out,
            "  Order #{} from {store}: payment {} via {}",
            result.order_id, result.payment_status, result.payment_method
        );
    }
    match confirmation.delivery_method {
        DeliveryMethod::Pickup => {
            let _ = writeln!(out, "  Pickup at the store");
        }
        DeliveryMethod::Delivery => {
            if let Some(address) = &confirmation.address {
                let _ = writeln!(out, "  Delivering to {}", address.one_line());
            }
        }
    }
    if let Some(coupon) = &confirmation.coupon {
        let _ = writeln!(out, "  Coupon: {}", coupon.code);
    }
    push_totals(&mut out, &confirmation.totals);
    out
}

/// Partial completion: what went through, what failed, what was never sent.
#[must_use]
pub fn render_partial_failure(failure: &PartialFailure) -> String {
    let mut out = String::new();
    match (&failure.cause, failure.failed_vendor) {
        (SubmissionFailure::Cancelled, _) | (_, None) => {
            let _ = writeln!(out, "Checkout was cancelled.");
        }
        (cause, Some(vendor)) => {
            let _ = writeln!(out, "The order for vendor {vendor} could not be placed: {cause}");
        }
    }

    if failure.accepted.is_empty() {
        let _ = writeln!(out, "No orders were placed. Your cart has not changed.");
        return out;
    }

    let _ = writeln!(out, "These orders were placed and remain valid:");
    for result in &failure.accepted {
        let _ = writeln!(
            out,
            "  Order #{} (vendor {}): payment {}",
            result.order_id, result.vendor_id, result.payment_status
        );
    }
    if !failure.not_attempted.is_empty() {
        let vendors: Vec<String> = failure.not_attempted.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "Not submitted: vendors {}", vendors.join(", "));
    }
    let _ = writeln!(out, "Your cart still holds every item.");
    let _ = writeln!(out, "{SUPPORT_HINT}");
    let _ = writeln!(out, "  Purchase reference: {}", failure.purchase_group);
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pawmarket_api::ClientError;
    use pawmarket_core::{
        CartItem, ProductId, PurchaseGroupId, VendorId, VendorOrderResult,
    };

    use super::*;

    fn result(order_id: i64, vendor: i64) -> VendorOrderResult {
        VendorOrderResult {
            order_id,
            vendor_id: VendorId(vendor),
            payment_status: "pending".to_owned(),
            payment_method: "webpay".to_owned(),
            discount_applied: 0,
            store_name: String::new(),
        }
    }

    #[test]
    fn confirmation_lists_orders_and_totals() {
        let confirmation = Confirmation {
            purchase_group: PurchaseGroupId::generate(),
            results: vec![result(1001, 1), result(1002, 2)],
            totals: CheckoutTotals::new(25_000, 0, 2_990),
            delivery_method: DeliveryMethod::Pickup,
            coupon: None,
            address: None,
            shipping_note: None,
            placed_at: Utc::now(),
        };

        let text = render_confirmation(&confirmation);
        assert!(text.contains("Order #1001"));
        assert!(text.contains("Order #1002"));
        assert!(text.contains("$27.990"));
        assert!(text.contains("Pickup"));
    }

    #[test]
    fn partial_failure_includes_accepted_orders_and_support_hint() {
        let failure = PartialFailure {
            purchase_group: PurchaseGroupId::generate(),
            accepted: vec![result(1001, 1)],
            failed_vendor: Some(VendorId(2)),
            cause: SubmissionFailure::Service(ClientError::Api {
                status: 409,
                code: "OUT_OF_STOCK".to_owned(),
                message: "Sin stock".to_owned(),
            }),
            not_attempted: vec![VendorId(3)],
        };

        let text = render_partial_failure(&failure);
        assert!(text.contains("vendor 2 could not be placed: Sin stock"));
        assert!(text.contains("Order #1001"));
        assert!(text.contains("vendors 3"));
        assert!(text.contains(SUPPORT_HINT));
    }

    #[test]
    fn failure_without_accepted_orders_skips_support_hint() {
        let failure = PartialFailure {
            purchase_group: PurchaseGroupId::generate(),
            accepted: vec![],
            failed_vendor: Some(VendorId(1)),
            cause: SubmissionFailure::DeadlineExceeded,
            not_attempted: vec![],
        };
        let text = render_partial_failure(&failure);
        assert!(text.contains("No orders were placed"));
        assert!(!text.contains(SUPPORT_HINT));
    }

    #[test]
    fn cart_shows_inapplicable_coupon() {
        let mut cart = Cart::new();
        cart.add_item(CartItem::new(ProductId(1), "Collar", 5_000)).unwrap();
        cart.apply_coupon(pawmarket_core::AppliedCoupon {
            code: "BIG".to_owned(),
            discount: pawmarket_core::DiscountDescriptor::Amount(1_000),
            scope: pawmarket_core::CouponScope::Unrestricted,
            minimum_subtotal: 50_000,
        });
        let text = render_cart(&cart);
        assert!(text.contains("Coupon BIG: does not apply"));
        assert!(text.contains("$5.000"));
    }

    #[test]
    fn empty_cart_message() {
        assert_eq!(render_cart(&Cart::new()), "Your cart is empty.\n");
    }
}
