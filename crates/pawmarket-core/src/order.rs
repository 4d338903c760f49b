use serde::{Deserialize, Serialize};

use crate::address::{DwellingType, ShippingAddress};
use crate::ids::{ProductId, PurchaseGroupId, VendorId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[default]
    Delivery,
    Pickup,
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMethod::Delivery => write!(f, "delivery"),
            DeliveryMethod::Pickup => write!(f, "pickup"),
        }
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delivery" => Ok(DeliveryMethod::Delivery),
            "pickup" => Ok(DeliveryMethod::Pickup),
            other => Err(format!("unknown delivery method '{other}'")),
        }
    }
}

/// Derived totals for a checkout. Never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTotals {
    pub subtotal: i64,
    pub discount: i64,
    pub shipping: i64,
    pub total: i64,
}

impl CheckoutTotals {
    /// Clamps discount into `[0, subtotal]` and shipping to `>= 0`; the total
    /// is floored at zero.
    #[must_use]
    pub fn new(subtotal: i64, discount: i64, shipping: i64) -> Self {
        let subtotal = subtotal.max(0);
        let discount = discount.clamp(0, subtotal);
        let shipping = shipping.max(0);
        let total = subtotal
            .saturating_sub(discount)
            .saturating_add(shipping)
            .max(0);
        Self {
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: i64,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

/// One order-creation request, scoped to a single vendor.
///
/// Delivery fee and coupon code are the same on every request of a checkout;
/// allocation across vendors is left to the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorOrderRequest {
    pub vendor_id: VendorId,
    pub items: Vec<OrderLine>,
    pub subtotal: i64,
    pub delivery_method: DeliveryMethod,
    pub delivery_fee: i64,
    pub region: String,
    pub comuna: String,
    pub street: String,
    pub unit: String,
    pub dwelling_type: Option<DwellingType>,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub purchase_group: PurchaseGroupId,
}

impl VendorOrderRequest {
    /// Copies the address fields in, or leaves them empty for pickup.
    pub fn set_address(&mut self, address: Option<&ShippingAddress>) {
        match (self.delivery_method, address) {
            (DeliveryMethod::Delivery, Some(addr)) => {
                self.region = addr.region.clone().unwrap_or_default();
                self.comuna = addr.comuna.clone().unwrap_or_default();
                self.street = addr.street.trim().to_string();
                self.unit = addr.unit.clone().unwrap_or_default();
                self.dwelling_type = Some(addr.dwelling_type);
            }
            _ => {
                self.region.clear();
                self.comuna.clear();
                self.street.clear();
                self.unit.clear();
                self.dwelling_type = None;
            }
        }
    }
}

/// Order service answer for one vendor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOrderResult {
    pub order_id: i64,
    #[serde(default)]
    pub vendor_id: VendorId,
    pub payment_status: String,
    pub payment_method: String,
    /// Discount the order service actually applied to this order.
    #[serde(default)]
    pub discount_applied: i64,
    #[serde(default)]
    pub store_name: String,
}
