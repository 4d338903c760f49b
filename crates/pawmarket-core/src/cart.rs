//! Cart aggregate: line items, quantities and the applied coupon, with totals
//! always derived from current contents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::coupon::AppliedCoupon;
use crate::ids::{ProductId, VendorId};
use crate::order::CheckoutTotals;
use crate::CartError;

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price in minor currency units.
    pub unit_price: i64,
    pub quantity: u32,
    /// Seller of the product. May stay `None` until checkout resolves it.
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
}

impl CartItem {
    /// A single unit of `product_id` with no vendor or display extras.
    #[must_use]
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: i64) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity: 1,
            vendor_id: None,
            image_url: None,
            store_name: None,
        }
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn with_vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(default)]
    coupon: Option<AppliedCoupon>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `item`, or increments the quantity of the line already holding
    /// the same product.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `item.quantity` is zero.
    /// - [`CartError::NegativePrice`] if the unit price is below zero.
    /// - [`CartError::QuantityExceedsLimit`] if the resulting quantity would
    ///   exceed [`MAX_QUANTITY_PER_ITEM`].
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity(0));
        }
        if item.unit_price < 0 {
            return Err(CartError::NegativePrice {
                product_id: item.product_id,
                unit_price: item.unit_price,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            let quantity = existing.quantity.saturating_add(item.quantity);
            if quantity > MAX_QUANTITY_PER_ITEM {
                return Err(CartError::QuantityExceedsLimit {
                    product_id: item.product_id,
                    quantity: i64::from(quantity),
                    limit: MAX_QUANTITY_PER_ITEM,
                });
            }
            existing.quantity = quantity;
            if existing.vendor_id.is_none() {
                existing.vendor_id = item.vendor_id;
            }
            return Ok(());
        }

        if item.quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CartError::QuantityExceedsLimit {
                product_id: item.product_id,
                quantity: i64::from(item.quantity),
                limit: MAX_QUANTITY_PER_ITEM,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Sets the quantity of a line. `quantity <= 0` removes the line.
    ///
    /// Returns whether the cart changed, so repeating the same call is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CartError::QuantityExceedsLimit`] above [`MAX_QUANTITY_PER_ITEM`].
    /// - [`CartError::ItemNotFound`] when setting a positive quantity on a
    ///   product that is not in the cart.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool, CartError> {
        if quantity <= 0 {
            return Ok(self.remove_item(product_id));
        }

        let limit_error = || CartError::QuantityExceedsLimit {
            product_id,
            quantity,
            limit: MAX_QUANTITY_PER_ITEM,
        };
        let quantity = u32::try_from(quantity).map_err(|_| limit_error())?;
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(limit_error());
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;
        if item.quantity == quantity {
            return Ok(false);
        }
        item.quantity = quantity;
        Ok(true)
    }

    /// Removes a line. Returns `false` if the product was not in the cart.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Empties the cart and drops the applied coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
    }

    /// Takes the lines of `ordered` out of the cart after they were placed.
    ///
    /// Each line loses the ordered quantity and disappears at zero; lines
    /// added since `ordered` was taken stay. The coupon is dropped only if it
    /// is still the one that was ordered with.
    pub fn remove_ordered(&mut self, ordered: &Cart) {
        for placed in &ordered.items {
            if let Some(item) = self
                .items
                .iter_mut()
                .find(|i| i.product_id == placed.product_id)
            {
                item.quantity = item.quantity.saturating_sub(placed.quantity);
            }
        }
        self.items.retain(|i| i.quantity > 0);

        let same_coupon = match (&self.coupon, &ordered.coupon) {
            (Some(current), Some(placed)) => current.code == placed.code,
            _ => false,
        };
        if same_coupon {
            self.coupon = None;
        }
    }

    /// Records the vendor discovered for a product. Returns `false` if the
    /// product is not in the cart.
    pub fn assign_vendor(&mut self, product_id: ProductId, vendor_id: VendorId) -> bool {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.vendor_id = Some(vendor_id);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(0i64, i64::saturating_add)
    }

    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.items
            .iter()
            .map(|i| i.quantity)
            .fold(0u32, u32::saturating_add)
    }

    /// Discount from the applied coupon, or `0` without one or when the
    /// coupon does not apply to the current contents.
    #[must_use]
    pub fn discount_amount(&self) -> i64 {
        self.coupon
            .as_ref()
            .map_or(0, |coupon| coupon.discount_for(&self.items))
    }

    #[must_use]
    pub fn totals(&self, shipping: i64) -> CheckoutTotals {
        CheckoutTotals::new(self.subtotal(), self.discount_amount(), shipping)
    }

    /// Vendor ids already known for the cart's items.
    #[must_use]
    pub fn vendor_ids(&self) -> BTreeSet<VendorId> {
        self.items.iter().filter_map(|i| i.vendor_id).collect()
    }

    #[must_use]
    pub fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Applies `coupon`, returning the one it replaced.
    pub fn apply_coupon(&mut self, coupon: AppliedCoupon) -> Option<AppliedCoupon> {
        self.coupon.replace(coupon)
    }

    pub fn clear_coupon(&mut self) -> Option<AppliedCoupon> {
        self.coupon.take()
    }
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod tests;
