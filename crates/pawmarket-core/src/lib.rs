pub mod address;
pub mod app_config;
pub mod cart;
pub mod config;
pub mod coupon;
pub mod geo;
pub mod ids;
pub mod money;
pub mod order;

use thiserror::Error;

pub use address::{AddressSuggestion, DwellingType, ShippingAddress};
pub use app_config::{AppConfig, Environment};
pub use cart::{Cart, CartItem, MAX_QUANTITY_PER_ITEM};
pub use config::{load_app_config, load_app_config_from_env};
pub use coupon::{AppliedCoupon, CouponScope, DiscountDescriptor};
pub use geo::{distance_km, round_for_display, GeoPoint, EARTH_RADIUS_KM};
pub use ids::{ProductId, PurchaseGroupId, VendorId};
pub use money::format_clp;
pub use order::{
    CheckoutTotals, DeliveryMethod, OrderLine, VendorOrderRequest, VendorOrderResult,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised by cart mutations. None of them leave the cart modified.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("quantity {quantity} for product {product_id} exceeds the limit of {limit}")]
    QuantityExceedsLimit {
        product_id: ProductId,
        quantity: i64,
        limit: u32,
    },

    #[error("product {product_id} has a negative unit price ({unit_price})")]
    NegativePrice { product_id: ProductId, unit_price: i64 },

    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),
}
