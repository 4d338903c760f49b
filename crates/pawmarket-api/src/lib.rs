//! HTTP client for the marketplace commerce API: product lookup, delivery-fee
//! quotes, coupon validation, order creation and address suggestions.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::MarketplaceClient;
pub use error::ClientError;
pub use types::ProductDetail;
