//! Multi-vendor checkout: shipping fee resolution, coupon validation, vendor
//! partitioning and sequential per-vendor order submission.
//!
//! Collaborators are reached through the traits in [`ports`]; the production
//! implementation is [`pawmarket_api::MarketplaceClient`].

pub mod address;
pub mod cancel;
pub mod coupon;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod presenter;
pub mod resolution;
pub mod session;
pub mod shipping;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use address::suggest_addresses;
pub use cancel::CancelSignal;
pub use coupon::{CouponRejection, CouponValidator, RejectionKind};
pub use error::{CheckoutError, StoreError};
pub use orchestrator::{
    partition_by_vendor, CheckoutOrchestrator, CheckoutQuote, CheckoutRequest, CheckoutSettings,
    CheckoutState, Confirmation, PartialFailure, SubmissionFailure,
};
pub use ports::{AddressSuggester, CouponService, DeliveryFeeQuoter, OrderService, ProductCatalog};
pub use resolution::Resolution;
pub use session::{CheckoutSession, SharedCart};
pub use shipping::{ShippingFeeResolver, ShippingPolicy};
pub use store::{CartStore, CART_NAMESPACE};
