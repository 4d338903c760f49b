//! Contracts for the external collaborators checkout depends on.
//!
//! Each trait mirrors one commerce API call. [`MarketplaceClient`] implements
//! all of them; tests substitute in-memory doubles.

use std::future::Future;

use pawmarket_api::{ClientError, MarketplaceClient, ProductDetail};
use pawmarket_core::{
    AddressSuggestion, AppliedCoupon, ProductId, VendorId, VendorOrderRequest, VendorOrderResult,
};

pub trait ProductCatalog: Send + Sync {
    fn get_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<ProductDetail, ClientError>> + Send;
}

pub trait DeliveryFeeQuoter: Send + Sync {
    fn quote_delivery_fee(
        &self,
        distance_km: f64,
    ) -> impl Future<Output = Result<i64, ClientError>> + Send;
}

pub trait CouponService: Send + Sync {
    fn validate_coupon(
        &self,
        code: &str,
        vendor_ids: &[VendorId],
        subtotal: i64,
    ) -> impl Future<Output = Result<AppliedCoupon, ClientError>> + Send;
}

pub trait OrderService: Send + Sync {
    fn create_order(
        &self,
        request: &VendorOrderRequest,
    ) -> impl Future<Output = Result<VendorOrderResult, ClientError>> + Send;
}

pub trait AddressSuggester: Send + Sync {
    fn suggest_addresses(
        &self,
        query: &str,
        region: Option<&str>,
        comuna: Option<&str>,
    ) -> impl Future<Output = Result<Vec<AddressSuggestion>, ClientError>> + Send;
}

impl ProductCatalog for MarketplaceClient {
    fn get_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<ProductDetail, ClientError>> + Send {
        MarketplaceClient::get_product(self, product_id)
    }
}

impl DeliveryFeeQuoter for MarketplaceClient {
    fn quote_delivery_fee(
        &self,
        distance_km: f64,
    ) -> impl Future<Output = Result<i64, ClientError>> + Send {
        MarketplaceClient::quote_delivery_fee(self, distance_km)
    }
}

impl CouponService for MarketplaceClient {
    fn validate_coupon(
        &self,
        code: &str,
        vendor_ids: &[VendorId],
        subtotal: i64,
    ) -> impl Future<Output = Result<AppliedCoupon, ClientError>> + Send {
        MarketplaceClient::validate_coupon(self, code, vendor_ids, subtotal)
    }
}

impl OrderService for MarketplaceClient {
    fn create_order(
        &self,
        request: &VendorOrderRequest,
    ) -> impl Future<Output = Result<VendorOrderResult, ClientError>> + Send {
        MarketplaceClient::create_order(self, request)
    }
}

impl AddressSuggester for MarketplaceClient {
    fn suggest_addresses(
        &self,
        query: &str,
        region: Option<&str>,
        comuna: Option<&str>,
    ) -> impl Future<Output = Result<Vec<AddressSuggestion>, ClientError>> + Send {
        MarketplaceClient::suggest_addresses(self, query, region, comuna)
    }
}
