//! Wire types for the commerce API. Successful responses wrap their payload
//! in `{"data": ...}`; failures answer `{"error": {"code", "message"}}`.

use pawmarket_core::{ProductId, VendorId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Authoritative product record from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub id: ProductId,
    /// Missing when the catalog has no seller on file for the product.
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    pub price: i64,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeeQuoteRequest {
    pub distance_km: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeeQuote {
    pub fee: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CouponValidationRequest<'a> {
    pub code: &'a str,
    pub vendor_ids: &'a [VendorId],
    pub subtotal: i64,
}
