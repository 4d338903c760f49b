//! HTTP client for the marketplace commerce API.
//!
//! Wraps `reqwest` with base-URL handling, optional bearer auth, envelope
//! decoding and typed error bodies. Idempotent calls are retried with
//! back-off; order creation is sent exactly once.

use std::time::Duration;

use pawmarket_core::{
    AddressSuggestion, AppConfig, AppliedCoupon, ProductId, VendorId, VendorOrderRequest,
    VendorOrderResult,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::retry::retry_with_backoff;
use crate::types::{
    CouponValidationRequest, DataEnvelope, ErrorEnvelope, FeeQuote, FeeQuoteRequest,
    ProductDetail,
};

const USER_AGENT: &str = "pawmarket/0.1 (storefront-checkout)";

/// Client for the marketplace commerce API.
///
/// Every request carries the client-wide timeout, so no call can hang a
/// checkout indefinitely.
#[derive(Clone)]
pub struct MarketplaceClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for MarketplaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl MarketplaceClient {
    /// Creates a client for `base_url` with no auth and no retries.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()?;

        // Trailing slash so `Url::join` appends to the base path instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            token: None,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Same as [`MarketplaceClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        let client = Self::new(&config.api_base_url, config.request_timeout_secs)?
            .with_retry(config.max_retries, config.retry_backoff_base_ms);
        Ok(match &config.api_token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Fetches the authoritative catalog record for a product.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the API rejects the lookup (e.g. unknown product).
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Deserialize`] if the body does not match [`ProductDetail`].
    pub async fn get_product(&self, product_id: ProductId) -> Result<ProductDetail, ClientError> {
        let url = self.endpoint(&format!("products/{product_id}"))?;
        let context = format!("product {product_id}");
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.get(url.clone()), &context)
        })
        .await
    }

    /// Asks the delivery-fee service for the price of a delivery over
    /// `distance_km`. Returns the fee in minor currency units.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; callers are expected to fall back to a flat fee.
    pub async fn quote_delivery_fee(&self, distance_km: f64) -> Result<i64, ClientError> {
        let url = self.endpoint("delivery-fees/quote")?;
        let body = FeeQuoteRequest { distance_km };
        let quote: FeeQuote = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.post(url.clone()).json(&body), "delivery fee quote")
        })
        .await?;
        if quote.fee < 0 {
            return Err(ClientError::UnexpectedStatus {
                status: 200,
                context: format!("delivery fee quote returned negative fee {}", quote.fee),
            });
        }
        Ok(quote.fee)
    }

    /// Validates a coupon code against the cart's vendors and subtotal.
    ///
    /// `code` is sent as given; normalisation is the caller's job.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] carrying the service's rejection code and message.
    /// - [`ClientError::Http`] / [`ClientError::Deserialize`] on transport or
    ///   shape failures.
    pub async fn validate_coupon(
        &self,
        code: &str,
        vendor_ids: &[VendorId],
        subtotal: i64,
    ) -> Result<AppliedCoupon, ClientError> {
        let url = self.endpoint("coupons/validate")?;
        let body = CouponValidationRequest {
            code,
            vendor_ids,
            subtotal,
        };
        let context = format!("coupon {code}");
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.post(url.clone()).json(&body), &context)
        })
        .await
    }

    /// Creates one vendor order. Never retried.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; [`ClientError::Api`] messages are user-facing.
    pub async fn create_order(
        &self,
        request: &VendorOrderRequest,
    ) -> Result<VendorOrderResult, ClientError> {
        let url = self.endpoint("orders")?;
        let context = format!("order for vendor {}", request.vendor_id);
        let mut result: VendorOrderResult = self
            .send_json(self.client.post(url).json(request), &context)
            .await?;
        if result.vendor_id.is_unassigned() {
            result.vendor_id = request.vendor_id;
        }
        Ok(result)
    }

    /// Free-text address suggestions, optionally scoped to a region and comuna.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`]; callers treat failures as "no suggestions".
    pub async fn suggest_addresses(
        &self,
        query: &str,
        region: Option<&str>,
        comuna: Option<&str>,
    ) -> Result<Vec<AddressSuggestion>, ClientError> {
        let mut url = self.endpoint("addresses/suggest")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(region) = region {
                pairs.append_pair("region", region);
            }
            if let Some(comuna) = comuna {
                pairs.append_pair("comuna", comuna);
            }
        }
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_json(self.client.get(url.clone()), "address suggestions")
        })
        .await
    }

    /// Resolves `path` against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Sends the request, maps non-2xx answers to typed errors, and unwraps
    /// the `{"data": ...}` envelope.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ClientError> {
        let mut request = request.header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &body, context));
        }

        let envelope: DataEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: context.to_owned(),
                source: e,
            })?;
        Ok(envelope.data)
    }

    fn error_from_body(status: u16, body: &str, context: &str) -> ClientError {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ClientError::Api {
                status,
                message: if envelope.error.message.is_empty() {
                    envelope.error.code.clone()
                } else {
                    envelope.error.message
                },
                code: envelope.error.code,
            },
            Err(_) => ClientError::UnexpectedStatus {
                status,
                context: context.to_owned(),
            },
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
