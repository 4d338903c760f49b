//! In-memory marketplace double implementing every port.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pawmarket_api::{ClientError, ProductDetail};
use pawmarket_core::{
    AddressSuggestion, AppliedCoupon, ProductId, VendorId, VendorOrderRequest, VendorOrderResult,
};

use crate::ports::{AddressSuggester, CouponService, DeliveryFeeQuoter, OrderService, ProductCatalog};

#[derive(Debug, Default)]
struct FakeState {
    products: HashMap<ProductId, Option<VendorId>>,
    fee: Option<i64>,
    fee_delay: Option<Duration>,
    order_delay: Option<Duration>,
    coupons: HashMap<String, Result<AppliedCoupon, (String, String)>>,
    failing_vendors: HashSet<VendorId>,
    suggestions: Option<Vec<AddressSuggestion>>,
    product_calls: usize,
    fee_calls: usize,
    coupon_calls: usize,
    orders: Vec<VendorOrderRequest>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMarketplace {
    state: Arc<Mutex<FakeState>>,
}

fn api_error(status: u16, code: &str, message: &str) -> ClientError {
    ClientError::Api {
        status,
        code: code.to_owned(),
        message: message.to_owned(),
    }
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product_id: i64, vendor_id: Option<i64>) -> Self {
        self.state
            .lock()
            .unwrap()
            .products
            .insert(ProductId(product_id), vendor_id.map(VendorId));
        self
    }

    pub fn with_fee(self, fee: i64) -> Self {
        self.state.lock().unwrap().fee = Some(fee);
        self
    }

    pub fn with_fee_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().fee_delay = Some(delay);
        self
    }

    pub fn with_order_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().order_delay = Some(delay);
        self
    }

    pub fn with_coupon(self, coupon: AppliedCoupon) -> Self {
        self.state
            .lock()
            .unwrap()
            .coupons
            .insert(coupon.code.clone(), Ok(coupon));
        self
    }

    pub fn with_coupon_rejection(self, code: &str, api_code: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .coupons
            .insert(code.to_owned(), Err((api_code.to_owned(), message.to_owned())));
        self
    }

    pub fn with_failing_vendor(self, vendor_id: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_vendors
            .insert(VendorId(vendor_id));
        self
    }

    pub fn with_suggestions(self, suggestions: Vec<AddressSuggestion>) -> Self {
        self.state.lock().unwrap().suggestions = Some(suggestions);
        self
    }

    pub fn product_calls(&self) -> usize {
        self.state.lock().unwrap().product_calls
    }

    pub fn fee_calls(&self) -> usize {
        self.state.lock().unwrap().fee_calls
    }

    pub fn coupon_calls(&self) -> usize {
        self.state.lock().unwrap().coupon_calls
    }

    pub fn orders(&self) -> Vec<VendorOrderRequest> {
        self.state.lock().unwrap().orders.clone()
    }
}

impl ProductCatalog for FakeMarketplace {
    async fn get_product(&self, product_id: ProductId) -> Result<ProductDetail, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.product_calls += 1;
        match state.products.get(&product_id) {
            Some(vendor_id) => Ok(ProductDetail {
                id: product_id,
                vendor_id: *vendor_id,
                price: 1_000,
                name: format!("product {product_id}"),
                image_url: None,
                store_name: None,
            }),
            None => Err(api_error(404, "NOT_FOUND", "product not found")),
        }
    }
}

impl DeliveryFeeQuoter for FakeMarketplace {
    async fn quote_delivery_fee(&self, _distance_km: f64) -> Result<i64, ClientError> {
        let (fee, delay) = {
            let mut state = self.state.lock().unwrap();
            state.fee_calls += 1;
            (state.fee, state.fee_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        fee.ok_or_else(|| api_error(503, "UNAVAILABLE", "fee service down"))
    }
}

impl CouponService for FakeMarketplace {
    async fn validate_coupon(
        &self,
        code: &str,
        _vendor_ids: &[VendorId],
        _subtotal: i64,
    ) -> Result<AppliedCoupon, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.coupon_calls += 1;
        match state.coupons.get(code) {
            Some(Ok(coupon)) => Ok(coupon.clone()),
            Some(Err((api_code, message))) => Err(api_error(422, api_code, message)),
            None => Err(api_error(404, "INVALID_CODE", "El cupón no existe")),
        }
    }
}

impl OrderService for FakeMarketplace {
    async fn create_order(
        &self,
        request: &VendorOrderRequest,
    ) -> Result<VendorOrderResult, ClientError> {
        let delay = self.state.lock().unwrap().order_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state.orders.push(request.clone());
        if state.failing_vendors.contains(&request.vendor_id) {
            return Err(api_error(409, "OUT_OF_STOCK", "Sin stock para uno de los productos"));
        }
        let order_id = i64::try_from(state.orders.len()).unwrap() + 1000;
        Ok(VendorOrderResult {
            order_id,
            vendor_id: request.vendor_id,
            payment_status: "pending".to_owned(),
            payment_method: request.payment_method.clone(),
            discount_applied: 0,
            store_name: format!("Tienda {}", request.vendor_id),
        })
    }
}

impl AddressSuggester for FakeMarketplace {
    async fn suggest_addresses(
        &self,
        _query: &str,
        _region: Option<&str>,
        _comuna: Option<&str>,
    ) -> Result<Vec<AddressSuggestion>, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .suggestions
            .clone()
            .ok_or_else(|| api_error(503, "UNAVAILABLE", "geocoder down"))
    }
}
