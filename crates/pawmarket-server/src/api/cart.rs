//! Cart and coupon handlers. Every route here operates on the caller's
//! session cart.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use pawmarket_checkout::{CouponRejection, CouponValidator, RejectionKind};
use pawmarket_core::{AppliedCoupon, Cart, CartError, CartItem, ProductId};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::session::SessionId;

use super::{map_client_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateQuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ApplyCouponRequest {
    pub code: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(in crate::api) struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub subtotal: i64,
    /// Client-side estimate; the order service decides the final discount.
    pub discount: i64,
    pub coupon: Option<AppliedCoupon>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            item_count: cart.total_item_count(),
            subtotal: cart.subtotal(),
            discount: cart.discount_amount(),
            coupon: cart.coupon().cloned(),
        }
    }
}

fn map_cart_error(request_id: &str, error: &CartError) -> ApiError {
    match error {
        CartError::ItemNotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        _ => ApiError::new(request_id, "validation_error", error.to_string()),
    }
}

fn map_coupon_rejection(request_id: &str, rejection: &CouponRejection) -> ApiError {
    let code = match rejection.kind {
        RejectionKind::InvalidCode => "invalid_coupon",
        RejectionKind::NotApplicable => "coupon_not_applicable",
        RejectionKind::BelowMinimum => "coupon_below_minimum",
        RejectionKind::Expired => "coupon_expired",
        RejectionKind::Unavailable => "upstream_unavailable",
    };
    ApiError::new(request_id, code, rejection.message.clone())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/cart
pub(in crate::api) async fn get_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
) -> Json<ApiResponse<CartView>> {
    let session = state.sessions.get_or_create(&session_id).await;
    let view = CartView::from(&*session.cart.lock().await);
    Json(ApiResponse::new(view, req_id.0))
}

/// DELETE /api/v1/cart: empty the cart and drop the coupon.
pub(in crate::api) async fn clear_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
) -> Json<ApiResponse<CartView>> {
    let session = state.sessions.get_or_create(&session_id).await;
    let mut cart = session.cart.lock().await;
    cart.clear();
    let view = CartView::from(&*cart);
    drop(cart);
    session.fees.invalidate().await;
    Json(ApiResponse::new(view, req_id.0))
}

/// POST /api/v1/cart/items: look up the product and add it to the cart.
pub(in crate::api) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartView>>), ApiError> {
    let rid = &req_id.0;
    if body.quantity == 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "quantity must be at least 1",
        ));
    }

    let detail = state
        .client
        .get_product(body.product_id)
        .await
        .map_err(|e| map_client_error(rid.clone(), &e))?;

    let mut item =
        CartItem::new(detail.id, detail.name, detail.price).with_quantity(body.quantity);
    item.vendor_id = detail.vendor_id;
    item.image_url = detail.image_url;
    item.store_name = detail.store_name;

    let session = state.sessions.get_or_create(&session_id).await;
    let mut cart = session.cart.lock().await;
    cart.add_item(item).map_err(|e| map_cart_error(rid, &e))?;
    let view = CartView::from(&*cart);
    drop(cart);

    tracing::info!(
        session = %session_id.0,
        product_id = %body.product_id,
        quantity = body.quantity,
        "item added to cart"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(view, req_id.0))))
}

/// PATCH /api/v1/cart/items/:product_id: set the quantity of a line.
pub(in crate::api) async fn update_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Path(product_id): Path<i64>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let session = state.sessions.get_or_create(&session_id).await;
    let mut cart = session.cart.lock().await;
    cart.update_quantity(ProductId(product_id), body.quantity)
        .map_err(|e| map_cart_error(&req_id.0, &e))?;
    let view = CartView::from(&*cart);
    drop(cart);
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// DELETE /api/v1/cart/items/:product_id
pub(in crate::api) async fn remove_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let product_id = ProductId(product_id);
    let session = state.sessions.get_or_create(&session_id).await;
    let mut cart = session.cart.lock().await;
    if !cart.remove_item(product_id) {
        return Err(map_cart_error(
            &req_id.0,
            &CartError::ItemNotFound(product_id),
        ));
    }
    let view = CartView::from(&*cart);
    drop(cart);
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// POST /api/v1/cart/coupon: validate a code and apply it, replacing any
/// previous coupon.
pub(in crate::api) async fn apply_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Json(body): Json<ApplyCouponRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let session = state.sessions.get_or_create(&session_id).await;
    let validator = CouponValidator::new(state.call_deadline());

    let coupon = validator
        .apply(&state.client, &session.cart, &body.code)
        .await
        .map_err(|rejection| {
            tracing::info!(
                session = %session_id.0,
                kind = ?rejection.kind,
                "coupon rejected"
            );
            map_coupon_rejection(&req_id.0, &rejection)
        })?;
    tracing::info!(session = %session_id.0, code = %coupon.code, "coupon applied");

    let view = CartView::from(&*session.cart.lock().await);
    Ok(Json(ApiResponse::new(view, req_id.0)))
}

/// DELETE /api/v1/cart/coupon
pub(in crate::api) async fn remove_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
) -> Json<ApiResponse<CartView>> {
    let session = state.sessions.get_or_create(&session_id).await;
    let mut cart = session.cart.lock().await;
    cart.clear_coupon();
    let view = CartView::from(&*cart);
    drop(cart);
    Json(ApiResponse::new(view, req_id.0))
}
