mod cart;
mod checkout;
mod shipping;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pawmarket_api::{ClientError, MarketplaceClient};
use pawmarket_checkout::{CheckoutOrchestrator, CheckoutSettings, ShippingPolicy};
use pawmarket_core::AppConfig;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};
use crate::session::{SessionRegistry, SESSION_HEADER};

/// Carts untouched for this long are dropped from memory.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Clone)]
pub struct AppState {
    pub client: MarketplaceClient,
    pub config: Arc<AppConfig>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error when the configured API base URL is invalid.
    pub fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let client = MarketplaceClient::from_config(&config)?;
        let sessions = SessionRegistry::new(ShippingPolicy::from_config(&config), SESSION_IDLE_TTL);
        Ok(Self {
            client,
            config,
            sessions,
        })
    }

    pub(super) fn call_deadline(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    pub(super) fn orchestrator(&self) -> CheckoutOrchestrator<MarketplaceClient> {
        CheckoutOrchestrator::new(
            self.client.clone(),
            CheckoutSettings::from_config(&self.config),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Structured context for errors a client has to act on, such as the
    /// orders already placed when checkout stops part-way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" | "missing_session" | "empty_cart"
            | "incomplete_address" | "missing_payment_method" => StatusCode::BAD_REQUEST,
            "invalid_coupon" | "coupon_not_applicable" | "coupon_below_minimum"
            | "coupon_expired" => StatusCode::UNPROCESSABLE_ENTITY,
            "conflict" | "checkout_in_progress" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" | "order_submission_failed" => StatusCode::BAD_GATEWAY,
            "upstream_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a marketplace API failure onto the storefront error envelope.
///
/// Client-side rejections keep the service's own message; everything else is
/// reported as an upstream problem without leaking transport details.
pub(super) fn map_client_error(request_id: String, error: &ClientError) -> ApiError {
    match error {
        ClientError::Api {
            status: 404,
            message,
            ..
        } => ApiError::new(request_id, "not_found", message.clone()),
        ClientError::Api {
            status: 409,
            message,
            ..
        } => ApiError::new(request_id, "conflict", message.clone()),
        ClientError::Api {
            status, message, ..
        } if *status < 500 => ApiError::new(request_id, "validation_error", message.clone()),
        ClientError::Http(e) if e.is_timeout() || e.is_connect() => {
            tracing::warn!(error = %error, "marketplace API unreachable");
            ApiError::new(
                request_id,
                "upstream_unavailable",
                "the marketplace service is unavailable, try again later",
            )
        }
        _ => {
            tracing::error!(error = %error, "marketplace API call failed");
            ApiError::new(
                request_id,
                "upstream_error",
                "the marketplace service returned an unexpected response",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SESSION_HEADER),
        ])
}

fn storefront_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route(
            "/api/v1/cart/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/api/v1/cart/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
        .route("/api/v1/shipping/quote", post(shipping::quote))
        .route("/api/v1/addresses/suggest", get(shipping::suggest))
        .route("/api/v1/checkout", post(checkout::place_orders))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        )))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(storefront_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::new(HealthData { status: "ok" }, req_id.0))
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
