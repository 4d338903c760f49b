//! Shipping quote and delivery-address suggestion handlers.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pawmarket_checkout::{suggest_addresses, CheckoutQuote};
use pawmarket_core::{round_for_display, AddressSuggestion, DeliveryMethod, ShippingAddress};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::session::SessionId;

use super::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct QuoteRequest {
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    pub address: Option<ShippingAddress>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SuggestQuery {
    pub q: String,
    pub region: Option<String>,
    pub comuna: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SuggestionItem {
    #[serde(flatten)]
    pub suggestion: AddressSuggestion,
    /// Distance from the dispatch origin, rounded to one decimal.
    pub distance_km: f64,
}

/// POST /api/v1/shipping/quote: totals for the session cart with a delivery
/// choice. Never fails: an unreachable fee service yields the fallback fee
/// and a `shipping_note`.
pub(in crate::api) async fn quote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Json(body): Json<QuoteRequest>,
) -> Json<ApiResponse<CheckoutQuote>> {
    let session = state.sessions.get_or_create(&session_id).await;
    let quote = state
        .orchestrator()
        .quote(&session, body.delivery_method, body.address.as_ref())
        .await;
    Json(ApiResponse::new(quote, req_id.0))
}

/// GET /api/v1/addresses/suggest?q=&region=&comuna=
pub(in crate::api) async fn suggest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SuggestQuery>,
) -> Json<ApiResponse<Vec<SuggestionItem>>> {
    let origin = state.config.origin;
    let items = suggest_addresses(
        &state.client,
        &params.q,
        params.region.as_deref(),
        params.comuna.as_deref(),
        state.call_deadline(),
    )
    .await
    .into_iter()
    .map(|suggestion| SuggestionItem {
        distance_km: round_for_display(pawmarket_core::distance_km(
            origin.lat,
            origin.lon,
            suggestion.lat,
            suggestion.lon,
        )),
        suggestion,
    })
    .collect();

    Json(ApiResponse::new(items, req_id.0))
}
