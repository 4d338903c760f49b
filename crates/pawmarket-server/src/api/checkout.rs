//! Checkout handler: one order per vendor for the session cart.

use axum::{extract::State, http::StatusCode, Extension, Json};
use pawmarket_checkout::presenter::SUPPORT_HINT;
use pawmarket_checkout::{CancelSignal, CheckoutError, CheckoutRequest, Confirmation};
use serde_json::json;

use crate::middleware::RequestId;
use crate::session::SessionId;

use super::{ApiError, ApiResponse, AppState};

/// Cancels the in-flight checkout when the handler future is dropped, which
/// happens when the client disconnects. The running submission finishes and
/// no further vendor orders are sent.
struct CancelOnDrop(CancelSignal);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

fn map_checkout_error(request_id: &str, error: &CheckoutError) -> ApiError {
    let api_error = ApiError::new(request_id, error.code(), error.to_string());
    let Some(failure) = error.partial_failure() else {
        return api_error;
    };

    api_error.with_details(json!({
        "purchase_group": failure.purchase_group,
        "accepted": failure.accepted,
        "failed_vendor": failure.failed_vendor,
        "not_attempted": failure.not_attempted,
        "support": SUPPORT_HINT,
    }))
}

/// POST /api/v1/checkout
pub(in crate::api) async fn place_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session_id: SessionId,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Confirmation>>), ApiError> {
    let rid = req_id.0;
    let session = state.sessions.get_or_create(&session_id).await;
    let orchestrator = state.orchestrator();

    let cancel = CancelSignal::new();
    let _cancel_on_drop = CancelOnDrop(cancel.clone());
    let task =
        tokio::spawn(async move { orchestrator.checkout(&session, body, &cancel).await });

    let outcome = task.await.map_err(|err| {
        tracing::error!(error = %err, "checkout task failed");
        ApiError::new(rid.clone(), "internal_error", "checkout failed unexpectedly")
    })?;

    match outcome {
        Ok(confirmation) => {
            tracing::info!(
                session = %session_id.0,
                purchase_group = %confirmation.purchase_group,
                orders = confirmation.results.len(),
                total = confirmation.totals.total,
                "checkout completed"
            );
            Ok((StatusCode::CREATED, Json(ApiResponse::new(confirmation, rid))))
        }
        Err(err) => {
            if let Some(failure) = err.partial_failure() {
                tracing::error!(
                    session = %session_id.0,
                    purchase_group = %failure.purchase_group,
                    accepted = failure.accepted.len(),
                    failed_vendor = ?failure.failed_vendor,
                    error = %err,
                    "checkout stopped part-way"
                );
            }
            Err(map_checkout_error(&rid, &err))
        }
    }
}
