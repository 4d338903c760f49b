//! Checkout orchestration: vendor resolution, partitioning, purchase-group
//! minting and sequential per-vendor order submission.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use pawmarket_api::ClientError;
use pawmarket_core::{
    round_for_display, AppConfig, AppliedCoupon, Cart, CartItem, CheckoutTotals, DeliveryMethod,
    OrderLine, ProductId, PurchaseGroupId, ShippingAddress, VendorId, VendorOrderRequest,
    VendorOrderResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::cancel::CancelSignal;
use crate::error::CheckoutError;
use crate::ports::{DeliveryFeeQuoter, OrderService, ProductCatalog};
use crate::session::CheckoutSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    Idle,
    ResolvingVendors,
    /// Submitting order `current` of `total` (1-based).
    Submitting {
        current: usize,
        total: usize,
    },
    Completed,
    PartiallyFailed,
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Lower-cased identities allowed to check out without a payment method.
    pub exempt_emails: Vec<String>,
    /// Payment method forced onto every order placed by an exempt identity.
    pub exempt_payment_method: String,
    /// Upper bound on each individual collaborator call.
    pub call_deadline: Duration,
}

impl CheckoutSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            exempt_emails: config.exempt_emails.clone(),
            exempt_payment_method: config.exempt_payment_method.clone(),
            call_deadline: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn is_exempt(&self, email: Option<&str>) -> bool {
        let Some(email) = email.map(|e| e.trim().to_lowercase()) else {
            return false;
        };
        !email.is_empty() && self.exempt_emails.iter().any(|e| *e == email)
    }
}

/// Shopper input for one checkout attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Identity of the shopper; only consulted for the payment exemption.
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Totals preview shown before the shopper confirms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutQuote {
    pub totals: CheckoutTotals,
    /// Rounded for display; the fee itself is priced on full precision.
    pub distance_km: Option<f64>,
    /// Set when the shipping fee is a fallback rather than a quote.
    pub shipping_note: Option<String>,
}

/// Result of a checkout in which every vendor order was accepted.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub purchase_group: PurchaseGroupId,
    /// One entry per vendor, in submission order.
    pub results: Vec<VendorOrderResult>,
    /// Totals as computed at submission time.
    pub totals: CheckoutTotals,
    pub delivery_method: DeliveryMethod,
    pub coupon: Option<AppliedCoupon>,
    /// Delivery destination; `None` for pickup.
    pub address: Option<ShippingAddress>,
    pub shipping_note: Option<String>,
    pub placed_at: DateTime<Utc>,
}

impl Confirmation {
    /// Sum of the discounts the order service actually applied.
    #[must_use]
    pub fn discount_applied(&self) -> i64 {
        self.results.iter().map(|r| r.discount_applied).sum()
    }
}

#[derive(Debug, Error)]
pub enum SubmissionFailure {
    #[error(transparent)]
    Service(#[from] ClientError),

    #[error("the order service did not answer in time; the order may still have been created")]
    DeadlineExceeded,

    #[error("checkout was cancelled before all orders were placed")]
    Cancelled,
}

/// Submission stopped before every vendor order was accepted.
///
/// Accepted orders stay valid server-side; nothing is rolled back.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct PartialFailure {
    pub purchase_group: PurchaseGroupId,
    pub accepted: Vec<VendorOrderResult>,
    /// Vendor whose order failed; `None` when the attempt was cancelled
    /// between submissions.
    pub failed_vendor: Option<VendorId>,
    pub cause: SubmissionFailure,
    /// Vendors whose orders were never sent.
    pub not_attempted: Vec<VendorId>,
}

/// Drives one shopper's checkout against the marketplace collaborators.
///
/// State transitions are published on a `watch` channel so front ends can
/// render progress while a checkout is in flight.
#[derive(Debug)]
pub struct CheckoutOrchestrator<S> {
    services: S,
    settings: CheckoutSettings,
    state: watch::Sender<CheckoutState>,
}

impl<S> CheckoutOrchestrator<S>
where
    S: ProductCatalog + DeliveryFeeQuoter + OrderService,
{
    pub fn new(services: S, settings: CheckoutSettings) -> Self {
        let (state, _rx) = watch::channel(CheckoutState::Idle);
        Self {
            services,
            settings,
            state,
        }
    }

    #[must_use]
    pub fn services(&self) -> &S {
        &self.services
    }

    #[must_use]
    pub fn state(&self) -> CheckoutState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Totals for the session's cart with the given delivery choice.
    pub async fn quote(
        &self,
        session: &CheckoutSession,
        method: DeliveryMethod,
        address: Option<&ShippingAddress>,
    ) -> CheckoutQuote {
        let cart = session.cart.snapshot().await;
        let shipping = session
            .fees
            .resolve_for_address(&self.services, method, cart.subtotal(), address)
            .await;
        let distance_km = match method {
            DeliveryMethod::Delivery => address
                .and_then(|a| a.location)
                .map(|loc| round_for_display(session.fees.policy().origin.distance_km_to(&loc))),
            DeliveryMethod::Pickup => None,
        };
        CheckoutQuote {
            totals: cart.totals(shipping.get()),
            distance_km,
            shipping_note: shipping.reason().map(str::to_owned),
        }
    }

    /// Places one order per vendor for the session's cart.
    ///
    /// On success the ordered lines and coupon leave the cart and a
    /// [`Confirmation`] is returned; anything added while the orders were in
    /// flight stays. The cart is left intact on every error.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InProgress`] while another checkout holds the
    ///   same session.
    /// - [`CheckoutError::EmptyCart`], [`CheckoutError::IncompleteAddress`]
    ///   and [`CheckoutError::MissingPaymentMethod`] before any network call.
    /// - [`CheckoutError::Submission`] when an order was rejected, timed out,
    ///   or the attempt was cancelled; carries the orders already accepted.
    pub async fn checkout(
        &self,
        session: &CheckoutSession,
        request: CheckoutRequest,
        cancel: &CancelSignal,
    ) -> Result<Confirmation, CheckoutError> {
        let Ok(_in_checkout) = session.begin_checkout() else {
            tracing::warn!("checkout already in progress for this session");
            return Err(CheckoutError::InProgress);
        };
        self.state.send_replace(CheckoutState::Idle);

        let mut cart = session.cart.snapshot().await;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = match request.delivery_method {
            DeliveryMethod::Delivery => Some(
                request
                    .address
                    .clone()
                    .filter(ShippingAddress::is_complete)
                    .ok_or(CheckoutError::IncompleteAddress)?,
            ),
            DeliveryMethod::Pickup => None,
        };
        let payment_method = self.payment_method(&request)?;

        self.state.send_replace(CheckoutState::ResolvingVendors);
        let resolved = self.resolve_vendors(cart.items()).await;
        {
            let mut shared = session.cart.lock().await;
            for (product_id, vendor_id) in &resolved {
                if !vendor_id.is_unassigned() {
                    cart.assign_vendor(*product_id, *vendor_id);
                    shared.assign_vendor(*product_id, *vendor_id);
                }
            }
        }

        let shipping = session
            .fees
            .resolve_for_address(
                &self.services,
                request.delivery_method,
                cart.subtotal(),
                address.as_ref(),
            )
            .await;
        let totals = cart.totals(shipping.get());

        let purchase_group = PurchaseGroupId::generate();
        let mut template = VendorOrderRequest {
            vendor_id: VendorId::UNASSIGNED,
            items: Vec::new(),
            subtotal: 0,
            delivery_method: request.delivery_method,
            delivery_fee: totals.shipping,
            region: String::new(),
            comuna: String::new(),
            street: String::new(),
            unit: String::new(),
            dwelling_type: None,
            coupon_code: cart.coupon().map(|c| c.code.clone()),
            payment_method,
            purchase_group,
        };
        template.set_address(address.as_ref());
        let requests = vendor_requests(&cart, &resolved, &template);

        tracing::info!(
            purchase_group = %purchase_group,
            vendors = requests.len(),
            subtotal = totals.subtotal,
            shipping = totals.shipping,
            "submitting vendor orders"
        );

        match self.submit(&requests, cancel).await {
            Ok(results) => {
                session.cart.lock().await.remove_ordered(&cart);
                self.state.send_replace(CheckoutState::Completed);
                tracing::info!(
                    purchase_group = %purchase_group,
                    orders = results.len(),
                    "checkout completed"
                );
                Ok(Confirmation {
                    purchase_group,
                    results,
                    totals,
                    delivery_method: request.delivery_method,
                    coupon: cart.coupon().cloned(),
                    address,
                    shipping_note: shipping.reason().map(str::to_owned),
                    placed_at: Utc::now(),
                })
            }
            Err(failure) => {
                self.state.send_replace(CheckoutState::PartiallyFailed);
                Err(CheckoutError::Submission(Box::new(failure)))
            }
        }
    }

    fn payment_method(&self, request: &CheckoutRequest) -> Result<String, CheckoutError> {
        if self.settings.is_exempt(request.customer_email.as_deref()) {
            return Ok(self.settings.exempt_payment_method.clone());
        }
        request
            .payment_method
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .ok_or(CheckoutError::MissingPaymentMethod)
    }

    /// Looks up vendors for items that lack one, concurrently. Lookups that
    /// fail or come back without a vendor resolve to [`VendorId::UNASSIGNED`].
    async fn resolve_vendors(&self, items: &[CartItem]) -> BTreeMap<ProductId, VendorId> {
        let lookups = items
            .iter()
            .filter(|item| item.vendor_id.is_none())
            .map(|item| async move {
                let outcome = tokio::time::timeout(
                    self.settings.call_deadline,
                    self.services.get_product(item.product_id),
                )
                .await;
                let vendor_id = match outcome {
                    Ok(Ok(detail)) => detail.vendor_id.unwrap_or_else(|| {
                        tracing::warn!(
                            product_id = %item.product_id,
                            "catalog has no vendor for product, leaving unassigned"
                        );
                        VendorId::UNASSIGNED
                    }),
                    Ok(Err(err)) => {
                        tracing::warn!(
                            product_id = %item.product_id,
                            error = %err,
                            "vendor lookup failed, leaving unassigned"
                        );
                        VendorId::UNASSIGNED
                    }
                    Err(_) => {
                        tracing::warn!(
                            product_id = %item.product_id,
                            "vendor lookup timed out, leaving unassigned"
                        );
                        VendorId::UNASSIGNED
                    }
                };
                (item.product_id, vendor_id)
            });

        join_all(lookups).await.into_iter().collect()
    }

    /// Sends the requests in order, stopping at the first failure.
    async fn submit(
        &self,
        requests: &[VendorOrderRequest],
        cancel: &CancelSignal,
    ) -> Result<Vec<VendorOrderResult>, PartialFailure> {
        let total = requests.len();
        let mut accepted = Vec::with_capacity(total);

        for (index, request) in requests.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    purchase_group = %request.purchase_group,
                    accepted = accepted.len(),
                    "checkout cancelled between vendor submissions"
                );
                return Err(PartialFailure {
                    purchase_group: request.purchase_group,
                    accepted,
                    failed_vendor: None,
                    cause: SubmissionFailure::Cancelled,
                    not_attempted: requests[index..].iter().map(|r| r.vendor_id).collect(),
                });
            }

            self.state.send_replace(CheckoutState::Submitting {
                current: index + 1,
                total,
            });

            let outcome = tokio::time::timeout(
                self.settings.call_deadline,
                self.services.create_order(request),
            )
            .await;
            let cause = match outcome {
                Ok(Ok(result)) => {
                    tracing::info!(
                        vendor_id = %request.vendor_id,
                        order_id = result.order_id,
                        step = index + 1,
                        total,
                        "vendor order accepted"
                    );
                    accepted.push(result);
                    continue;
                }
                Ok(Err(err)) => SubmissionFailure::Service(err),
                Err(_) => SubmissionFailure::DeadlineExceeded,
            };

            tracing::error!(
                vendor_id = %request.vendor_id,
                purchase_group = %request.purchase_group,
                accepted = accepted.len(),
                error = %cause,
                "vendor order failed, aborting remaining submissions"
            );
            return Err(PartialFailure {
                purchase_group: request.purchase_group,
                accepted,
                failed_vendor: Some(request.vendor_id),
                cause,
                not_attempted: requests[index + 1..].iter().map(|r| r.vendor_id).collect(),
            });
        }

        Ok(accepted)
    }
}

/// Groups the cart's lines by vendor. Items without a known vendor fall into
/// the [`VendorId::UNASSIGNED`] bucket.
#[must_use]
pub fn partition_by_vendor(
    items: &[CartItem],
    resolved: &BTreeMap<ProductId, VendorId>,
) -> BTreeMap<VendorId, Vec<OrderLine>> {
    let mut groups: BTreeMap<VendorId, Vec<OrderLine>> = BTreeMap::new();
    for item in items {
        let vendor_id = item
            .vendor_id
            .or_else(|| resolved.get(&item.product_id).copied())
            .unwrap_or(VendorId::UNASSIGNED);
        groups.entry(vendor_id).or_default().push(OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }
    groups
}

/// One request per vendor, each a copy of `template` with that vendor's lines
/// and subtotal. Shipping and coupon are carried over unchanged.
fn vendor_requests(
    cart: &Cart,
    resolved: &BTreeMap<ProductId, VendorId>,
    template: &VendorOrderRequest,
) -> Vec<VendorOrderRequest> {
    partition_by_vendor(cart.items(), resolved)
        .into_iter()
        .map(|(vendor_id, items)| {
            let subtotal = items.iter().map(OrderLine::line_total).sum();
            VendorOrderRequest {
                vendor_id,
                items,
                subtotal,
                ..template.clone()
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
