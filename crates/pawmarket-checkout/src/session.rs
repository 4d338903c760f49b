use std::sync::Arc;

use pawmarket_core::Cart;
use tokio::sync::{Mutex, MutexGuard, TryLockError};

use crate::shipping::{ShippingFeeResolver, ShippingPolicy};

/// Cart shared between user actions and the orchestrator's post-checkout settle.
#[derive(Debug, Clone, Default)]
pub struct SharedCart {
    inner: Arc<Mutex<Cart>>,
}

impl SharedCart {
    #[must_use]
    pub fn new(cart: Cart) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cart)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Cart> {
        self.inner.lock().await
    }

    /// Point-in-time copy of the cart.
    pub async fn snapshot(&self) -> Cart {
        self.inner.lock().await.clone()
    }
}

/// One shopper's checkout context: their cart plus the shipping quote cache
/// that belongs to it.
#[derive(Debug)]
pub struct CheckoutSession {
    pub cart: SharedCart,
    pub fees: ShippingFeeResolver,
    /// Held for the whole of a checkout attempt; at most one per session.
    in_checkout: Mutex<()>,
}

impl CheckoutSession {
    #[must_use]
    pub fn new(cart: Cart, policy: ShippingPolicy) -> Self {
        Self {
            cart: SharedCart::new(cart),
            fees: ShippingFeeResolver::new(policy),
            in_checkout: Mutex::new(()),
        }
    }

    /// Claims the session for a checkout attempt. Returns `Err` while another
    /// attempt holds it; the claim ends when the guard is dropped.
    pub(crate) fn begin_checkout(&self) -> Result<MutexGuard<'_, ()>, TryLockError> {
        self.in_checkout.try_lock()
    }
}
