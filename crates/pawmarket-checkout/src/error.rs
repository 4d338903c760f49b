use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::PartialFailure;

/// Reasons a checkout attempt did not complete.
///
/// Precondition failures and [`CheckoutError::InProgress`] are raised before
/// any network call and leave the cart untouched.
/// [`CheckoutError::Submission`] means at least one order request was sent;
/// the cart is still intact.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("the cart is empty")]
    EmptyCart,

    #[error("delivery requires a complete address (region, comuna and street)")]
    IncompleteAddress,

    #[error("select a payment method to continue")]
    MissingPaymentMethod,

    #[error("a checkout for this cart is already in progress")]
    InProgress,

    #[error("{0}")]
    Submission(Box<PartialFailure>),
}

impl CheckoutError {
    /// Stable machine-readable code, used by the HTTP surface.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::IncompleteAddress => "incomplete_address",
            CheckoutError::MissingPaymentMethod => "missing_payment_method",
            CheckoutError::InProgress => "checkout_in_progress",
            CheckoutError::Submission(_) => "order_submission_failed",
        }
    }

    #[must_use]
    pub fn partial_failure(&self) -> Option<&PartialFailure> {
        match self {
            CheckoutError::Submission(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access cart file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cart file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
