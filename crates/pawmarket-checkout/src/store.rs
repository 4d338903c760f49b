//! Client-side cart persistence as a JSON document on disk.

use std::path::{Path, PathBuf};

use pawmarket_core::Cart;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Key every stored cart is written under. Documents with another key are
/// ignored rather than migrated.
pub const CART_NAMESPACE: &str = "pawmarket.cart.v1";

#[derive(Debug, Serialize, Deserialize)]
struct StoredCart {
    namespace: String,
    cart: Cart,
}

#[derive(Debug, Clone)]
pub struct CartStore {
    path: PathBuf,
}

impl CartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored cart, applied coupon included.
    ///
    /// A missing file or a document written under another namespace loads
    /// as an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Format`] if it is not a valid cart document.
    pub async fn load(&self) -> Result<Cart, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Cart::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let stored: StoredCart =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Format {
                path: self.path.clone(),
                source,
            })?;
        if stored.namespace != CART_NAMESPACE {
            tracing::warn!(
                path = %self.path.display(),
                namespace = %stored.namespace,
                "ignoring cart stored under a different namespace"
            );
            return Ok(Cart::new());
        }
        Ok(stored.cart)
    }

    /// Writes `cart`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on any filesystem failure.
    pub async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let stored = StoredCart {
            namespace: CART_NAMESPACE.to_owned(),
            cart: cart.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        // Write-then-rename so a crash never leaves a truncated cart behind.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), items = cart.items().len(), "cart saved");
        Ok(())
    }
}
