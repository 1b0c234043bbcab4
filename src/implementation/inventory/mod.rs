//! Inventory gateway
//!
//! Stock lives outside the catalog: the catalog says what a product *is*,
//! the inventory gateway says how many units are on the shelf. Checkout
//! reserves stock through this interface; cancellation restores it.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    errors::{MarketError, MarketResult},
    types::catalog::ProductId,
};

/// External stock-keeping collaborator.
///
/// `decrement_stock` is a conditional atomic decrement: it fails with
/// `InsufficientStock` instead of going negative, and the failure triggers
/// checkout rollback. Implementations over a real store must make the
/// guard-and-decrement a single atomic operation, not a read-then-write.
#[async_trait]
pub trait InventoryGateway: Send + Sync {
    /// Atomically takes `quantity` units of a product, failing when fewer
    /// remain.
    async fn decrement_stock(&self, product_id: &ProductId, quantity: u32) -> MarketResult<()>;

    /// Returns units to the shelf (rollback or cancellation).
    async fn restore_stock(&self, product_id: &ProductId, quantity: u32) -> MarketResult<()>;
}

/// In-memory inventory, the reference implementation.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    /// On-hand units per product.
    levels: Arc<Mutex<HashMap<ProductId, u64>>>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the on-hand level for a product.
    pub fn set_stock(&self, product_id: ProductId, quantity: u64) -> MarketResult<()> {
        let mut levels = self.levels.lock().map_err(|_| MarketError::Lock)?;
        levels.insert(product_id, quantity);
        Ok(())
    }

    /// Current on-hand level; absent products count as zero.
    pub fn stock_level(&self, product_id: &ProductId) -> MarketResult<u64> {
        let levels = self.levels.lock().map_err(|_| MarketError::Lock)?;
        Ok(levels.get(product_id).copied().unwrap_or(0))
    }
}

#[async_trait]
impl InventoryGateway for InMemoryInventory {
    async fn decrement_stock(&self, product_id: &ProductId, quantity: u32) -> MarketResult<()> {
        let mut levels = self.levels.lock().map_err(|_| MarketError::Lock)?;
        let level = levels.entry(product_id.clone()).or_insert(0);

        if *level < u64::from(quantity) {
            return Err(MarketError::InsufficientStock {
                product_id: product_id.to_string(),
                requested:  quantity,
            });
        }

        *level -= u64::from(quantity);
        Ok(())
    }

    async fn restore_stock(&self, product_id: &ProductId, quantity: u32) -> MarketResult<()> {
        let mut levels = self.levels.lock().map_err(|_| MarketError::Lock)?;
        let level = levels.entry(product_id.clone()).or_insert(0);
        *level = level.saturating_add(u64::from(quantity));
        Ok(())
    }
}
