//! Cart line item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::catalog::{Price, Product, ProductCategory, ProductId};

use super::types::{CartItemId, OptionSelection, SelectedOption};

/// Line item in a cart.
///
/// Everything displayed or priced is a snapshot taken when the item was
/// added; catalog edits after that point do not leak in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Line item ID.
    pub id:              CartItemId,
    /// Product ID.
    pub product_id:      ProductId,
    /// Product title at add-time.
    pub title:           String,
    /// Unit price at add-time.
    pub unit_price:      Price,
    /// Image URL at add-time.
    pub image_url:       Option<String>,
    /// Product category at add-time.
    pub category:        ProductCategory,
    /// Selected options, frozen from the schema at add-time.
    pub options:         Vec<SelectedOption>,
    /// Quantity, at least 1.
    pub quantity:        u32,
    /// Free-text request passed to the kitchen.
    pub special_request: Option<String>,
    /// When the item was added.
    pub added_at:        DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at:      DateTime<Utc>,
}

impl CartItem {
    /// Creates a line item from a live product, snapshotting its pricing
    /// and the resolved option selections.
    #[must_use]
    pub fn from_product(
        product: &Product, quantity: u32, options: Vec<SelectedOption>,
        special_request: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: CartItemId::generate(),
            product_id: product.id.clone(),
            title: product.title.clone(),
            unit_price: product.price.clone(),
            image_url: product.image_url.clone(),
            category: product.category,
            options,
            quantity,
            special_request,
            added_at: now,
            updated_at: now,
        }
    }

    /// Resolves requested selections against a product's live option
    /// schema, snapshotting the matches.
    ///
    /// Selections naming an unknown group or option are dropped, not
    /// rejected.
    #[must_use]
    pub fn resolve_options(product: &Product, requested: &[OptionSelection]) -> Vec<SelectedOption> {
        requested
            .iter()
            .filter_map(|selection| {
                let group = product.option_group(&selection.group_id)?;
                let option = group.option(&selection.option_id)?;
                Some(SelectedOption {
                    group_id:    group.id.clone(),
                    group_name:  group.name.clone(),
                    option_id:   option.id.clone(),
                    option_name: option.name.clone(),
                    price_cents: option.price_cents,
                })
            })
            .collect()
    }

    /// Unit price plus the selected option deltas, in cents.
    #[must_use]
    pub fn unit_total_cents(&self) -> u64 {
        self.unit_price.amount_cents + self.options.iter().map(|o| o.price_cents).sum::<u64>()
    }

    /// Line total in cents.
    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.unit_total_cents() * u64::from(self.quantity)
    }

    /// Updates quantity.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.updated_at = Utc::now();
    }

    /// Replaces the selected options.
    pub fn set_options(&mut self, options: Vec<SelectedOption>) {
        self.options = options;
        self.updated_at = Utc::now();
    }

    /// Replaces the special request.
    pub fn set_special_request(&mut self, request: Option<String>) {
        self.special_request = request;
        self.updated_at = Utc::now();
    }
}
