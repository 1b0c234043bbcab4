//! Core type definitions for the cart system

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{catalog::RestaurantId, geo::GeoPoint};

/// Unique cart identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartId(pub Cow<'static, str>);

impl CartId {
    /// Creates a new cart ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a cart ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Generates a new unique cart ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Cow::Owned(format!("cart-{}", uuid::Uuid::new_v4())))
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cart line item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub Cow<'static, str>);

impl CartItemId {
    /// Creates a new item ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Generates a new unique item ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Cow::Owned(format!("item-{}", uuid::Uuid::new_v4())))
    }
}

impl std::fmt::Display for CartItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Cow<'static, str>);

impl CustomerId {
    /// Creates a new customer ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a customer ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anonymous browsing session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Cow<'static, str>);

impl SessionId {
    /// Creates a new session ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Generates a new unique session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Cow::Owned(format!("session-{}", uuid::Uuid::new_v4())))
    }
}

/// Cart status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CartStatus {
    /// Cart is active and can be modified.
    #[default]
    Active,
    /// Cart has been converted to an order.
    Converted,
    /// Cart expired without an order.
    Abandoned,
}

/// Restaurant data copied into the cart at creation time.
///
/// Later edits to the live restaurant do not change an in-progress cart;
/// the customer keeps the fee and minimum they started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSnapshot {
    /// Restaurant ID.
    pub id:                      RestaurantId,
    /// Name at cart creation.
    pub name:                    String,
    /// Category at cart creation.
    pub category:                String,
    /// Pickup location.
    pub location:                GeoPoint,
    /// Base delivery fee in cents.
    pub base_delivery_fee_cents: u64,
    /// Minimum order subtotal in cents.
    pub minimum_order_cents:     u64,
}

/// Option chosen on a line item: a frozen copy of the schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option group ID.
    pub group_id:    Cow<'static, str>,
    /// Group display name at add-time.
    pub group_name:  Cow<'static, str>,
    /// Option ID within the group.
    pub option_id:   Cow<'static, str>,
    /// Option display name at add-time.
    pub option_name: Cow<'static, str>,
    /// Price delta in cents at add-time.
    pub price_cents: u64,
}

/// Option selection as submitted by the caller; resolved against the
/// product's live option schema before it becomes a [`SelectedOption`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSelection {
    /// Option group ID.
    pub group_id:  String,
    /// Option ID within the group.
    pub option_id: String,
}

/// Delivery destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Street and house number.
    pub street:      String,
    /// City.
    pub city:        String,
    /// Postal code, the primary zone lookup key.
    pub postal_code: String,
    /// Already-resolved coordinates of the address.
    pub coordinates: GeoPoint,
}

/// Priced delivery offer stored on the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartDeliveryQuote {
    /// Destination the quote was made for.
    pub address:     DeliveryAddress,
    /// Zone that priced the delivery.
    pub zone_number: u32,
    /// Restaurant-to-destination distance in km.
    pub distance_km: f64,
    /// Quoted fee in cents.
    pub fee_cents:   u64,
    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
    /// When the quote was computed.
    pub quoted_at:   DateTime<Utc>,
}

/// Command to add a product to a cart.
///
/// Option selections not present in the product's live schema are silently
/// dropped rather than failing the call. That leniency is inherited
/// behavior, kept deliberately; flag it to testers as a policy choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemCommand {
    /// Product to add.
    pub product_id:      crate::types::catalog::ProductId,
    /// Quantity, at least 1.
    pub quantity:        u32,
    /// Requested option selections.
    pub options:         Vec<OptionSelection>,
    /// Free-text request, length-bounded by config.
    pub special_request: Option<String>,
}

/// Command to modify an existing line item. Absent fields are left as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemCommand {
    /// New quantity.
    pub quantity:        Option<u32>,
    /// Replacement option selections.
    pub options:         Option<Vec<OptionSelection>>,
    /// Replacement special request.
    pub special_request: Option<String>,
}

