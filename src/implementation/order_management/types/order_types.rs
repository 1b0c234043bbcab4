//! Order line items, availability record, tracking log, and ratings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    implementation::cart_system::{CartItem, DeliveryAddress, SelectedOption},
    types::catalog::{Price, ProductCategory, ProductId},
};

use super::basic_types::{ActorRole, OrderStatus};

// ============================================================================
// ORDER LINE ITEM
// ============================================================================

/// Line item on an order: a frozen copy of the cart item it came from.
///
/// Never recomputed from catalog state — the price the customer saw is the
/// price that stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line item ID (carried over from the cart).
    pub id:              String,
    /// Product ID.
    pub product_id:      ProductId,
    /// Product title at order time.
    pub title:           String,
    /// Unit price at add-time.
    pub unit_price:      Price,
    /// Image URL at add-time.
    pub image_url:       Option<String>,
    /// Product category at add-time.
    pub category:        ProductCategory,
    /// Selected options, frozen.
    pub options:         Vec<SelectedOption>,
    /// Quantity ordered.
    pub quantity:        u32,
    /// Free-text request passed to the kitchen.
    pub special_request: Option<String>,
    /// Frozen line total in cents.
    pub total_cents:     u64,
}

impl OrderItem {
    /// Freezes a cart item into an order line.
    #[must_use]
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            id:              item.id.to_string(),
            product_id:      item.product_id.clone(),
            title:           item.title.clone(),
            unit_price:      item.unit_price.clone(),
            image_url:       item.image_url.clone(),
            category:        item.category,
            options:         item.options.clone(),
            quantity:        item.quantity,
            special_request: item.special_request.clone(),
            total_cents:     item.total_cents(),
        }
    }
}

// ============================================================================
// AVAILABILITY VALIDATION
// ============================================================================

/// Why an item was dropped between cart-quote time and order time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// Product was deleted from the catalog.
    Deleted,
    /// Product was unpublished.
    Deactivated,
    /// Partner marked it unavailable.
    Unavailable,
}

/// Cart item dropped by the availability check at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedItem {
    /// Product that became unavailable.
    pub product_id: ProductId,
    /// Title as the customer saw it.
    pub title:      String,
    /// Quantity that was in the cart.
    pub quantity:   u32,
    /// Machine-readable reason.
    pub reason:     UnavailableReason,
}

/// Record of the availability check run during order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityValidation {
    /// When the live catalog was consulted.
    pub checked_at: DateTime<Utc>,
    /// Items dropped because they were no longer orderable.
    pub dropped:    Vec<DroppedItem>,
}

impl AvailabilityValidation {
    /// Whether every cart item survived the check.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

// ============================================================================
// TRACKING LOG
// ============================================================================

/// One entry in the append-only tracking log.
///
/// The log is the canonical audit trail; `Order::status` is derived from
/// its last entry, never the other way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Status at this point of the lifecycle.
    pub status:     OrderStatus,
    /// Actor that triggered the entry.
    pub actor_id:   String,
    /// Role of the actor.
    pub actor_role: ActorRole,
    /// Free-text note.
    pub note:       Option<String>,
    /// When the entry was appended.
    pub at:         DateTime<Utc>,
}

impl TrackingEntry {
    /// Creates an entry stamped now.
    #[must_use]
    pub fn new(
        status: OrderStatus, actor_id: impl Into<String>, actor_role: ActorRole,
        note: Option<String>,
    ) -> Self {
        Self {
            status,
            actor_id: actor_id.into(),
            actor_role,
            note,
            at: Utc::now(),
        }
    }
}

// ============================================================================
// RATING & STOCK
// ============================================================================

/// Rating left by the customer after delivery. Written at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRating {
    /// Partner rating, 1–5.
    pub partner_rating: u8,
    /// Courier rating, 1–5, when a courier delivered.
    pub courier_rating: Option<u8>,
    /// Free-text comment.
    pub comment:        Option<String>,
    /// When the rating was submitted.
    pub rated_at:       DateTime<Utc>,
}

/// Stock consumed by checkout for one product; restored on cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    /// Product whose stock was decremented.
    pub product_id: ProductId,
    /// Units taken.
    pub quantity:   u32,
}

/// Delivery destination and contact for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDetails {
    /// Destination address.
    pub address:       DeliveryAddress,
    /// Customer contact phone for the courier.
    pub contact_phone: String,
    /// ETA quoted at order time, minutes.
    pub eta_minutes:   Option<u32>,
}
