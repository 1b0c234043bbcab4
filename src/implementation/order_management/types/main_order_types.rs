//! The Order aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    implementation::{cart_system::CustomerId, payment::PaymentMethod},
    types::catalog::RestaurantId,
};

use super::{
    basic_types::{CourierId, OrderId, OrderNumber, OrderStatus, PaymentStatus},
    order_types::{
        AvailabilityValidation, DeliveryDetails, OrderItem, OrderRating, StockReservation,
        TrackingEntry,
    },
};

/// Order money block. Mirrors the cart pricing it was frozen from, except
/// that dropped items have already been subtracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of surviving line totals.
    pub subtotal_cents:     u64,
    /// Delivery fee.
    pub delivery_fee_cents: u64,
    /// Service fee.
    pub service_fee_cents:  u64,
    /// Discounts applied.
    pub discount_cents:     u64,
    /// Grand total.
    pub total_cents:        u64,
}

impl OrderTotals {
    /// Whether the totals reconcile with a set of line items. An order is
    /// never allowed to be silently out of balance with its own item list.
    #[must_use]
    pub fn reconciles_with(&self, items: &[OrderItem]) -> bool {
        let item_sum: u64 = items.iter().map(|i| i.total_cents).sum();
        self.subtotal_cents == item_sum
            && self.total_cents
                == (self.subtotal_cents + self.delivery_fee_cents + self.service_fee_cents)
                    .saturating_sub(self.discount_cents)
    }
}

/// Immutable record of a committed purchase.
///
/// Only the status machine fields, the tracking log, the payment fields,
/// and the rating block ever change after creation; everything else is
/// frozen by the checkout transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order ID.
    pub id:             OrderId,
    /// Human-readable order number.
    pub number:         OrderNumber,
    /// Ordering customer.
    pub customer_id:    CustomerId,
    /// Fulfilling partner.
    pub restaurant_id:  RestaurantId,
    /// Courier, set by the winning claim.
    pub courier_id:     Option<CourierId>,
    /// Frozen line items.
    pub items:          Vec<OrderItem>,
    /// Availability check record from order creation.
    pub availability:   AvailabilityValidation,
    /// Money block.
    pub totals:         OrderTotals,
    /// Destination and contact.
    pub delivery:       DeliveryDetails,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Payment progress.
    pub payment_status: PaymentStatus,
    /// Gateway transaction reference, when a charge succeeded.
    pub payment_ref:    Option<String>,
    /// Current status — cached projection of the tracking log's last entry.
    pub status:         OrderStatus,
    /// Append-only tracking log; the canonical audit trail.
    pub tracking:       Vec<TrackingEntry>,
    /// Customer rating, written at most once after delivery.
    pub rating:         Option<OrderRating>,
    /// Stock consumed at checkout, restored on cancellation.
    pub reservations:   Vec<StockReservation>,
    /// Mutation counter.
    pub version:        u64,
    /// Creation timestamp.
    pub created_at:     DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at:     DateTime<Utc>,
}
