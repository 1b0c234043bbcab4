//! Service types for order management

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    implementation::cart_system::CustomerId,
    types::catalog::RestaurantId,
};

use super::basic_types::{CourierId, OrderId, OrderStatus, PaymentStatus};
use super::main_order_types::Order;
use super::order_types::OrderRating;

/// Order management service.
///
/// All mutations run their read-modify-write cycle under the orders lock,
/// so no two mutations of the same order interleave. The daily sequence
/// for order numbers lives behind its own lock and resets at UTC midnight.
#[derive(Debug)]
pub struct OrderService {
    /// Orders indexed by ID.
    pub(crate) orders:         Arc<Mutex<HashMap<OrderId, Order>>>,
    /// Orders indexed by customer.
    pub(crate) by_customer:    Arc<Mutex<HashMap<CustomerId, Vec<OrderId>>>>,
    /// Orders indexed by restaurant.
    pub(crate) by_restaurant:  Arc<Mutex<HashMap<RestaurantId, Vec<OrderId>>>>,
    /// (date, last sequence) pair behind the day's order numbers.
    pub(crate) daily_sequence: Arc<Mutex<(NaiveDate, u32)>>,
}

/// Closed filter for partner order listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    /// Filter by order status.
    pub status:         Option<OrderStatus>,
    /// Filter by payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Created at or after.
    pub created_from:   Option<DateTime<Utc>>,
    /// Created at or before.
    pub created_to:     Option<DateTime<Utc>>,
}

/// Rating submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingCommand {
    /// Partner rating, 1–5.
    pub partner_rating: u8,
    /// Courier rating, 1–5.
    pub courier_rating: Option<u8>,
    /// Free-text comment.
    pub comment:        Option<String>,
}

/// Side effects a cancellation owes the outside world, collected while the
/// order lock was held and executed after it is released.
#[derive(Debug, Clone)]
pub struct CancellationEffects {
    /// Stock to restore, one entry per reserved product.
    pub reservations: Vec<super::order_types::StockReservation>,
    /// Whether a captured card charge was flipped to refunded.
    pub refunded:     bool,
}

/// Collaborator receiving confirmed ratings for aggregate recomputation.
///
/// Profile aggregates (a partner's average, a courier's average) live
/// outside this core; this is the seam they listen on.
pub trait RatingSink: Send + Sync {
    /// Called once per successfully stored rating.
    fn record(&self, restaurant_id: &RestaurantId, courier_id: Option<&CourierId>, rating: &OrderRating);
}

/// Rating sink that only logs. The default wiring when no profile service
/// is attached.
#[derive(Debug, Default)]
pub struct NullRatingSink;

impl RatingSink for NullRatingSink {
    fn record(
        &self, restaurant_id: &RestaurantId, courier_id: Option<&CourierId>, rating: &OrderRating,
    ) {
        tracing::debug!(
            restaurant = %restaurant_id,
            courier = courier_id.map(|c| c.to_string()),
            partner_rating = rating.partner_rating,
            "rating recorded without profile sink"
        );
    }
}
