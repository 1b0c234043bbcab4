//! Order service implementation

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::NaiveDate;

use crate::{
    errors::{MarketError, MarketResult},
    implementation::{
        cart_system::CustomerId,
        inventory::InventoryGateway,
        payment::PaymentMethod,
    },
    types::catalog::RestaurantId,
};

use super::super::types::{
    basic_types::{Actor, ActorRole, CourierId, OrderId, OrderNumber, OrderStatus, PaymentStatus},
    main_order_types::Order,
    service_types::{CancellationEffects, OrderFilter, OrderService, RatingCommand},
};

impl OrderService {
    /// Creates a new order service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders:         Arc::new(Mutex::new(HashMap::new())),
            by_customer:    Arc::new(Mutex::new(HashMap::new())),
            by_restaurant:  Arc::new(Mutex::new(HashMap::new())),
            daily_sequence: Arc::new(Mutex::new((NaiveDate::MIN, 0))),
        }
    }

    /// Issues the next order number for the given day.
    ///
    /// The counter lives behind its own lock and resets when the date
    /// changes, so concurrent checkouts never see the same number.
    pub fn next_order_number(&self, today: NaiveDate) -> MarketResult<OrderNumber> {
        let mut sequence = self.daily_sequence.lock().map_err(|_| MarketError::Lock)?;

        if sequence.0 != today {
            *sequence = (today, 0);
        }
        sequence.1 += 1;

        Ok(OrderNumber::compose(today, sequence.1))
    }

    /// Stores a freshly created order. Checkout-only.
    pub(crate) fn insert_order(&self, order: Order) -> MarketResult<()> {
        let mut orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        let mut by_customer = self.by_customer.lock().map_err(|_| MarketError::Lock)?;
        let mut by_restaurant = self.by_restaurant.lock().map_err(|_| MarketError::Lock)?;

        by_customer
            .entry(order.customer_id.clone())
            .or_default()
            .push(order.id.clone());
        by_restaurant
            .entry(order.restaurant_id.clone())
            .or_default()
            .push(order.id.clone());

        tracing::info!(order = %order.number, customer = %order.customer_id, "order persisted");
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    /// Gets an order by ID.
    pub fn order(&self, id: &OrderId) -> MarketResult<Order> {
        let orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        orders
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::OrderNotFound(id.to_string()))
    }

    /// A customer's orders, most recent first.
    pub fn customer_orders(&self, customer_id: &CustomerId) -> MarketResult<Vec<Order>> {
        let orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        let by_customer = self.by_customer.lock().map_err(|_| MarketError::Lock)?;

        let ids = by_customer.get(customer_id).cloned().unwrap_or_default();
        let mut result: Vec<Order> = ids.iter().filter_map(|id| orders.get(id).cloned()).collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    /// A restaurant's orders matching a filter, most recent first.
    pub fn restaurant_orders(
        &self, restaurant_id: &RestaurantId, filter: &OrderFilter,
    ) -> MarketResult<Vec<Order>> {
        let orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        let by_restaurant = self.by_restaurant.lock().map_err(|_| MarketError::Lock)?;

        let ids = by_restaurant.get(restaurant_id).cloned().unwrap_or_default();
        let mut result: Vec<Order> = ids
            .iter()
            .filter_map(|id| orders.get(id))
            .filter(|o| Self::matches_filter(o, filter))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    /// The courier pool: ready-for-pickup orders nobody claimed yet,
    /// oldest first.
    pub fn available_for_courier(&self) -> MarketResult<Vec<Order>> {
        let orders = self.orders.lock().map_err(|_| MarketError::Lock)?;

        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| o.status == OrderStatus::ReadyForPickup && o.courier_id.is_none())
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    /// Orders assigned to a courier, most recent first.
    pub fn courier_orders(&self, courier_id: &CourierId) -> MarketResult<Vec<Order>> {
        let orders = self.orders.lock().map_err(|_| MarketError::Lock)?;

        let mut result: Vec<Order> = orders
            .values()
            .filter(|o| o.courier_id.as_ref() == Some(courier_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    /// Applies a status transition under the orders lock.
    pub fn transition(
        &self, order_id: &OrderId, next: OrderStatus, actor: &Actor, note: Option<String>,
    ) -> MarketResult<Order> {
        self.with_order(order_id, |order| order.apply_transition(next, actor, note))
    }

    /// Claims a ready-for-pickup order for a courier.
    ///
    /// First writer wins: the check and the write happen in one step under
    /// the lock, so of two concurrent claims exactly one succeeds and the
    /// loser gets `AlreadyClaimed`.
    pub fn claim(&self, order_id: &OrderId, actor: &Actor) -> MarketResult<Order> {
        if actor.role != ActorRole::Courier {
            return Err(MarketError::Validation(format!(
                "only couriers claim orders, got {}",
                actor.role
            )));
        }

        self.with_order(order_id, |order| {
            if order.status.is_terminal() {
                return Err(MarketError::OrderClosed(order_id.to_string()));
            }
            if order.courier_id.is_some() {
                return Err(MarketError::AlreadyClaimed(order_id.to_string()));
            }
            if order.status != OrderStatus::ReadyForPickup {
                return Err(MarketError::InvalidTransition {
                    from: order.status,
                    to:   OrderStatus::OutForDelivery,
                    role: actor.role,
                });
            }

            order.courier_id = Some(CourierId::new(actor.id.clone()));
            order.apply_transition(OrderStatus::OutForDelivery, actor, None)
        })
    }

    /// Cancels an order and runs the cancellation side effects: reserved
    /// stock is restored through the inventory gateway, and a captured
    /// card charge is flipped to refunded.
    ///
    /// The status flip and refund marking are atomic under the lock; the
    /// gateway restores run after it is released.
    pub async fn cancel_order(
        &self, inventory: &dyn InventoryGateway, order_id: &OrderId, actor: &Actor,
        note: Option<String>,
    ) -> MarketResult<Order> {
        let effects = self.begin_cancellation(order_id, actor, note)?;

        for reservation in &effects.reservations {
            inventory
                .restore_stock(&reservation.product_id, reservation.quantity)
                .await?;
        }
        if !effects.reservations.is_empty() {
            tracing::info!(
                order = %order_id,
                products = effects.reservations.len(),
                "restored reserved stock after cancellation"
            );
        }

        self.order(order_id)
    }

    /// Records a captured charge on an order. Checkout-only.
    pub(crate) fn record_payment_success(
        &self, order_id: &OrderId, actor: &Actor, reference: &str,
    ) -> MarketResult<Order> {
        self.with_order(order_id, |order| {
            order.mark_payment_completed(actor, reference);
            Ok(())
        })
    }

    /// Records a failed charge on an order. The order stays alive —
    /// a failed card charge produces a cancellable, retryable order, not
    /// a lost cart. Checkout-only.
    pub(crate) fn record_payment_failure(
        &self, order_id: &OrderId, actor: &Actor, reason: &str,
    ) -> MarketResult<Order> {
        self.with_order(order_id, |order| {
            order.mark_payment_failed(actor, reason);
            Ok(())
        })
    }

    /// Stores a customer rating and returns the updated order.
    pub fn rate(
        &self, order_id: &OrderId, actor: &Actor, command: &RatingCommand,
    ) -> MarketResult<Order> {
        self.with_order(order_id, |order| order.set_rating(actor, command))
    }

    /// Flips status to cancelled and collects the side effects owed,
    /// all in one step under the lock.
    fn begin_cancellation(
        &self, order_id: &OrderId, actor: &Actor, note: Option<String>,
    ) -> MarketResult<CancellationEffects> {
        let mut orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| MarketError::OrderNotFound(order_id.to_string()))?;

        order.apply_transition(OrderStatus::Cancelled, actor, note)?;

        let refunded = order.payment_method == PaymentMethod::Card
            && order.payment_status == PaymentStatus::Completed;
        if refunded {
            order.payment_status = PaymentStatus::Refunded;
            order.append_note(actor, "card charge refunded");
            tracing::warn!(order = %order.number, "captured charge refunded on cancellation");
        }

        Ok(CancellationEffects {
            reservations: order.reservations.clone(),
            refunded,
        })
    }

    /// Runs a mutation on one order under the lock and returns the updated
    /// copy. The closure's error leaves the order untouched only if the
    /// closure itself mutated nothing before failing — aggregate methods
    /// keep that contract by validating before writing.
    fn with_order<F>(&self, order_id: &OrderId, f: F) -> MarketResult<Order>
    where
        F: FnOnce(&mut Order) -> MarketResult<()>,
    {
        let mut orders = self.orders.lock().map_err(|_| MarketError::Lock)?;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| MarketError::OrderNotFound(order_id.to_string()))?;

        f(order)?;
        Ok(order.clone())
    }

    fn matches_filter(order: &Order, filter: &OrderFilter) -> bool {
        if filter.status.is_some_and(|s| order.status != s) {
            return false;
        }
        if filter.payment_status.is_some_and(|s| order.payment_status != s) {
            return false;
        }
        if filter.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if filter.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        true
    }
}

impl Default for OrderService {
    fn default() -> Self {
        Self::new()
    }
}
