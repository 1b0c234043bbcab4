//! Courier-facing order surface

use std::sync::Arc;

use crate::{
    errors::{MarketError, MarketResult},
    implementation::order_management::types::{
        Actor, ActorRole, CourierId, Order, OrderId, OrderService, OrderStatus,
    },
};

/// Read/command surface a courier gets over the claim pool and their own
/// deliveries.
pub struct CourierOrders {
    orders: Arc<OrderService>,
}

impl CourierOrders {
    /// Creates the view.
    #[must_use]
    pub fn new(orders: Arc<OrderService>) -> Self {
        Self { orders }
    }

    /// The claim pool: ready-for-pickup orders nobody owns yet, oldest
    /// first.
    pub fn available(&self, actor: &Actor) -> MarketResult<Vec<Order>> {
        Self::require_courier(actor)?;
        self.orders.available_for_courier()
    }

    /// Claims an order from the pool. First writer wins; losers receive
    /// `AlreadyClaimed` and should re-poll the pool rather than retry the
    /// same order.
    pub fn claim(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_courier(actor)?;
        self.orders.claim(order_id, actor)
    }

    /// Marks a delivery handed over to the customer.
    pub fn mark_delivered(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_courier(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .transition(order_id, OrderStatus::Delivered, actor, None)
    }

    /// The courier's claimed orders, most recent first.
    pub fn my_orders(&self, actor: &Actor) -> MarketResult<Vec<Order>> {
        Self::require_courier(actor)?;
        self.orders.courier_orders(&CourierId::new(actor.id.clone()))
    }

    fn own_order(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        let order = self.orders.order(order_id)?;
        if order.courier_id.as_ref().map(|c| c.to_string()) != Some(actor.id.clone()) {
            return Err(MarketError::OrderNotFound(order_id.to_string()));
        }
        Ok(order)
    }

    fn require_courier(actor: &Actor) -> MarketResult<()> {
        if actor.role != ActorRole::Courier {
            return Err(MarketError::Validation(format!(
                "courier surface called with role {}",
                actor.role
            )));
        }
        Ok(())
    }
}
