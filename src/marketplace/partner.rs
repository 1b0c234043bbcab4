//! Partner-facing order surface

use std::sync::Arc;

use crate::{
    errors::{MarketError, MarketResult},
    implementation::{
        inventory::InventoryGateway,
        order_management::types::{
            Actor, ActorRole, Order, OrderFilter, OrderId, OrderService, OrderStatus,
        },
    },
    types::catalog::RestaurantId,
};

/// Read/command surface a merchant partner gets over its incoming orders.
///
/// The actor's ID is the restaurant ID; every lookup is scoped to it.
pub struct PartnerOrders {
    orders:    Arc<OrderService>,
    inventory: Arc<dyn InventoryGateway>,
}

impl PartnerOrders {
    /// Creates the view.
    #[must_use]
    pub fn new(orders: Arc<OrderService>, inventory: Arc<dyn InventoryGateway>) -> Self {
        Self { orders, inventory }
    }

    /// The restaurant's orders matching a filter, most recent first.
    pub fn orders(&self, actor: &Actor, filter: &OrderFilter) -> MarketResult<Vec<Order>> {
        Self::require_partner(actor)?;
        self.orders
            .restaurant_orders(&RestaurantId::new(actor.id.clone()), filter)
    }

    /// Accepts a pending order.
    pub fn accept(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_partner(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .transition(order_id, OrderStatus::Accepted, actor, None)
    }

    /// Rejects a pending or accepted order, restoring any reserved stock
    /// and refunding a captured charge.
    pub async fn reject(
        &self, actor: &Actor, order_id: &OrderId, reason: impl Into<String>,
    ) -> MarketResult<Order> {
        Self::require_partner(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .cancel_order(self.inventory.as_ref(), order_id, actor, Some(reason.into()))
            .await
    }

    /// Moves an accepted order into preparation.
    pub fn start_preparing(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_partner(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .transition(order_id, OrderStatus::Preparing, actor, None)
    }

    /// Marks the order packed and ready for a courier, entering it into
    /// the claim pool.
    pub fn ready_for_pickup(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_partner(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .transition(order_id, OrderStatus::ReadyForPickup, actor, None)
    }

    fn own_order(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        let order = self.orders.order(order_id)?;
        if order.restaurant_id.as_str() != actor.id {
            return Err(MarketError::OrderNotFound(order_id.to_string()));
        }
        Ok(order)
    }

    fn require_partner(actor: &Actor) -> MarketResult<()> {
        if actor.role != ActorRole::Partner {
            return Err(MarketError::Validation(format!(
                "partner surface called with role {}",
                actor.role
            )));
        }
        Ok(())
    }
}
