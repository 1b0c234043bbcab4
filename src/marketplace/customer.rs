//! Customer-facing order surface

use std::sync::Arc;

use crate::{
    errors::{MarketError, MarketResult},
    implementation::{
        inventory::InventoryGateway,
        order_management::types::{
            Actor, ActorRole, Order, OrderId, OrderService, RatingCommand, RatingSink,
        },
    },
};

/// Read/command surface a customer gets over their own orders.
///
/// Every call takes the authenticated actor; the view refuses wrong-role
/// callers outright and scopes every lookup to the actor's own orders
/// before the aggregate sees the request.
pub struct CustomerOrders {
    orders:    Arc<OrderService>,
    inventory: Arc<dyn InventoryGateway>,
    ratings:   Arc<dyn RatingSink>,
}

impl CustomerOrders {
    /// Creates the view.
    #[must_use]
    pub fn new(
        orders: Arc<OrderService>, inventory: Arc<dyn InventoryGateway>,
        ratings: Arc<dyn RatingSink>,
    ) -> Self {
        Self { orders, inventory, ratings }
    }

    /// The customer's order history, most recent first.
    pub fn orders(&self, actor: &Actor) -> MarketResult<Vec<Order>> {
        Self::require_customer(actor)?;
        self.orders
            .customer_orders(&crate::implementation::cart_system::CustomerId::new(
                actor.id.clone(),
            ))
    }

    /// Tracks one order: current status plus the full tracking log.
    pub fn track(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        Self::require_customer(actor)?;
        self.own_order(actor, order_id)
    }

    /// Cancels an order while the window is still open (pending or
    /// accepted). Reserved stock is restored; a captured card charge flips
    /// to refunded.
    pub async fn cancel(
        &self, actor: &Actor, order_id: &OrderId, note: Option<String>,
    ) -> MarketResult<Order> {
        Self::require_customer(actor)?;
        self.own_order(actor, order_id)?;
        self.orders
            .cancel_order(self.inventory.as_ref(), order_id, actor, note)
            .await
    }

    /// Rates a delivered order, once. The stored rating is forwarded to
    /// the profile-aggregate sink.
    pub fn rate(
        &self, actor: &Actor, order_id: &OrderId, command: RatingCommand,
    ) -> MarketResult<Order> {
        Self::require_customer(actor)?;
        self.own_order(actor, order_id)?;

        let order = self.orders.rate(order_id, actor, &command)?;
        if let Some(rating) = &order.rating {
            self.ratings
                .record(&order.restaurant_id, order.courier_id.as_ref(), rating);
        }
        Ok(order)
    }

    /// Loads the order and hides it from anyone but its owner.
    fn own_order(&self, actor: &Actor, order_id: &OrderId) -> MarketResult<Order> {
        let order = self.orders.order(order_id)?;
        if order.customer_id.0 != actor.id {
            return Err(MarketError::OrderNotFound(order_id.to_string()));
        }
        Ok(order)
    }

    fn require_customer(actor: &Actor) -> MarketResult<()> {
        if actor.role != ActorRole::Customer {
            return Err(MarketError::Validation(format!(
                "customer surface called with role {}",
                actor.role
            )));
        }
        Ok(())
    }
}
