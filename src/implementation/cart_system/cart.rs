//! Shopping cart and pricing block

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{MarketError, MarketResult},
    types::MarketConfig,
};

use super::item::CartItem;
use super::types::{
    CartDeliveryQuote, CartId, CartItemId, CartStatus, CustomerId, RestaurantSnapshot, SessionId,
};

/// Cart price totals, recomputed synchronously on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartPricing {
    /// Sum of line totals.
    pub subtotal_cents:     u64,
    /// Delivery fee: the stored quote when one exists, otherwise the
    /// restaurant's base fee.
    pub delivery_fee_cents: u64,
    /// Service fee on the subtotal.
    pub service_fee_cents:  u64,
    /// Discounts applied.
    pub discount_cents:     u64,
    /// Grand total.
    pub total_cents:        u64,
}

impl CartPricing {
    /// Computes the pricing block for a set of items.
    ///
    /// An empty item list zeroes everything — a cart with no items has no
    /// fees either.
    #[must_use]
    pub fn calculate(
        items: &[CartItem], delivery_fee_cents: u64, discount_cents: u64, config: &MarketConfig,
    ) -> Self {
        if items.is_empty() {
            return Self::default();
        }

        let subtotal_cents: u64 = items.iter().map(CartItem::total_cents).sum();
        let service_fee_cents = config.service_fee_cents(subtotal_cents);
        let total_cents = (subtotal_cents + delivery_fee_cents + service_fee_cents)
            .saturating_sub(discount_cents);

        Self {
            subtotal_cents,
            delivery_fee_cents,
            service_fee_cents,
            discount_cents,
            total_cents,
        }
    }
}

/// Shopping cart: the mutable pre-order aggregate.
///
/// Scoped to one customer session and exactly one restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id:               CartId,
    /// Owning customer.
    pub customer_id:      CustomerId,
    /// Browsing session the cart was opened in.
    pub session_id:       SessionId,
    /// Restaurant snapshot captured at creation.
    pub restaurant:       RestaurantSnapshot,
    /// Line items, in insertion order.
    pub items:            Vec<CartItem>,
    /// Computed pricing block.
    pub pricing:          CartPricing,
    /// Stored delivery quote, if a destination was priced.
    pub delivery:         Option<CartDeliveryQuote>,
    /// Cart status.
    pub status:           CartStatus,
    /// Mutation counter; every read-modify-write bumps it.
    pub version:          u64,
    /// Creation timestamp.
    pub created_at:       DateTime<Utc>,
    /// Last activity timestamp.
    pub last_activity_at: DateTime<Utc>,
    /// Absolute expiry timestamp.
    pub expires_at:       DateTime<Utc>,
}

impl Cart {
    /// Creates a new active cart for a customer session and restaurant.
    #[must_use]
    pub fn new(
        customer_id: CustomerId, session_id: SessionId, restaurant: RestaurantSnapshot,
        config: &MarketConfig,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: CartId::generate(),
            customer_id,
            session_id,
            restaurant,
            items: Vec::new(),
            pricing: CartPricing::default(),
            delivery: None,
            status: CartStatus::Active,
            version: 0,
            created_at: now,
            last_activity_at: now,
            expires_at: now + config.cart_ttl(),
        }
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total quantity across all items.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether the cart has passed its expiry timestamp.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the cart can still take mutations and be checked out.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == CartStatus::Active && !self.is_expired(now)
    }

    /// Finds a line item by ID.
    pub fn item(&self, item_id: &CartItemId) -> MarketResult<&CartItem> {
        self.items
            .iter()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| MarketError::ItemNotInCart(item_id.to_string()))
    }

    /// Finds a line item mutably.
    pub fn item_mut(&mut self, item_id: &CartItemId) -> MarketResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| MarketError::ItemNotInCart(item_id.to_string()))
    }

    /// Delivery fee to price with: the stored quote wins over the
    /// restaurant's base fee.
    #[must_use]
    pub fn effective_delivery_fee_cents(&self) -> u64 {
        self.delivery
            .as_ref()
            .map(|q| q.fee_cents)
            .unwrap_or(self.restaurant.base_delivery_fee_cents)
    }

    /// Recomputes the pricing block from the current items.
    pub fn recompute_pricing(&mut self, config: &MarketConfig) {
        self.pricing = CartPricing::calculate(
            &self.items,
            self.effective_delivery_fee_cents(),
            self.pricing.discount_cents,
            config,
        );
        tracing::debug!(
            cart = %self.id,
            subtotal = self.pricing.subtotal_cents,
            total = self.pricing.total_cents,
            "cart pricing recomputed"
        );
    }

    /// Records a mutation: bumps the version and activity timestamp.
    pub fn touch(&mut self) {
        self.version += 1;
        self.last_activity_at = Utc::now();
    }

    /// Empties the cart, zeroing the pricing but preserving the row so the
    /// abandonment remains auditable.
    pub fn clear(&mut self, config: &MarketConfig) {
        self.items.clear();
        self.recompute_pricing(config);
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        catalog::{Price, Product, ProductId, RestaurantId},
        geo::GeoPoint,
    };

    fn snapshot() -> RestaurantSnapshot {
        RestaurantSnapshot {
            id:                      RestaurantId::new("r-1"),
            name:                    "Trattoria Uno".to_string(),
            category:                "italian".to_string(),
            location:                GeoPoint::new(48.2082, 16.3738),
            base_delivery_fee_cents: 350,
            minimum_order_cents:     0,
        }
    }

    fn item(cents: u64, quantity: u32) -> CartItem {
        let product = Product::new(
            ProductId::new(format!("p-{cents}")),
            RestaurantId::new("r-1"),
            "Dish",
            Price::eur(cents),
        );
        CartItem::from_product(&product, quantity, Vec::new(), None)
    }

    #[test]
    fn pricing_identity_holds() {
        let config = MarketConfig::default();
        let mut cart = Cart::new(
            CustomerId::new("c-1"),
            SessionId::new("s-1"),
            snapshot(),
            &config,
        );

        cart.items.push(item(1_000, 1));
        cart.items.push(item(1_500, 1));
        cart.recompute_pricing(&config);

        let p = &cart.pricing;
        assert_eq!(p.subtotal_cents, 2_500);
        assert_eq!(p.delivery_fee_cents, 350);
        assert_eq!(p.service_fee_cents, 50);
        assert_eq!(
            p.total_cents,
            p.subtotal_cents + p.delivery_fee_cents + p.service_fee_cents - p.discount_cents
        );
        assert_eq!(p.total_cents, 2_900);
    }

    #[test]
    fn empty_cart_prices_to_zero() {
        let config = MarketConfig::default();
        let mut cart = Cart::new(
            CustomerId::new("c-1"),
            SessionId::new("s-1"),
            snapshot(),
            &config,
        );

        cart.items.push(item(1_000, 2));
        cart.recompute_pricing(&config);
        assert!(cart.pricing.total_cents > 0);

        cart.clear(&config);
        assert_eq!(cart.pricing, CartPricing::default());
    }

    #[test]
    fn expiry_follows_ttl() {
        let config = MarketConfig::default();
        let cart = Cart::new(
            CustomerId::new("c-1"),
            SessionId::new("s-1"),
            snapshot(),
            &config,
        );

        let now = Utc::now();
        assert!(!cart.is_expired(now));
        assert!(cart.is_expired(now + chrono::Duration::hours(25)));
    }

    #[test]
    fn touch_bumps_version() {
        let config = MarketConfig::default();
        let mut cart = Cart::new(
            CustomerId::new("c-1"),
            SessionId::new("s-1"),
            snapshot(),
            &config,
        );

        assert_eq!(cart.version, 0);
        cart.touch();
        cart.touch();
        assert_eq!(cart.version, 2);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn total_always_reconciles_to_the_cent(
                lines in prop::collection::vec((1u64..50_000, 1u32..10), 1..8),
            ) {
                let config = MarketConfig::default();
                let mut cart = Cart::new(
                    CustomerId::new("c-1"),
                    SessionId::new("s-1"),
                    snapshot(),
                    &config,
                );
                for (cents, quantity) in &lines {
                    cart.items.push(item(*cents, *quantity));
                }
                cart.recompute_pricing(&config);

                let p = &cart.pricing;
                let expected_subtotal: u64 =
                    lines.iter().map(|(c, q)| c * u64::from(*q)).sum();
                prop_assert_eq!(p.subtotal_cents, expected_subtotal);
                prop_assert_eq!(
                    p.total_cents,
                    p.subtotal_cents + p.delivery_fee_cents + p.service_fee_cents
                        - p.discount_cents
                );
            }
        }
    }
}
