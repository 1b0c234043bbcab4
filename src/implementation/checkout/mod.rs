//! Order creation transaction
//!
//! The correctness-critical path of the marketplace: converting a mutable
//! cart into an immutable order while reserving stock, validating live
//! availability, charging the customer, and retiring the cart — all or
//! nothing.
//!
//! The storage here is a set of independent gateways, so atomicity comes
//! from an explicit two-phase compensating scheme rather than a
//! multi-document transaction: stock is reserved first through conditional
//! decrements, and every failure after that point releases the holds
//! before the error surfaces. Once the cart conversion succeeds the
//! transaction is committed; the only step after it, the card charge, is
//! deliberately non-fatal.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    errors::{MarketError, MarketResult},
    implementation::{
        cart_system::{Cart, CartItem, CartService, CustomerId, DeliveryAddress, SessionId},
        catalog::{CatalogService, ProductState},
        geo_pricing::{self, ZoneDirectory},
        inventory::InventoryGateway,
        order_management::types::{
            Actor, ActorRole, AvailabilityValidation, DeliveryDetails, DroppedItem, Order,
            OrderId, OrderItem, OrderService, OrderStatus, OrderTotals, PaymentStatus,
            StockReservation, TrackingEntry, UnavailableReason,
        },
        payment::{self, PaymentGateway, PaymentMethod},
    },
    types::MarketConfig,
};

/// Checkout request: everything the customer submits to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    /// Ordering customer.
    pub customer_id:      CustomerId,
    /// Browsing session the cart was opened in.
    pub session_id:       SessionId,
    /// Delivery destination.
    pub delivery_address: DeliveryAddress,
    /// Contact phone for the courier.
    pub contact_phone:    String,
    /// How the customer pays.
    pub payment_method:   PaymentMethod,
}

/// Things that went sideways without failing the order, reported so the
/// caller can inform the customer after the fact. The customer is not
/// asked to re-confirm a shrunk order — "complete what's possible" is the
/// deliberate policy.
#[derive(Debug, Clone, Default)]
pub struct CheckoutWarnings {
    /// Items dropped because they became unavailable since the cart quote.
    pub dropped_items:        Vec<DroppedItem>,
    /// Cart total before the drop.
    pub original_total_cents: u64,
    /// Order total actually charged.
    pub adjusted_total_cents: u64,
    /// Reason the card charge failed, when it did.
    pub payment_failure:      Option<String>,
}

impl CheckoutWarnings {
    /// Whether there is anything worth telling the customer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dropped_items.is_empty() && self.payment_failure.is_none()
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// The created order.
    pub order:    Order,
    /// Post-hoc warnings for the customer.
    pub warnings: CheckoutWarnings,
}

/// A cart item that survived the availability check, with the live
/// product's stock-tracking flag.
#[derive(Debug)]
struct SurvivingItem {
    item:          CartItem,
    stock_tracked: bool,
}

/// Orchestrates cart, catalog, inventory, payment, and order storage into
/// one atomic order creation.
pub struct CheckoutService {
    carts:     Arc<CartService>,
    catalog:   Arc<CatalogService>,
    orders:    Arc<OrderService>,
    zones:     Arc<ZoneDirectory>,
    inventory: Arc<dyn InventoryGateway>,
    payment:   Arc<dyn PaymentGateway>,
    config:    MarketConfig,
}

impl CheckoutService {
    /// Wires the transaction over its collaborators.
    #[must_use]
    pub fn new(
        carts: Arc<CartService>, catalog: Arc<CatalogService>, orders: Arc<OrderService>,
        zones: Arc<ZoneDirectory>, inventory: Arc<dyn InventoryGateway>,
        payment: Arc<dyn PaymentGateway>, config: MarketConfig,
    ) -> Self {
        Self { carts, catalog, orders, zones, inventory, payment, config }
    }

    /// Places an order from the customer's active cart.
    ///
    /// Steps, in commit order: re-validate the cart, partition items by
    /// live availability, price the delivery, enforce the restaurant
    /// minimum, reserve stock, retire the cart, persist the order, charge.
    /// Any failure up to and including the cart conversion releases every
    /// stock hold and leaves cart, stock, and order storage exactly as
    /// they were. A failed charge does not abort: the order persists with
    /// `payment_status = Failed`.
    pub async fn place_order(&self, command: PlaceOrderCommand) -> MarketResult<CheckoutOutcome> {
        // Step 1: the cart must be active, unexpired, and non-empty right
        // now — this also fences against a concurrent reaper sweep.
        let cart = self
            .carts
            .active_cart(&command.customer_id)?
            .ok_or_else(|| MarketError::CartNotFound(command.customer_id.to_string()))?;

        // Step 2/3: consult the live catalog, not the cart snapshots, and
        // partition into survivors and dropped items.
        let (survivors, dropped) = self.partition_by_availability(&cart)?;
        if survivors.is_empty() {
            return Err(MarketError::EmptyOrder);
        }

        // Step 4: price from the surviving items only.
        let delivery = self.price_delivery(&cart, &command.delivery_address)?;
        let subtotal_cents: u64 = survivors.iter().map(|s| s.item.total_cents()).sum();
        let service_fee_cents = self.config.service_fee_cents(subtotal_cents);
        let totals = OrderTotals {
            subtotal_cents,
            delivery_fee_cents: delivery.fee_cents,
            service_fee_cents,
            discount_cents: cart.pricing.discount_cents,
            total_cents: (subtotal_cents + delivery.fee_cents + service_fee_cents)
                .saturating_sub(cart.pricing.discount_cents),
        };

        // Step 5: the restaurant minimum applies to the possibly reduced
        // subtotal, under the terms snapshotted into the cart.
        if subtotal_cents < cart.restaurant.minimum_order_cents {
            return Err(MarketError::MinimumNotMet {
                minimum_cents:  cart.restaurant.minimum_order_cents,
                subtotal_cents,
            });
        }

        // First phase of the commit: reserve stock with conditional
        // decrements, remembering each hold for compensation.
        let reservations = self.reserve_stock(&survivors).await?;

        // The cart conversion is the commit point. A lost race here (cart
        // converted or abandoned concurrently) rolls the reservations back.
        let order_number = match self.orders.next_order_number(Utc::now().date_naive()) {
            Ok(number) => number,
            Err(err) => {
                self.release_stock(&reservations).await;
                return Err(err);
            },
        };
        if let Err(err) = self.carts.convert_to_order(&cart.id) {
            self.release_stock(&reservations).await;
            return Err(err);
        }

        // Persist the order with frozen snapshots, the availability
        // record, and the initial tracking entry.
        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            number: order_number,
            customer_id: command.customer_id.clone(),
            restaurant_id: cart.restaurant.id.clone(),
            courier_id: None,
            items: survivors.iter().map(|s| OrderItem::from_cart_item(&s.item)).collect(),
            availability: AvailabilityValidation { checked_at: now, dropped: dropped.clone() },
            totals,
            delivery: DeliveryDetails {
                address:       command.delivery_address.clone(),
                contact_phone: command.contact_phone.clone(),
                eta_minutes:   Some(delivery.eta_minutes),
            },
            payment_method: command.payment_method,
            payment_status: match command.payment_method {
                PaymentMethod::Card => PaymentStatus::Processing,
                PaymentMethod::Cash => PaymentStatus::Pending,
            },
            payment_ref: None,
            status: OrderStatus::Pending,
            tracking: vec![TrackingEntry::new(
                OrderStatus::Pending,
                command.customer_id.to_string(),
                ActorRole::Customer,
                Some("order created".to_string()),
            )],
            rating: None,
            reservations,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        let order_id = order.id.clone();
        self.orders.insert_order(order)?;

        // Step 8: charge. Failure is recorded, never fatal.
        let payment_failure = self.settle_payment(&order_id, &command).await?;

        let order = self.orders.order(&order_id)?;
        if !dropped.is_empty() {
            tracing::warn!(
                order = %order.number,
                dropped = dropped.len(),
                "order placed with unavailable items dropped"
            );
        }

        Ok(CheckoutOutcome {
            warnings: CheckoutWarnings {
                dropped_items: dropped,
                original_total_cents: cart.pricing.total_cents,
                adjusted_total_cents: order.totals.total_cents,
                payment_failure,
            },
            order,
        })
    }

    /// Splits cart items into survivors and dropped, by the product's
    /// current catalog state.
    fn partition_by_availability(
        &self, cart: &Cart,
    ) -> MarketResult<(Vec<SurvivingItem>, Vec<DroppedItem>)> {
        let ids: Vec<_> = cart.items.iter().map(|i| i.product_id.clone()).collect();
        let states = self.catalog.products_state(&ids)?;

        let mut survivors = Vec::new();
        let mut dropped = Vec::new();

        for item in &cart.items {
            let reason = match states.get(&item.product_id) {
                None | Some(ProductState::Missing) => Some(UnavailableReason::Deleted),
                Some(ProductState::Live(product)) if !product.active => {
                    Some(UnavailableReason::Deactivated)
                },
                Some(ProductState::Live(product)) if !product.available => {
                    Some(UnavailableReason::Unavailable)
                },
                Some(ProductState::Live(product)) => {
                    survivors.push(SurvivingItem {
                        item:          item.clone(),
                        stock_tracked: product.category.is_stock_tracked(),
                    });
                    None
                },
            };

            if let Some(reason) = reason {
                dropped.push(DroppedItem {
                    product_id: item.product_id.clone(),
                    title:      item.title.clone(),
                    quantity:   item.quantity,
                    reason,
                });
            }
        }

        Ok((survivors, dropped))
    }

    /// Prices delivery for the submitted destination, reusing the cart's
    /// stored quote when it was made for the same address.
    fn price_delivery(
        &self, cart: &Cart, address: &DeliveryAddress,
    ) -> MarketResult<geo_pricing::DeliveryQuote> {
        if let Some(quote) = &cart.delivery {
            if &quote.address == address {
                return Ok(geo_pricing::DeliveryQuote {
                    zone_number: quote.zone_number,
                    distance_km: quote.distance_km,
                    fee_cents:   quote.fee_cents,
                    eta_minutes: quote.eta_minutes,
                });
            }
        }

        let zone = self
            .zones
            .resolve(&address.postal_code, Some(address.coordinates))
            .ok_or_else(|| {
                MarketError::OutOfRange(format!("no zone serves postal code {}", address.postal_code))
            })?;
        let distance_km = geo_pricing::haversine_km(cart.restaurant.location, address.coordinates);
        geo_pricing::quote_delivery_fee(distance_km, zone, 1, &self.config)
    }

    /// Reserves stock for every stock-tracked survivor. On the first
    /// failed decrement all prior holds are released and the failure
    /// surfaces as retryable.
    async fn reserve_stock(&self, survivors: &[SurvivingItem]) -> MarketResult<Vec<StockReservation>> {
        let mut held: Vec<StockReservation> = Vec::new();

        for survivor in survivors.iter().filter(|s| s.stock_tracked) {
            let item = &survivor.item;
            match self
                .inventory
                .decrement_stock(&item.product_id, item.quantity)
                .await
            {
                Ok(()) => held.push(StockReservation {
                    product_id: item.product_id.clone(),
                    quantity:   item.quantity,
                }),
                Err(err) => {
                    tracing::warn!(
                        product = %item.product_id,
                        error = %err,
                        "stock reservation failed, rolling back holds"
                    );
                    self.release_stock(&held).await;
                    return Err(err);
                },
            }
        }

        Ok(held)
    }

    /// Returns held stock to the shelf. Compensation never overrides the
    /// original error, so restore failures are only logged.
    async fn release_stock(&self, held: &[StockReservation]) {
        for reservation in held {
            if let Err(err) = self
                .inventory
                .restore_stock(&reservation.product_id, reservation.quantity)
                .await
            {
                tracing::error!(
                    product = %reservation.product_id,
                    error = %err,
                    "failed to release stock hold"
                );
            }
        }
    }

    /// Runs the card charge with a bounded timeout and records the result
    /// on the order. Returns the failure reason when the charge failed.
    async fn settle_payment(
        &self, order_id: &OrderId, command: &PlaceOrderCommand,
    ) -> MarketResult<Option<String>> {
        if command.payment_method != PaymentMethod::Card {
            return Ok(None);
        }

        let order = self.orders.order(order_id)?;
        let actor = Actor::customer(command.customer_id.to_string());
        let charge = payment::charge_with_timeout(
            self.payment.as_ref(),
            self.config.payment_timeout(),
            order.number.as_str(),
            order.totals.total_cents,
            command.payment_method,
        )
        .await;

        match charge {
            Ok(outcome) => {
                self.orders
                    .record_payment_success(order_id, &actor, &outcome.reference)?;
                Ok(None)
            },
            Err(err) => {
                tracing::warn!(order = %order.number, error = %err, "card charge failed, order kept");
                self.orders
                    .record_payment_failure(order_id, &actor, &err.to_string())?;
                Ok(Some(err.to_string()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        implementation::{
            cart_system::{AddItemCommand, CartStatus},
            inventory::InMemoryInventory,
            payment::{ChargeBehavior, InMemoryPaymentGateway},
        },
        types::{
            catalog::{Price, Product, ProductCategory, ProductId, Restaurant, RestaurantId},
            geo::{DeliveryZone, GeoPoint},
        },
    };

    struct Harness {
        carts:     Arc<CartService>,
        catalog:   Arc<CatalogService>,
        orders:    Arc<OrderService>,
        inventory: Arc<InMemoryInventory>,
        payment:   Arc<InMemoryPaymentGateway>,
        checkout:  CheckoutService,
    }

    fn harness_with(minimum_order_cents: u64) -> Harness {
        let catalog = Arc::new(CatalogService::new());

        let mut restaurant = Restaurant::new(
            RestaurantId::new("r-1"),
            "Trattoria Uno",
            "italian",
            GeoPoint::new(48.2082, 16.3738),
        );
        restaurant.base_delivery_fee_cents = 350;
        restaurant.minimum_order_cents = minimum_order_cents;
        catalog.upsert_restaurant(restaurant).expect("restaurant");

        let pasta = Product::new(
            ProductId::new("p-pasta"),
            RestaurantId::new("r-1"),
            "Tagliatelle",
            Price::eur(1_000),
        );
        catalog.upsert_product(pasta).expect("pasta");

        let mut wine = Product::new(
            ProductId::new("p-wine"),
            RestaurantId::new("r-1"),
            "House Red",
            Price::eur(1_500),
        );
        wine.category = ProductCategory::Beverage;
        catalog.upsert_product(wine).expect("wine");

        let mut zone = DeliveryZone::new(1, GeoPoint::new(48.2082, 16.3738), ["1010".to_string()]);
        zone.base_fee_cents = 350;
        zone.max_distance_km = 10.0;
        let mut zones = ZoneDirectory::new();
        zones.insert(zone).expect("zone");
        let zones = Arc::new(zones);

        let carts = Arc::new(CartService::new(
            Arc::clone(&catalog),
            Arc::clone(&zones),
            MarketConfig::default(),
        ));
        let orders = Arc::new(OrderService::new());
        let inventory = Arc::new(InMemoryInventory::new());
        inventory.set_stock(ProductId::new("p-wine"), 10).expect("stock");
        let payment = Arc::new(InMemoryPaymentGateway::approving());

        let checkout = CheckoutService::new(
            Arc::clone(&carts),
            Arc::clone(&catalog),
            Arc::clone(&orders),
            zones,
            Arc::clone(&inventory) as Arc<dyn InventoryGateway>,
            Arc::clone(&payment) as Arc<dyn PaymentGateway>,
            MarketConfig::default(),
        );

        Harness { carts, catalog, orders, inventory, payment, checkout }
    }

    fn harness() -> Harness {
        harness_with(0)
    }

    fn fill_cart(h: &Harness) {
        for product in ["p-pasta", "p-wine"] {
            h.carts
                .add_item(
                    &CustomerId::new("c-1"),
                    &SessionId::new("s-1"),
                    AddItemCommand {
                        product_id:      ProductId::new(product),
                        quantity:        1,
                        options:         Vec::new(),
                        special_request: None,
                    },
                )
                .expect("add item");
        }
    }

    fn command(method: PaymentMethod) -> PlaceOrderCommand {
        PlaceOrderCommand {
            customer_id:      CustomerId::new("c-1"),
            session_id:       SessionId::new("s-1"),
            delivery_address: DeliveryAddress {
                street:      "Stephansplatz 1".to_string(),
                city:        "Vienna".to_string(),
                postal_code: "1010".to_string(),
                coordinates: GeoPoint::new(48.2086, 16.3730),
            },
            contact_phone:    "+43 1 234567".to_string(),
            payment_method:   method,
        }
    }

    #[tokio::test]
    async fn totals_carry_over_unchanged_when_nothing_drops() {
        let h = harness();
        fill_cart(&h);

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect("place order");

        // 10.00 + 15.00 subtotal, 3.50 delivery, 2% service fee of 0.50.
        let totals = &outcome.order.totals;
        assert_eq!(totals.subtotal_cents, 2_500);
        assert_eq!(totals.delivery_fee_cents, 350);
        assert_eq!(totals.service_fee_cents, 50);
        assert_eq!(totals.total_cents, 2_900);
        assert!(totals.reconciles_with(&outcome.order.items));

        assert!(outcome.warnings.is_empty());
        assert!(outcome.order.availability.is_clean());
        assert_eq!(outcome.order.payment_status, PaymentStatus::Pending);

        // The tracked bottle was reserved, the cart retired.
        assert_eq!(h.inventory.stock_level(&ProductId::new("p-wine")).expect("level"), 9);
        assert!(h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .is_none());
    }

    #[tokio::test]
    async fn order_number_is_date_prefixed_daily_sequence() {
        let h = harness();
        fill_cart(&h);

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect("place order");

        let number = outcome.order.number.as_str();
        assert!(number.starts_with("ORD-"));
        assert!(number.ends_with("-0001"));
        assert_eq!(number.len(), "ORD-YYYYMMDD-NNNN".len());
    }

    #[tokio::test]
    async fn cart_is_converted_and_not_reusable() {
        let h = harness();
        fill_cart(&h);

        let cart_before = h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .expect("active cart");

        h.checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect("place order");

        let row = h.carts.cart(&cart_before.id).expect("row");
        assert_eq!(row.status, CartStatus::Converted);

        let second = h.checkout.place_order(command(PaymentMethod::Cash)).await;
        assert!(matches!(second, Err(MarketError::CartNotFound(_))));
    }

    #[tokio::test]
    async fn card_charge_completes_payment() {
        let h = harness();
        fill_cart(&h);

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Card))
            .await
            .expect("place order");

        assert_eq!(outcome.order.payment_status, PaymentStatus::Completed);
        assert!(outcome.order.payment_ref.is_some());
        assert_eq!(
            h.payment
                .charged_amount(outcome.order.number.as_str())
                .expect("lookup"),
            Some(2_900)
        );
    }

    #[tokio::test]
    async fn declined_card_keeps_the_order() {
        let h = harness();
        h.payment
            .set_behavior(ChargeBehavior::Decline("card expired".to_string()))
            .expect("behavior");
        fill_cart(&h);

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Card))
            .await
            .expect("place order");

        assert_eq!(outcome.order.payment_status, PaymentStatus::Failed);
        assert!(outcome.warnings.payment_failure.is_some());
        // Stock stays reserved: the order exists and can still be paid or
        // cancelled.
        assert_eq!(h.inventory.stock_level(&ProductId::new("p-wine")).expect("level"), 9);
        assert_eq!(
            h.orders
                .customer_orders(&CustomerId::new("c-1"))
                .expect("orders")
                .len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_timeout_is_a_failed_charge() {
        let h = harness();
        h.payment
            .set_behavior(ChargeBehavior::Stall(std::time::Duration::from_secs(120)))
            .expect("behavior");
        fill_cart(&h);

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Card))
            .await
            .expect("place order");

        assert_eq!(outcome.order.payment_status, PaymentStatus::Failed);
        assert!(outcome
            .warnings
            .payment_failure
            .as_deref()
            .is_some_and(|r| r.contains("did not answer")));
    }

    #[tokio::test]
    async fn unavailable_items_are_dropped_with_a_record() {
        let h = harness();
        fill_cart(&h);
        h.catalog
            .set_product_availability(&ProductId::new("p-wine"), false)
            .expect("toggle");

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect("place order");

        assert_eq!(outcome.order.items.len(), 1);
        assert_eq!(outcome.order.items[0].product_id, ProductId::new("p-pasta"));

        // Totals recomputed from the survivor only.
        let totals = &outcome.order.totals;
        assert_eq!(totals.subtotal_cents, 1_000);
        assert_eq!(totals.service_fee_cents, 20);
        assert_eq!(totals.total_cents, 1_370);
        assert!(totals.reconciles_with(&outcome.order.items));

        let dropped = &outcome.order.availability.dropped;
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].reason, UnavailableReason::Unavailable);

        assert_eq!(outcome.warnings.original_total_cents, 2_900);
        assert_eq!(outcome.warnings.adjusted_total_cents, 1_370);

        // The dropped bottle was never reserved.
        assert_eq!(h.inventory.stock_level(&ProductId::new("p-wine")).expect("level"), 10);
    }

    #[tokio::test]
    async fn all_items_unavailable_is_an_empty_order() {
        let h = harness();
        fill_cart(&h);
        h.catalog
            .set_product_availability(&ProductId::new("p-pasta"), false)
            .expect("toggle pasta");
        h.catalog
            .set_product_availability(&ProductId::new("p-wine"), false)
            .expect("toggle wine");

        let result = h.checkout.place_order(command(PaymentMethod::Cash)).await;
        assert!(matches!(result, Err(MarketError::EmptyOrder)));

        // The cart survives the failed attempt.
        assert!(h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .is_some());
    }

    #[tokio::test]
    async fn shrunken_subtotal_can_fail_the_minimum() {
        let h = harness_with(2_000);
        fill_cart(&h);
        h.catalog
            .set_product_availability(&ProductId::new("p-wine"), false)
            .expect("toggle");

        let result = h.checkout.place_order(command(PaymentMethod::Cash)).await;
        assert!(matches!(
            result,
            Err(MarketError::MinimumNotMet { minimum_cents: 2_000, subtotal_cents: 1_000 })
        ));

        // Nothing was reserved or converted.
        assert_eq!(h.inventory.stock_level(&ProductId::new("p-wine")).expect("level"), 10);
        assert!(h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .is_some());
    }

    #[tokio::test]
    async fn exhausted_stock_rolls_everything_back() {
        let h = harness();
        fill_cart(&h);
        h.inventory.set_stock(ProductId::new("p-wine"), 0).expect("stock");

        let err = h
            .checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect_err("stock is exhausted");
        assert!(matches!(err, MarketError::InsufficientStock { .. }));
        assert!(err.is_retryable());

        // Cart untouched, no order persisted.
        assert!(h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .is_some());
        assert!(h
            .orders
            .customer_orders(&CustomerId::new("c-1"))
            .expect("orders")
            .is_empty());
    }

    #[tokio::test]
    async fn partial_reservation_is_released_on_failure() {
        let h = harness();

        // A second tracked product that reserves fine before wine fails.
        let mut cola = Product::new(
            ProductId::new("p-cola"),
            RestaurantId::new("r-1"),
            "Cola",
            Price::eur(200),
        );
        cola.category = ProductCategory::Beverage;
        h.catalog.upsert_product(cola).expect("cola");
        h.inventory.set_stock(ProductId::new("p-cola"), 5).expect("cola stock");
        h.inventory.set_stock(ProductId::new("p-wine"), 0).expect("wine stock");

        h.carts
            .add_item(
                &CustomerId::new("c-1"),
                &SessionId::new("s-1"),
                AddItemCommand {
                    product_id:      ProductId::new("p-cola"),
                    quantity:        2,
                    options:         Vec::new(),
                    special_request: None,
                },
            )
            .expect("add cola");
        h.carts
            .add_item(
                &CustomerId::new("c-1"),
                &SessionId::new("s-1"),
                AddItemCommand {
                    product_id:      ProductId::new("p-wine"),
                    quantity:        1,
                    options:         Vec::new(),
                    special_request: None,
                },
            )
            .expect("add wine");

        let result = h.checkout.place_order(command(PaymentMethod::Cash)).await;
        assert!(matches!(result, Err(MarketError::InsufficientStock { .. })));

        // The cola hold was released when the wine decrement failed.
        assert_eq!(h.inventory.stock_level(&ProductId::new("p-cola")).expect("level"), 5);
    }

    #[tokio::test]
    async fn out_of_zone_destination_fails_before_any_commit() {
        let h = harness();
        fill_cart(&h);

        let mut cmd = command(PaymentMethod::Cash);
        cmd.delivery_address.postal_code = "8010".to_string();
        cmd.delivery_address.coordinates = GeoPoint::new(47.0707, 15.4395);

        let result = h.checkout.place_order(cmd).await;
        assert!(matches!(result, Err(MarketError::OutOfRange(_))));

        assert_eq!(h.inventory.stock_level(&ProductId::new("p-wine")).expect("level"), 10);
        assert!(h
            .carts
            .active_cart(&CustomerId::new("c-1"))
            .expect("lookup")
            .is_some());
    }

    #[tokio::test]
    async fn stored_quote_is_reused_for_the_same_address() {
        let h = harness();
        fill_cart(&h);

        let quoted = h
            .carts
            .quote_delivery(&CustomerId::new("c-1"), command(PaymentMethod::Cash).delivery_address)
            .expect("quote");
        let quote = quoted.delivery.expect("stored quote");

        let outcome = h
            .checkout
            .place_order(command(PaymentMethod::Cash))
            .await
            .expect("place order");

        assert_eq!(outcome.order.totals.delivery_fee_cents, quote.fee_cents);
        assert_eq!(outcome.order.delivery.eta_minutes, Some(quote.eta_minutes));
    }
}
