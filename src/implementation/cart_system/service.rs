//! Cart management service

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};

use crate::{
    errors::{MarketError, MarketResult},
    implementation::{
        catalog::CatalogService,
        geo_pricing::{self, ZoneDirectory},
    },
    types::MarketConfig,
};

use super::cart::Cart;
use super::item::CartItem;
use super::types::{
    AddItemCommand, CartDeliveryQuote, CartId, CartItemId, CartStatus, CustomerId, DeliveryAddress,
    RestaurantSnapshot, SessionId, UpdateItemCommand,
};

/// Cart management service.
///
/// All mutations take both internal locks and run their read-modify-write
/// cycle entirely inside them, so no two mutations of the same cart can
/// interleave. The customer index enforces the one-active-cart rule: a
/// customer has at most one active cart, and therefore at most one per
/// restaurant.
#[derive(Debug)]
pub struct CartService {
    /// Carts indexed by ID.
    carts:              Arc<Mutex<HashMap<CartId, Cart>>>,
    /// Active cart per customer.
    active_by_customer: Arc<Mutex<HashMap<CustomerId, CartId>>>,
    /// Live catalog, consulted on every add.
    catalog:            Arc<CatalogService>,
    /// Zone directory for delivery quotes.
    zones:              Arc<ZoneDirectory>,
    /// Pricing and lifetime knobs.
    config:             MarketConfig,
}

impl CartService {
    /// Creates a new cart service.
    #[must_use]
    pub fn new(catalog: Arc<CatalogService>, zones: Arc<ZoneDirectory>, config: MarketConfig) -> Self {
        Self {
            carts: Arc::new(Mutex::new(HashMap::new())),
            active_by_customer: Arc::new(Mutex::new(HashMap::new())),
            catalog,
            zones,
            config,
        }
    }

    /// Gets a cart by ID.
    pub fn cart(&self, id: &CartId) -> MarketResult<Cart> {
        let carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        carts
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::CartNotFound(id.to_string()))
    }

    /// Gets the customer's active cart, if a usable one exists.
    ///
    /// A converted, abandoned, expired, or emptied cart reports as absent:
    /// callers treat a cart with zero items as "no active cart".
    pub fn active_cart(&self, customer_id: &CustomerId) -> MarketResult<Option<Cart>> {
        let carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let now = Utc::now();
        Ok(index
            .get(customer_id)
            .and_then(|id| carts.get(id))
            .filter(|cart| cart.is_active(now) && !cart.is_empty())
            .cloned())
    }

    /// Adds a product to the customer's cart, creating the cart on first
    /// add.
    ///
    /// The product and its restaurant are loaded live; inactive or
    /// unapproved entries are rejected. Adding from a second restaurant
    /// while a non-empty active cart exists is refused — the caller must
    /// clear or convert first. Option selections unknown to the product's
    /// live schema are dropped silently.
    ///
    /// Returns the updated cart and the appended (or merged-into) item.
    pub fn add_item(
        &self, customer_id: &CustomerId, session_id: &SessionId, command: AddItemCommand,
    ) -> MarketResult<(Cart, CartItem)> {
        if command.quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }
        self.validate_special_request(command.special_request.as_deref())?;

        let product = self.catalog.product(&command.product_id)?;
        if !product.is_orderable() {
            return Err(MarketError::ProductNotAvailable(product.id.to_string()));
        }

        let restaurant = self.catalog.restaurant(&product.restaurant_id)?;
        if !restaurant.is_open_for_orders() {
            return Err(MarketError::RestaurantNotAvailable(restaurant.id.to_string()));
        }

        let options = CartItem::resolve_options(&product, &command.options);

        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let mut index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let now = Utc::now();
        let current_id = index
            .get(customer_id)
            .filter(|id| carts.get(*id).is_some_and(|c| c.is_active(now)))
            .cloned();

        let cart_id = match current_id {
            Some(id) => {
                let cart = carts.get_mut(&id).ok_or(MarketError::Lock)?;
                if cart.restaurant.id != product.restaurant_id {
                    if !cart.is_empty() {
                        return Err(MarketError::RestaurantMismatch {
                            cart_restaurant:    cart.restaurant.id.to_string(),
                            product_restaurant: product.restaurant_id.to_string(),
                        });
                    }
                    // An emptied cart no longer pins the customer to its
                    // restaurant: retire it and start fresh below.
                    cart.status = CartStatus::Abandoned;
                    cart.touch();
                    index.remove(customer_id);
                    None
                } else {
                    Some(id)
                }
            },
            None => None,
        };

        let cart_id = match cart_id {
            Some(id) => id,
            None => {
                let snapshot = RestaurantSnapshot {
                    id:                      restaurant.id.clone(),
                    name:                    restaurant.name.clone(),
                    category:                restaurant.category.clone(),
                    location:                restaurant.location,
                    base_delivery_fee_cents: restaurant.base_delivery_fee_cents,
                    minimum_order_cents:     restaurant.minimum_order_cents,
                };
                let cart = Cart::new(
                    customer_id.clone(),
                    session_id.clone(),
                    snapshot,
                    &self.config,
                );
                let id = cart.id.clone();
                tracing::info!(cart = %id, customer = %customer_id, restaurant = %restaurant.id, "cart created");
                index.insert(customer_id.clone(), id.clone());
                carts.insert(id.clone(), cart);
                id
            },
        };

        let cart = carts.get_mut(&cart_id).ok_or(MarketError::Lock)?;

        // Identical product, options, and request merge into one line.
        let merged = cart.items.iter_mut().find(|item| {
            item.product_id == product.id
                && item.options == options
                && item.special_request == command.special_request
        });

        let item_id = match merged {
            Some(item) => {
                item.set_quantity(item.quantity.saturating_add(command.quantity));
                item.id.clone()
            },
            None => {
                let item = CartItem::from_product(
                    &product,
                    command.quantity,
                    options,
                    command.special_request,
                );
                let id = item.id.clone();
                cart.items.push(item);
                id
            },
        };

        cart.recompute_pricing(&self.config);
        cart.touch();

        let cart = cart.clone();
        let item = cart.item(&item_id)?.clone();
        Ok((cart, item))
    }

    /// Modifies a line item on the customer's active cart.
    pub fn update_item(
        &self, customer_id: &CustomerId, item_id: &CartItemId, command: UpdateItemCommand,
    ) -> MarketResult<Cart> {
        if command.quantity == Some(0) {
            return Err(MarketError::InvalidQuantity);
        }
        self.validate_special_request(command.special_request.as_deref())?;

        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let cart = Self::active_cart_mut(&mut carts, &index, customer_id)?;

        // Re-resolving options needs the live schema, so look the product
        // up before mutating anything.
        let resolved = match &command.options {
            Some(requested) => {
                let product_id = cart.item(item_id)?.product_id.clone();
                let product = self.catalog.product(&product_id)?;
                Some(CartItem::resolve_options(&product, requested))
            },
            None => None,
        };

        let item = cart.item_mut(item_id)?;
        if let Some(quantity) = command.quantity {
            item.set_quantity(quantity);
        }
        if let Some(options) = resolved {
            item.set_options(options);
        }
        if let Some(request) = command.special_request {
            item.set_special_request(Some(request));
        }

        cart.recompute_pricing(&self.config);
        cart.touch();
        Ok(cart.clone())
    }

    /// Removes a line item from the customer's active cart.
    ///
    /// Returns `None` when the removal emptied the cart: the row is kept
    /// for audit but the cart is logically absent from then on.
    pub fn remove_item(
        &self, customer_id: &CustomerId, item_id: &CartItemId,
    ) -> MarketResult<Option<Cart>> {
        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let cart = Self::active_cart_mut(&mut carts, &index, customer_id)?;

        let before = cart.items.len();
        cart.items.retain(|i| &i.id != item_id);
        if cart.items.len() == before {
            return Err(MarketError::ItemNotInCart(item_id.to_string()));
        }

        cart.recompute_pricing(&self.config);
        cart.touch();

        if cart.is_empty() {
            Ok(None)
        } else {
            Ok(Some(cart.clone()))
        }
    }

    /// Empties the customer's active cart, preserving the row.
    pub fn clear(&self, customer_id: &CustomerId) -> MarketResult<Cart> {
        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let cart = Self::active_cart_mut(&mut carts, &index, customer_id)?;
        cart.clear(&self.config);
        Ok(cart.clone())
    }

    /// Prices delivery to a destination and stores the quote on the cart.
    ///
    /// Fails with `OutOfRange` when no zone covers the destination or the
    /// distance exceeds the zone limit; the cart's delivery block is left
    /// untouched in that case.
    pub fn quote_delivery(
        &self, customer_id: &CustomerId, address: DeliveryAddress,
    ) -> MarketResult<Cart> {
        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let cart = Self::active_cart_mut(&mut carts, &index, customer_id)?;

        let zone = self
            .zones
            .resolve(&address.postal_code, Some(address.coordinates))
            .ok_or_else(|| {
                MarketError::OutOfRange(format!("no zone serves postal code {}", address.postal_code))
            })?;

        let distance_km = geo_pricing::haversine_km(cart.restaurant.location, address.coordinates);
        let quote = geo_pricing::quote_delivery_fee(distance_km, zone, 1, &self.config)?;

        cart.delivery = Some(CartDeliveryQuote {
            address,
            zone_number: quote.zone_number,
            distance_km: quote.distance_km,
            fee_cents: quote.fee_cents,
            eta_minutes: quote.eta_minutes,
            quoted_at: Utc::now(),
        });

        cart.recompute_pricing(&self.config);
        cart.touch();
        Ok(cart.clone())
    }

    /// Flips a cart to `Converted`. Called exactly once per cart, by the
    /// checkout transaction — never from a client-facing surface.
    ///
    /// The conditional check makes the terminal transition race-safe: a
    /// cart that was concurrently converted or abandoned yields `Conflict`.
    pub(crate) fn convert_to_order(&self, cart_id: &CartId) -> MarketResult<Cart> {
        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let mut index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let cart = carts
            .get_mut(cart_id)
            .ok_or_else(|| MarketError::CartNotFound(cart_id.to_string()))?;

        if cart.is_expired(Utc::now()) {
            return Err(MarketError::CartExpired(cart_id.to_string()));
        }
        if cart.status != CartStatus::Active {
            return Err(MarketError::Conflict(format!(
                "cart {cart_id} is no longer active"
            )));
        }

        cart.status = CartStatus::Converted;
        cart.touch();
        index.remove(&cart.customer_id);

        tracing::info!(cart = %cart_id, "cart converted to order");
        Ok(cart.clone())
    }

    /// Marks expired active carts abandoned. Returns how many were swept.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> MarketResult<usize> {
        let mut carts = self.carts.lock().map_err(|_| MarketError::Lock)?;
        let mut index = self.active_by_customer.lock().map_err(|_| MarketError::Lock)?;

        let mut swept = 0;
        for cart in carts.values_mut() {
            if cart.status == CartStatus::Active && cart.is_expired(now) {
                cart.status = CartStatus::Abandoned;
                cart.touch();
                index.remove(&cart.customer_id);
                swept += 1;
            }
        }

        if swept > 0 {
            tracing::info!(count = swept, "abandoned expired carts");
        }
        Ok(swept)
    }

    /// Spawns the background reaper that sweeps expired carts on an
    /// interval, independent of request handling.
    pub fn spawn_reaper(
        service: Arc<Self>, every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                if let Err(err) = service.sweep_expired(Utc::now()) {
                    tracing::warn!(error = %err, "cart reaper sweep failed");
                }
            }
        })
    }

    /// Locates the customer's active, non-empty cart for mutation.
    fn active_cart_mut<'a>(
        carts: &'a mut HashMap<CartId, Cart>, index: &HashMap<CustomerId, CartId>,
        customer_id: &CustomerId,
    ) -> MarketResult<&'a mut Cart> {
        let id = index
            .get(customer_id)
            .ok_or_else(|| MarketError::CartNotFound(customer_id.to_string()))?;

        let cart = carts
            .get_mut(id)
            .ok_or_else(|| MarketError::CartNotFound(customer_id.to_string()))?;

        if !cart.is_active(Utc::now()) || cart.is_empty() {
            return Err(MarketError::CartNotFound(customer_id.to_string()));
        }
        Ok(cart)
    }

    fn validate_special_request(&self, request: Option<&str>) -> MarketResult<()> {
        if let Some(text) = request {
            if text.chars().count() > self.config.max_special_request_chars {
                return Err(MarketError::Validation(format!(
                    "special request exceeds {} characters",
                    self.config.max_special_request_chars
                )));
            }
        }
        Ok(())
    }
}
