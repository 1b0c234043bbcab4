//! Catalog service implementation

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    errors::{MarketError, MarketResult},
    types::catalog::{Product, ProductId, Restaurant, RestaurantId},
};

/// Live availability state of a product at a point in time.
///
/// Checkout uses this to partition cart items into orderable and dropped.
#[derive(Debug, Clone)]
pub enum ProductState {
    /// Product exists; inspect its flags for orderability.
    Live(Product),
    /// Product was deleted from the catalog.
    Missing,
}

/// Restaurant and product catalog.
#[derive(Debug)]
pub struct CatalogService {
    /// Restaurants indexed by ID.
    restaurants:            Arc<Mutex<HashMap<RestaurantId, Restaurant>>>,
    /// Products indexed by ID.
    products:               Arc<Mutex<HashMap<ProductId, Product>>>,
    /// Products indexed by restaurant.
    products_by_restaurant: Arc<Mutex<HashMap<RestaurantId, Vec<ProductId>>>>,
}

impl CatalogService {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            restaurants:            Arc::new(Mutex::new(HashMap::new())),
            products:               Arc::new(Mutex::new(HashMap::new())),
            products_by_restaurant: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // ========================================================================
    // RESTAURANT OPERATIONS
    // ========================================================================

    /// Inserts or replaces a restaurant.
    pub fn upsert_restaurant(&self, restaurant: Restaurant) -> MarketResult<()> {
        let mut restaurants = self.restaurants.lock().map_err(|_| MarketError::Lock)?;
        restaurants.insert(restaurant.id.clone(), restaurant);
        Ok(())
    }

    /// Gets a restaurant by ID.
    pub fn restaurant(&self, id: &RestaurantId) -> MarketResult<Restaurant> {
        let restaurants = self.restaurants.lock().map_err(|_| MarketError::Lock)?;
        restaurants
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::RestaurantNotFound(id.to_string()))
    }

    // ========================================================================
    // PRODUCT OPERATIONS
    // ========================================================================

    /// Inserts or replaces a product. The owning restaurant must exist.
    pub fn upsert_product(&self, product: Product) -> MarketResult<()> {
        {
            let restaurants = self.restaurants.lock().map_err(|_| MarketError::Lock)?;
            if !restaurants.contains_key(&product.restaurant_id) {
                return Err(MarketError::RestaurantNotFound(
                    product.restaurant_id.to_string(),
                ));
            }
        }

        let mut products = self.products.lock().map_err(|_| MarketError::Lock)?;
        let mut by_restaurant =
            self.products_by_restaurant.lock().map_err(|_| MarketError::Lock)?;

        let index = by_restaurant.entry(product.restaurant_id.clone()).or_default();
        if !index.contains(&product.id) {
            index.push(product.id.clone());
        }

        products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Gets a product by ID.
    pub fn product(&self, id: &ProductId) -> MarketResult<Product> {
        let products = self.products.lock().map_err(|_| MarketError::Lock)?;
        products
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::ProductNotFound(id.to_string()))
    }

    /// Lists a restaurant's products.
    pub fn restaurant_products(&self, restaurant_id: &RestaurantId) -> MarketResult<Vec<Product>> {
        let products = self.products.lock().map_err(|_| MarketError::Lock)?;
        let by_restaurant =
            self.products_by_restaurant.lock().map_err(|_| MarketError::Lock)?;

        let ids = by_restaurant.get(restaurant_id).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    /// Toggles whether a product is currently offered, without unpublishing.
    pub fn set_product_availability(&self, id: &ProductId, available: bool) -> MarketResult<()> {
        let mut products = self.products.lock().map_err(|_| MarketError::Lock)?;
        let product = products
            .get_mut(id)
            .ok_or_else(|| MarketError::ProductNotFound(id.to_string()))?;

        product.available = available;
        Ok(())
    }

    /// Fetches the current state of a batch of products in one pass.
    ///
    /// Deleted products come back as `Missing` rather than being silently
    /// absent, so callers can tell "never existed" apart from "nothing
    /// requested".
    pub fn products_state(
        &self, ids: &[ProductId],
    ) -> MarketResult<HashMap<ProductId, ProductState>> {
        let products = self.products.lock().map_err(|_| MarketError::Lock)?;

        Ok(ids
            .iter()
            .map(|id| {
                let state = products
                    .get(id)
                    .map(|p| ProductState::Live(p.clone()))
                    .unwrap_or(ProductState::Missing);
                (id.clone(), state)
            })
            .collect())
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}
