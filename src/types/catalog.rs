//! Catalog types: restaurants, products, and option schemas
//!
//! The catalog is the live side of the marketplace. Carts and orders never
//! hold references into it; they copy what they need into snapshots at the
//! moment of interaction so later catalog edits cannot rewrite history.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::geo::GeoPoint;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Unique product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub Cow<'static, str>);

impl ProductId {
    /// Creates a new product ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a product ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique restaurant (merchant partner) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub Cow<'static, str>);

impl RestaurantId {
    /// Creates a new restaurant ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a restaurant ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// MONEY
// ============================================================================

/// Currency code (ISO 4217).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    /// Creates a new currency code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Euro.
    #[must_use]
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    /// US Dollar.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::eur()
    }
}

/// Price in the smallest currency unit (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in cents.
    pub amount_cents: u64,
    /// Currency code.
    pub currency:     Currency,
}

impl Price {
    /// Creates a new price.
    #[must_use]
    pub fn new(amount_cents: u64, currency: Currency) -> Self {
        Self { amount_cents, currency }
    }

    /// Creates a price in euros.
    #[must_use]
    pub fn eur(amount_cents: u64) -> Self {
        Self::new(amount_cents, Currency::eur())
    }

    /// Display amount with two decimal places applied.
    #[must_use]
    pub fn display_amount(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.display_amount(), self.currency.0)
    }
}

// ============================================================================
// PRODUCT OPTION SCHEMA
// ============================================================================

/// Selectable option within an option group (e.g. "large" in "size").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option identifier, unique within its group.
    pub id:          Cow<'static, str>,
    /// Display name.
    pub name:        Cow<'static, str>,
    /// Price delta in cents added to the unit price.
    pub price_cents: u64,
}

impl ProductOption {
    /// Creates a new option.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price_cents: u64) -> Self {
        Self {
            id:   Cow::Owned(id.into()),
            name: Cow::Owned(name.into()),
            price_cents,
        }
    }
}

/// Group of options a customer picks from (e.g. "size", "toppings").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Group identifier, unique within the product.
    pub id:      Cow<'static, str>,
    /// Display name.
    pub name:    Cow<'static, str>,
    /// Options in this group.
    pub options: Vec<ProductOption>,
}

impl OptionGroup {
    /// Creates a new option group.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, options: Vec<ProductOption>) -> Self {
        Self {
            id:   Cow::Owned(id.into()),
            name: Cow::Owned(name.into()),
            options,
        }
    }

    /// Looks up an option by ID.
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

/// Product category. Decides whether the inventory gateway tracks stock
/// for the product: prepared food is made to order and never decremented,
/// everything else is a physical unit on a shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductCategory {
    /// Cooked to order by the restaurant kitchen.
    #[default]
    PreparedFood,
    /// Bottled or canned drinks.
    Beverage,
    /// Packaged grocery goods.
    Grocery,
    /// Baked goods made in batches.
    Bakery,
    /// Non-food retail items.
    Retail,
}

impl ProductCategory {
    /// Whether units of this category are counted by the inventory gateway.
    #[must_use]
    pub fn is_stock_tracked(&self) -> bool {
        !matches!(self, Self::PreparedFood)
    }
}

/// Product in a restaurant's menu or shelf listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id:            ProductId,
    /// Owning restaurant.
    pub restaurant_id: RestaurantId,
    /// Display title.
    pub title:         String,
    /// Longer description.
    pub description:   Option<String>,
    /// Unit price.
    pub price:         Price,
    /// Image URL.
    pub image_url:     Option<String>,
    /// Category.
    pub category:      ProductCategory,
    /// Option schema the customer selects from.
    pub option_groups: Vec<OptionGroup>,
    /// Whether the product is published at all.
    pub active:        bool,
    /// Whether the restaurant currently offers it (e.g. not sold out of
    /// ingredients). Toggled by the partner without unpublishing.
    pub available:     bool,
}

impl Product {
    /// Creates a new active, available product with no options.
    #[must_use]
    pub fn new(
        id: ProductId, restaurant_id: RestaurantId, title: impl Into<String>, price: Price,
    ) -> Self {
        Self {
            id,
            restaurant_id,
            title: title.into(),
            description: None,
            price,
            image_url: None,
            category: ProductCategory::default(),
            option_groups: Vec::new(),
            active: true,
            available: true,
        }
    }

    /// Whether the product can be added to a cart or ordered right now.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.active && self.available
    }

    /// Looks up an option group by ID.
    #[must_use]
    pub fn option_group(&self, group_id: &str) -> Option<&OptionGroup> {
        self.option_groups.iter().find(|g| g.id == group_id)
    }
}

// ============================================================================
// RESTAURANT
// ============================================================================

/// Merchant partner: a restaurant or shop fulfilling orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    /// Restaurant ID.
    pub id:                      RestaurantId,
    /// Display name.
    pub name:                    String,
    /// Cuisine or shop category ("pizza", "grocery", ...).
    pub category:                String,
    /// Pickup location used for distance calculations.
    pub location:                GeoPoint,
    /// Base delivery fee shown before a destination is known, in cents.
    pub base_delivery_fee_cents: u64,
    /// Minimum order subtotal in cents.
    pub minimum_order_cents:     u64,
    /// Whether onboarding review approved the partner.
    pub approved:                bool,
    /// Whether the partner is currently taking orders.
    pub active:                  bool,
}

impl Restaurant {
    /// Creates a new approved, active restaurant.
    #[must_use]
    pub fn new(
        id: RestaurantId, name: impl Into<String>, category: impl Into<String>, location: GeoPoint,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            location,
            base_delivery_fee_cents: 250,
            minimum_order_cents: 0,
            approved: true,
            active: true,
        }
    }

    /// Whether new carts and orders may target this restaurant.
    #[must_use]
    pub fn is_open_for_orders(&self) -> bool {
        self.approved && self.active
    }
}
