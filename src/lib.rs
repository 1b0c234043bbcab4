//! # Mercato
//!
//! Delivery marketplace core connecting customers, merchant partners, and
//! couriers through a shared order lifecycle: a single-restaurant cart
//! aggregate, an atomic cart-to-order checkout transaction, a multi-party
//! order state machine, and a zone-based delivery pricing engine.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

pub mod errors;
pub mod implementation;
pub mod marketplace;
pub mod types;

// Re-exports for the public API
pub use errors::{ErrorKind, MarketError, MarketResult};
pub use implementation::{
    cart_system::{AddItemCommand, Cart, CartService, UpdateItemCommand},
    catalog::CatalogService,
    checkout::{CheckoutOutcome, CheckoutService, CheckoutWarnings, PlaceOrderCommand},
    geo_pricing::ZoneDirectory,
    inventory::{InMemoryInventory, InventoryGateway},
    order_management::types::{Actor, ActorRole, Order, OrderService, OrderStatus},
    payment::{InMemoryPaymentGateway, PaymentGateway, PaymentMethod},
};
pub use marketplace::{CourierOrders, CustomerOrders, PartnerOrders};
pub use types::MarketConfig;
