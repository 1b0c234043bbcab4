//! Cart system
//!
//! The mutable pre-order aggregate: one customer session, one restaurant,
//! pricing recomputed on every mutation.

mod cart;
mod item;
mod service;
mod types;

pub use cart::{Cart, CartPricing};
pub use item::CartItem;
pub use service::CartService;
pub use types::{
    AddItemCommand, CartDeliveryQuote, CartId, CartItemId, CartStatus, CustomerId, DeliveryAddress,
    OptionSelection, RestaurantSnapshot, SelectedOption, SessionId, UpdateItemCommand,
};
