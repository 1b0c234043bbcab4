//! Error types for the marketplace core

use thiserror::Error;

use crate::implementation::order_management::types::basic_types::{ActorRole, OrderStatus};

/// Marketplace-wide error type.
#[derive(Debug, Clone, Error)]
pub enum MarketError {
    /// Lock acquisition failed.
    #[error("failed to acquire lock")]
    Lock,
    /// Cart not found.
    #[error("cart not found: {0}")]
    CartNotFound(String),
    /// Cart is not active (converted, abandoned, or expired).
    #[error("cart is not active: {0}")]
    CartNotActive(String),
    /// Cart has passed its expiry timestamp.
    #[error("cart has expired: {0}")]
    CartExpired(String),
    /// Item not in cart.
    #[error("item not in cart: {0}")]
    ItemNotInCart(String),
    /// Cart already holds items from another restaurant.
    #[error("cart belongs to restaurant {cart_restaurant}, product belongs to {product_restaurant}")]
    RestaurantMismatch {
        /// Restaurant the cart was opened for.
        cart_restaurant:    String,
        /// Restaurant owning the rejected product.
        product_restaurant: String,
    },
    /// Product not found.
    #[error("product not found: {0}")]
    ProductNotFound(String),
    /// Product exists but cannot be ordered right now.
    #[error("product not available: {0}")]
    ProductNotAvailable(String),
    /// Restaurant not found.
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(String),
    /// Restaurant exists but is inactive or unapproved.
    #[error("restaurant not available: {0}")]
    RestaurantNotAvailable(String),
    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(String),
    /// Requested status change is not in the transition table.
    #[error("invalid transition from {from} to {to} by {role}")]
    InvalidTransition {
        /// Current order status.
        from: OrderStatus,
        /// Requested order status.
        to:   OrderStatus,
        /// Role that attempted the transition.
        role: ActorRole,
    },
    /// Order is in a terminal state and cannot be mutated.
    #[error("order is closed: {0}")]
    OrderClosed(String),
    /// Another courier already claimed the order.
    #[error("order already claimed: {0}")]
    AlreadyClaimed(String),
    /// Order was already rated.
    #[error("order already rated: {0}")]
    AlreadyRated(String),
    /// Rating attempted before the order was delivered.
    #[error("order not ratable yet: {0}")]
    NotRatable(String),
    /// Malformed quantity, option selection, rating value, or free text.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Quantity must be at least one.
    #[error("invalid quantity")]
    InvalidQuantity,
    /// No delivery zone covers the destination, or it is too far away.
    #[error("delivery unavailable: {0}")]
    OutOfRange(String),
    /// Order subtotal is below the restaurant minimum.
    #[error("minimum order amount not met: minimum {minimum_cents}, subtotal {subtotal_cents}")]
    MinimumNotMet {
        /// Restaurant minimum in cents.
        minimum_cents:  u64,
        /// Actual subtotal in cents.
        subtotal_cents: u64,
    },
    /// Every cart item became unavailable before checkout.
    #[error("no orderable items remain in the cart")]
    EmptyOrder,
    /// Conditional stock decrement failed.
    #[error("insufficient stock for {product_id}: requested {requested}")]
    InsufficientStock {
        /// Product whose stock ran out.
        product_id: String,
        /// Quantity that was requested.
        requested:  u32,
    },
    /// Payment gateway declined, errored, or timed out.
    #[error("payment failed: {0}")]
    PaymentFailed(String),
    /// Concurrent modification lost the race.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Coarse error classification used by callers to dispatch by kind
/// instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent.
    NotFound,
    /// Operation not valid for the current status.
    InvalidState,
    /// Malformed input.
    ValidationFailed,
    /// No deliverable zone.
    OutOfRange,
    /// Subtotal below the restaurant minimum.
    MinimumNotMet,
    /// All items became unavailable.
    EmptyOrder,
    /// Conditional stock decrement failed.
    InsufficientStock,
    /// Payment charge did not succeed.
    PaymentFailed,
    /// Lost a concurrent race.
    Conflict,
    /// Internal synchronization failure.
    Internal,
}

impl MarketError {
    /// Classifies the error for dispatch.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CartNotFound(_)
            | Self::ItemNotInCart(_)
            | Self::ProductNotFound(_)
            | Self::RestaurantNotFound(_)
            | Self::OrderNotFound(_) => ErrorKind::NotFound,
            Self::CartNotActive(_)
            | Self::CartExpired(_)
            | Self::InvalidTransition { .. }
            | Self::OrderClosed(_)
            | Self::AlreadyClaimed(_)
            | Self::AlreadyRated(_)
            | Self::NotRatable(_) => ErrorKind::InvalidState,
            Self::Validation(_)
            | Self::InvalidQuantity
            | Self::ProductNotAvailable(_)
            | Self::RestaurantNotAvailable(_) => ErrorKind::ValidationFailed,
            Self::OutOfRange(_) => ErrorKind::OutOfRange,
            Self::MinimumNotMet { .. } => ErrorKind::MinimumNotMet,
            Self::EmptyOrder => ErrorKind::EmptyOrder,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::PaymentFailed(_) => ErrorKind::PaymentFailed,
            Self::RestaurantMismatch { .. } | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Lock => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the operation as-is.
    ///
    /// Stock exhaustion and lost races during checkout roll the whole
    /// transaction back and are safe to retry; everything else needs a
    /// different request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InsufficientStock | ErrorKind::Conflict | ErrorKind::Internal
        )
    }
}

/// Result type for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;
