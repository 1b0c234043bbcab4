//! Core identifiers and status enums for order management

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Internal order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Cow<'static, str>);

impl OrderId {
    /// Creates a new order ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Generates a new unique order ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Cow::Owned(format!("order-{}", uuid::Uuid::new_v4())))
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable order number: `ORD-YYYYMMDD-NNNN`.
///
/// Date-prefixed with a zero-padded daily sequence; globally unique and
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    /// Composes a number from a date and that day's sequence value.
    #[must_use]
    pub fn compose(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("ORD-{}-{:04}", date.format("%Y%m%d"), sequence))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Courier identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourierId(pub Cow<'static, str>);

impl CourierId {
    /// Creates a new courier ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a courier ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

impl std::fmt::Display for CourierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ACTORS
// ============================================================================

/// Role of an authenticated actor. Supplied by the identity provider; the
/// core trusts the claim and enforces only its own transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    /// Ordering customer.
    Customer,
    /// Merchant partner fulfilling the order.
    Partner,
    /// Courier delivering the order.
    Courier,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Partner => write!(f, "partner"),
            Self::Courier => write!(f, "courier"),
        }
    }
}

/// Authenticated actor performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor ID within its role's namespace.
    pub id:   String,
    /// Claimed role.
    pub role: ActorRole,
}

impl Actor {
    /// Customer actor.
    #[must_use]
    pub fn customer(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Customer }
    }

    /// Partner actor.
    #[must_use]
    pub fn partner(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Partner }
    }

    /// Courier actor.
    #[must_use]
    pub fn courier(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: ActorRole::Courier }
    }
}

// ============================================================================
// STATUS ENUMS
// ============================================================================

/// Order status.
///
/// Statuses only move forward; `Delivered` and `Cancelled` are terminal.
/// The tracking log is the canonical history — this enum is the cached
/// projection of its last entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Waiting for the partner's decision.
    #[default]
    Pending,
    /// Partner accepted the order.
    Accepted,
    /// Kitchen is preparing.
    Preparing,
    /// Packed and waiting for a courier.
    ReadyForPickup,
    /// Courier is on the way.
    OutForDelivery,
    /// Handed to the customer.
    Delivered,
    /// Cancelled before preparation finished.
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether cancellation is still allowed from this status.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// The transition-ownership table: whether `role` may move an order
    /// from this status to `next`.
    #[must_use]
    pub fn can_transition(&self, next: OrderStatus, role: ActorRole) -> bool {
        use ActorRole::{Courier, Customer, Partner};
        use OrderStatus::{
            Accepted, Cancelled, Delivered, OutForDelivery, Pending, Preparing, ReadyForPickup,
        };

        matches!(
            (*self, next, role),
            (Pending, Accepted, Partner)
                | (Pending, Cancelled, Partner | Customer)
                | (Accepted, Cancelled, Partner | Customer)
                | (Accepted, Preparing, Partner)
                | (Preparing, ReadyForPickup, Partner)
                | (ReadyForPickup, OutForDelivery, Courier)
                | (OutForDelivery, Delivered, Courier)
        )
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Preparing => "Preparing",
            Self::ReadyForPickup => "Ready for Pickup",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Awaiting payment (cash orders until delivery).
    #[default]
    Pending,
    /// Charge in flight at the gateway.
    Processing,
    /// Charge captured.
    Completed,
    /// Charge declined, errored, or timed out; the order survives.
    Failed,
    /// Captured charge refunded after cancellation.
    Refunded,
}

impl PaymentStatus {
    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Refunded => "Refunded",
        }
    }
}
