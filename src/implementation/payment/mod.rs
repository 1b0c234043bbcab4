//! Payment gateway
//!
//! The gateway is an opaque external service: the core only knows
//! success-with-reference or typed failure. Charges are wrapped in a
//! bounded timeout; an ambiguous outcome (timeout, transport error) is
//! treated as a failed charge, which checkout records without aborting the
//! order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{MarketError, MarketResult};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cash,
    /// Card, charged through the gateway at order time.
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Card => write!(f, "card"),
        }
    }
}

/// Successful charge result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeOutcome {
    /// Gateway-side transaction reference.
    pub reference: String,
}

/// External payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount for an order. Declines come back as
    /// `MarketError::PaymentFailed`.
    async fn charge(
        &self, order_id: &str, amount_cents: u64, method: PaymentMethod,
    ) -> MarketResult<ChargeOutcome>;
}

/// Charges with a hard deadline, mapping a timeout to a failed charge.
pub async fn charge_with_timeout(
    gateway: &dyn PaymentGateway, deadline: Duration, order_id: &str, amount_cents: u64,
    method: PaymentMethod,
) -> MarketResult<ChargeOutcome> {
    match tokio::time::timeout(deadline, gateway.charge(order_id, amount_cents, method)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(order = order_id, "payment gateway timed out, treating as failed");
            Err(MarketError::PaymentFailed(format!(
                "gateway did not answer within {}s",
                deadline.as_secs()
            )))
        },
    }
}

/// Scripted behavior of the in-memory gateway.
#[derive(Debug, Clone)]
pub enum ChargeBehavior {
    /// Approve every charge.
    Approve,
    /// Decline every charge with a reason.
    Decline(String),
    /// Sleep before answering, to exercise the timeout path.
    Stall(Duration),
}

/// In-memory gateway with scripted behavior; records every charge it sees.
#[derive(Debug)]
pub struct InMemoryPaymentGateway {
    behavior: Mutex<ChargeBehavior>,
    charges:  Arc<Mutex<HashMap<String, u64>>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that approves everything.
    #[must_use]
    pub fn approving() -> Self {
        Self::with_behavior(ChargeBehavior::Approve)
    }

    /// Creates a gateway with the given script.
    #[must_use]
    pub fn with_behavior(behavior: ChargeBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            charges:  Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replaces the script.
    pub fn set_behavior(&self, behavior: ChargeBehavior) -> MarketResult<()> {
        *self.behavior.lock().map_err(|_| MarketError::Lock)? = behavior;
        Ok(())
    }

    /// Amount charged for an order, if any charge was attempted.
    pub fn charged_amount(&self, order_id: &str) -> MarketResult<Option<u64>> {
        Ok(self
            .charges
            .lock()
            .map_err(|_| MarketError::Lock)?
            .get(order_id)
            .copied())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn charge(
        &self, order_id: &str, amount_cents: u64, method: PaymentMethod,
    ) -> MarketResult<ChargeOutcome> {
        let behavior = self
            .behavior
            .lock()
            .map_err(|_| MarketError::Lock)?
            .clone();

        if let ChargeBehavior::Stall(delay) = behavior {
            tokio::time::sleep(delay).await;
        }

        self.charges
            .lock()
            .map_err(|_| MarketError::Lock)?
            .insert(order_id.to_string(), amount_cents);

        match behavior {
            ChargeBehavior::Decline(reason) => Err(MarketError::PaymentFailed(reason)),
            ChargeBehavior::Approve | ChargeBehavior::Stall(_) => Ok(ChargeOutcome {
                reference: format!("ch_{}_{}", method, uuid::Uuid::new_v4().simple()),
            }),
        }
    }
}
