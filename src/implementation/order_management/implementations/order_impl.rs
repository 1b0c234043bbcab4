//! Order aggregate business logic
//!
//! Transition checks live here on the aggregate; the service wraps them in
//! its lock so the check and the write are one atomic step.

use chrono::Utc;

use crate::errors::{MarketError, MarketResult};

use super::super::types::{
    basic_types::{Actor, ActorRole, OrderStatus, PaymentStatus},
    main_order_types::Order,
    order_types::{OrderRating, TrackingEntry},
    service_types::RatingCommand,
};

impl Order {
    /// Applies a status transition for an actor, appending the tracking
    /// entry that makes it part of the audit trail.
    ///
    /// Terminal orders refuse with `OrderClosed`; transitions outside the
    /// ownership table refuse with `InvalidTransition` and leave the order
    /// untouched.
    pub fn apply_transition(
        &mut self, next: OrderStatus, actor: &Actor, note: Option<String>,
    ) -> MarketResult<()> {
        if self.status.is_terminal() {
            return Err(MarketError::OrderClosed(self.id.to_string()));
        }
        if !self.status.can_transition(next, actor.role) {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                to:   next,
                role: actor.role,
            });
        }

        self.status = next;
        self.tracking
            .push(TrackingEntry::new(next, actor.id.clone(), actor.role, note));
        self.touch();

        tracing::info!(order = %self.number, status = %next, actor = %actor.id, "order transitioned");
        Ok(())
    }

    /// Appends a non-transition note to the tracking log (payment events,
    /// refund intents). The status column repeats the current status.
    pub fn append_note(&mut self, actor: &Actor, note: impl Into<String>) {
        self.tracking.push(TrackingEntry::new(
            self.status,
            actor.id.clone(),
            actor.role,
            Some(note.into()),
        ));
        self.touch();
    }

    /// Records a successful card charge.
    pub fn mark_payment_completed(&mut self, actor: &Actor, reference: impl Into<String>) {
        let reference = reference.into();
        self.payment_status = PaymentStatus::Completed;
        self.payment_ref = Some(reference.clone());
        self.append_note(actor, format!("payment completed ({reference})"));
    }

    /// Records a failed card charge. The order survives: it stays
    /// cancellable and retryable instead of becoming a lost cart.
    pub fn mark_payment_failed(&mut self, actor: &Actor, reason: impl Into<String>) {
        self.payment_status = PaymentStatus::Failed;
        self.append_note(actor, format!("payment failed: {}", reason.into()));
    }

    /// Stores the customer's rating. Delivered orders only, at most once,
    /// values 1–5.
    pub fn set_rating(&mut self, actor: &Actor, command: &RatingCommand) -> MarketResult<()> {
        if actor.role != ActorRole::Customer {
            return Err(MarketError::Validation(format!(
                "only the customer may rate, got {}",
                actor.role
            )));
        }
        if self.status != OrderStatus::Delivered {
            return Err(MarketError::NotRatable(self.id.to_string()));
        }
        if self.rating.is_some() {
            return Err(MarketError::AlreadyRated(self.id.to_string()));
        }

        let valid = (1..=5).contains(&command.partner_rating)
            && command.courier_rating.is_none_or(|r| (1..=5).contains(&r));
        if !valid {
            return Err(MarketError::Validation("ratings must be between 1 and 5".to_string()));
        }

        self.rating = Some(OrderRating {
            partner_rating: command.partner_rating,
            courier_rating: command.courier_rating,
            comment:        command.comment.clone(),
            rated_at:       Utc::now(),
        });
        self.append_note(actor, "rating submitted");
        Ok(())
    }

    /// Whether this order still accepts cancellation.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Records a mutation: bumps the version and update timestamp.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
