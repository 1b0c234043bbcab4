//! Type definitions for the marketplace core

use serde::{Deserialize, Serialize};

/// Tunable knobs for pricing, cart lifetime, and gateway behavior.
///
/// Services take a copy at construction; the defaults are the production
/// values and every test that cares about a knob overrides just that knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Service fee charged on the subtotal, in basis points (200 = 2%).
    pub service_fee_bps:            u32,
    /// Lower clamp for a quoted delivery fee, in cents.
    pub delivery_fee_min_cents:     u64,
    /// Upper clamp for a quoted delivery fee, in cents.
    pub delivery_fee_max_cents:     u64,
    /// Surcharge per kilometre beyond the free-distance threshold, in cents.
    pub per_km_fee_cents:           u64,
    /// Distance threshold before the per-km surcharge applies, in km.
    pub free_distance_km:           f64,
    /// Minutes added to the delivery ETA per kilometre of distance.
    pub eta_minutes_per_km:         f64,
    /// Hours an active cart lives before the reaper abandons it.
    pub cart_ttl_hours:             i64,
    /// Seconds the checkout waits on the payment gateway before treating
    /// the charge as failed.
    pub payment_timeout_secs:       u64,
    /// Maximum length of a free-text special request.
    pub max_special_request_chars:  usize,
}

impl MarketConfig {
    /// Cart time-to-live as a duration.
    #[must_use]
    pub fn cart_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cart_ttl_hours)
    }

    /// Payment gateway timeout as a duration.
    #[must_use]
    pub fn payment_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.payment_timeout_secs)
    }

    /// Service fee on a subtotal, half-up rounded to whole cents.
    #[must_use]
    pub fn service_fee_cents(&self, subtotal_cents: u64) -> u64 {
        (subtotal_cents * u64::from(self.service_fee_bps) + 5_000) / 10_000
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            service_fee_bps:           200,
            delivery_fee_min_cents:    150,
            delivery_fee_max_cents:    1_200,
            per_km_fee_cents:          80,
            free_distance_km:          5.0,
            eta_minutes_per_km:        2.0,
            cart_ttl_hours:            24,
            payment_timeout_secs:      10,
            max_special_request_chars: 500,
        }
    }
}

pub mod catalog;
pub mod geo;
