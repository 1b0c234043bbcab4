//! Geographic types: coordinates and delivery zones

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A point on the globe, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new point.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic delivery-pricing unit.
///
/// A zone is keyed primarily by its postal codes; the center/radius pair is
/// the fallback for destinations whose postal code is unknown to us.
/// Postal codes are disjoint across zones — the directory enforces that on
/// insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZone {
    /// Zone number, unique per directory.
    pub zone_number:                u32,
    /// Postal codes served by this zone.
    pub postal_codes:               BTreeSet<String>,
    /// Base delivery fee in cents.
    pub base_fee_cents:             u64,
    /// Flat surcharge per additional restaurant in a multi-restaurant
    /// session, in cents.
    pub extra_restaurant_fee_cents: u64,
    /// Hard distance limit; beyond this the zone refuses delivery.
    pub max_distance_km:            f64,
    /// Baseline ETA before the distance component, in minutes.
    pub default_eta_minutes:        u32,
    /// Zone center for coordinate-radius fallback matching.
    pub center:                     GeoPoint,
    /// Fallback match radius around the center, in km.
    pub radius_km:                  f64,
}

impl DeliveryZone {
    /// Creates a new zone.
    #[must_use]
    pub fn new(zone_number: u32, center: GeoPoint, postal_codes: impl IntoIterator<Item = String>) -> Self {
        Self {
            zone_number,
            postal_codes: postal_codes.into_iter().collect(),
            base_fee_cents: 250,
            extra_restaurant_fee_cents: 150,
            max_distance_km: 12.0,
            default_eta_minutes: 25,
            center,
            radius_km: 6.0,
        }
    }

    /// Whether the zone serves a postal code.
    #[must_use]
    pub fn covers_postal(&self, postal_code: &str) -> bool {
        self.postal_codes.contains(postal_code)
    }
}
