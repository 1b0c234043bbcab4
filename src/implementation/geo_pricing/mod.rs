//! Zone lookup, distance, and delivery fee calculation
//!
//! Pure calculation engine: no storage, no I/O. Both the cart (delivery
//! quotes) and checkout (final order fees) price through here so the two
//! can never disagree about the formula.

use crate::{
    errors::{MarketError, MarketResult},
    types::{
        geo::{DeliveryZone, GeoPoint},
        MarketConfig,
    },
};

/// Mean Earth radius in km.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points, in km.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Priced delivery offer for a concrete destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryQuote {
    /// Zone that priced the delivery.
    pub zone_number: u32,
    /// Restaurant-to-destination distance in km.
    pub distance_km: f64,
    /// Delivery fee in cents, clamped to the configured band.
    pub fee_cents:   u64,
    /// Estimated delivery time in minutes.
    pub eta_minutes: u32,
}

/// Zone lookup table.
///
/// Reference data: built once at startup, shared immutably afterwards.
#[derive(Debug, Default)]
pub struct ZoneDirectory {
    zones: Vec<DeliveryZone>,
}

impl ZoneDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self { zones: Vec::new() }
    }

    /// Adds a zone.
    ///
    /// Rejects a zone whose number is already present or whose postal codes
    /// overlap an existing zone — every serviceable postal code maps to
    /// exactly one zone.
    pub fn insert(&mut self, zone: DeliveryZone) -> MarketResult<()> {
        for existing in &self.zones {
            if existing.zone_number == zone.zone_number {
                return Err(MarketError::Validation(format!(
                    "zone number {} already registered",
                    zone.zone_number
                )));
            }
            if let Some(code) = zone.postal_codes.intersection(&existing.postal_codes).next() {
                return Err(MarketError::Validation(format!(
                    "postal code {} already served by zone {}",
                    code, existing.zone_number
                )));
            }
        }

        self.zones.push(zone);
        Ok(())
    }

    /// Resolves the zone serving a destination.
    ///
    /// Exact postal-code match wins; when the postal code is unknown and
    /// coordinates are given, the nearest zone whose fallback radius covers
    /// the point is used. `None` means "cannot deliver here" — callers must
    /// not treat it as an error.
    #[must_use]
    pub fn resolve(&self, postal_code: &str, coordinates: Option<GeoPoint>) -> Option<&DeliveryZone> {
        if let Some(zone) = self.zones.iter().find(|z| z.covers_postal(postal_code)) {
            return Some(zone);
        }

        let point = coordinates?;
        self.zones
            .iter()
            .filter_map(|zone| {
                let distance = haversine_km(zone.center, point);
                (distance <= zone.radius_km).then_some((zone, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(zone, _)| zone)
    }
}

/// Prices a delivery over a resolved zone.
///
/// Fee = zone base fee, plus a per-km surcharge for every km beyond the
/// free-distance threshold, plus a flat surcharge per additional restaurant
/// in the session, clamped to the configured band. ETA grows linearly with
/// distance from the zone's baseline.
///
/// A distance beyond the zone's hard limit yields `OutOfRange`, never a
/// degraded price.
pub fn quote_delivery_fee(
    distance_km: f64, zone: &DeliveryZone, restaurant_count: u32, config: &MarketConfig,
) -> MarketResult<DeliveryQuote> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(MarketError::Validation(format!(
            "invalid distance: {distance_km}"
        )));
    }
    if distance_km > zone.max_distance_km {
        return Err(MarketError::OutOfRange(format!(
            "{distance_km:.1} km exceeds zone {} limit of {:.1} km",
            zone.zone_number, zone.max_distance_km
        )));
    }

    let mut fee = zone.base_fee_cents;

    let surcharged_km = (distance_km - config.free_distance_km).max(0.0);
    fee += (surcharged_km * config.per_km_fee_cents as f64).round() as u64;

    fee += u64::from(restaurant_count.saturating_sub(1)) * zone.extra_restaurant_fee_cents;

    let fee = fee.clamp(config.delivery_fee_min_cents, config.delivery_fee_max_cents);

    let eta_minutes =
        zone.default_eta_minutes + (distance_km * config.eta_minutes_per_km).round() as u32;

    Ok(DeliveryQuote {
        zone_number: zone.zone_number,
        distance_km,
        fee_cents: fee,
        eta_minutes,
    })
}
