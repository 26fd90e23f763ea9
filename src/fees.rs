//! Distance-tiered fee resolution.
//!
//! The same resolver runs against two independent tier lists: the
//! customer-facing delivery charge (`delivery_ranges`) and the internal
//! driver payout (`driver_fee_ranges`). Resolution is total: an unmatched
//! distance falls back to the store's flat fee on the customer side and to
//! zero on the driver side.

use std::cmp::Ordering;

use crate::models::{DeliveryRange, FeeMode, StoreSettings};

/// Find the price of the first tier covering `distance_km`, scanning in
/// ascending `min_km` order. Bounds are inclusive, so a zero-width tier
/// (`min_km == max_km`) matches exactly that distance. Overlapping tiers
/// resolve to the first match by policy, not by list order as stored.
pub fn resolve_range(distance_km: f64, tiers: &[DeliveryRange]) -> Option<f64> {
    let mut sorted: Vec<&DeliveryRange> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.min_km.partial_cmp(&b.min_km).unwrap_or(Ordering::Equal));
    sorted
        .iter()
        .find(|t| t.min_km <= distance_km && distance_km <= t.max_km)
        .map(|t| t.price)
}

/// Customer delivery fee for this order, per the store's configured
/// strategy. Flat mode ignores tiers entirely; tiered mode falls back to
/// the flat amount when the distance is unknown or outside every range.
pub fn customer_delivery_fee(settings: &StoreSettings, distance_km: Option<f64>) -> f64 {
    match settings.fee_mode {
        FeeMode::Flat => settings.flat_delivery_fee,
        FeeMode::Tiered => distance_km
            .and_then(|d| resolve_range(d, &settings.delivery_ranges))
            .unwrap_or(settings.flat_delivery_fee),
    }
}

/// Internal driver payout for a delivery at this distance. Always tiered;
/// unmatched distances pay nothing (the payout is then settled manually).
pub fn driver_payout_fee(settings: &StoreSettings, distance_km: Option<f64>) -> f64 {
    distance_km
        .and_then(|d| resolve_range(d, &settings.driver_fee_ranges))
        .unwrap_or(0.0)
}

// ===========================================================================
// Tests
// ===========================================================================
