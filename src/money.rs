//! Shared rounding and clamping helpers for monetary values.
//!
//! Every monetary intermediate (material cost, labor cost, base price terms)
//! is rounded to whole dollars *before* being summed, so totals are sums of
//! already-rounded integers. Per-sqft display rates are the only values kept
//! at cent precision.

/// Round to the nearest whole dollar (half away from zero).
pub fn round_dollars(value: f64) -> f64 {
    value.round()
}

/// Round to cents (2 decimal places).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp a dollar amount into an inclusive range.
pub fn clamp_dollars(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}
