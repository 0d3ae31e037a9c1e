//! Core of the lead-to-cash quoting flow: acquiring a roof measurement from
//! the satellite provider (with delay handling, timeouts, and a manual-entry
//! fallback) and turning an accepted measurement into tiered price quotes.
//!
//! The HTTP/UI layer, persistence, and the provider itself live outside this
//! crate and talk to it through [`measurement::MeasurementProvider`], the
//! controller surface, and the pure pricing functions.

pub mod measurement;
pub mod money;
pub mod pricing;

pub use measurement::{
    check_timeout, ManualRoofData, MeasurementConfig, MeasurementContext, MeasurementController,
    MeasurementEvent, MeasurementProvider, MeasurementSnapshot, MeasurementState,
    MeasurementUpdate, RoofMeasurement,
};
pub use pricing::{
    calculate_deposit, calculate_preliminary_deposit, calculate_price_ranges,
    calculate_quote_pricing, get_pitch_category, Complexity, MeasurementSource, PitchCategory,
    PriceRange, PricingConfig, PricingTier, QuoteOptions, QuotePricing, TierPricing,
};
