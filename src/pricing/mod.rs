pub mod calculator;
pub mod config;
pub mod types;

pub use calculator::{
    calculate_deposit, calculate_preliminary_deposit, calculate_price_ranges,
    calculate_quote_pricing, get_pitch_category, QuoteOptions,
};
pub use config::PricingConfig;
pub use types::{
    Complexity, MeasurementSource, PitchCategory, PriceRange, PricingTier, QuotePricing,
    TierPricing,
};
