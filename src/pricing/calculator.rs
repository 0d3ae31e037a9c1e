use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use log::debug;

use crate::money::{clamp_dollars, round_cents, round_dollars};
use crate::pricing::config::PricingConfig;
use crate::pricing::types::{
    Complexity, MeasurementSource, PitchCategory, PriceRange, PricingTier, QuotePricing,
    TierPricing,
};

/// Caller-supplied adjustment inputs for a pricing run.
#[derive(Debug, Clone)]
pub struct QuoteOptions {
    pub complexity: Complexity,
    /// Roof pitch as rise over 12 run
    pub pitch_ratio: f64,
    pub sqft_source: MeasurementSource,
}

impl Default for QuoteOptions {
    fn default() -> Self {
        Self {
            complexity: Complexity::Moderate,
            pitch_ratio: 6.0,
            sqft_source: MeasurementSource::Satellite,
        }
    }
}

/// Bucket a pitch ratio into its labor-adjustment category. Total over f64:
/// every ratio maps to exactly one category.
pub fn get_pitch_category(pitch_ratio: f64) -> PitchCategory {
    if pitch_ratio > 10.0 {
        PitchCategory::VerySteep
    } else if pitch_ratio >= 8.0 {
        PitchCategory::Steep
    } else {
        PitchCategory::Standard
    }
}

/// Deposit for an exact quote: 10% of the adjusted price, clamped.
pub fn calculate_deposit(total_price: f64, config: &PricingConfig) -> f64 {
    clamp_dollars(
        total_price * config.deposit_rate,
        config.deposit_min,
        config.deposit_max,
    )
}

/// Deposit for a preliminary/range quote: 5% rate, same clamp. Kept separate
/// from `calculate_deposit` on purpose; the two call sites use different
/// rates and must not be unified without checking both.
pub fn calculate_preliminary_deposit(total_price: f64, config: &PricingConfig) -> f64 {
    clamp_dollars(
        total_price * config.preliminary_deposit_rate,
        config.deposit_min,
        config.deposit_max,
    )
}

/// Produce per-tier prices and deposits for a measured roof.
///
/// Only labor is adjusted by complexity/pitch; material is a flat per-area
/// rate. Every monetary intermediate is rounded to whole dollars before
/// summation.
pub fn calculate_quote_pricing(
    sqft: f64,
    tiers: &[PricingTier],
    options: &QuoteOptions,
    config: &PricingConfig,
) -> Result<QuotePricing> {
    if !(sqft.is_finite() && sqft > 0.0) {
        return Err(anyhow!("sqft must be positive, got {sqft}"));
    }
    if tiers.is_empty() {
        return Err(anyhow!("tier catalog is empty"));
    }

    let pitch = get_pitch_category(options.pitch_ratio);
    let complexity_multiplier = config.complexity_multiplier(options.complexity);
    let pitch_multiplier = config.pitch_multiplier(pitch);

    let mut priced = Vec::with_capacity(tiers.len());
    for tier in tiers {
        tier.validate()?;

        let material_cost = round_dollars(sqft * tier.material_price_per_sqft);
        let labor_cost =
            round_dollars(sqft * tier.labor_price_per_sqft * complexity_multiplier * pitch_multiplier);
        // Unadjusted reference price, retained for display/comparison
        let base_price = material_cost + round_dollars(sqft * tier.labor_price_per_sqft);
        let adjusted_price = material_cost + labor_cost;

        priced.push(TierPricing {
            tier: tier.tier.clone(),
            display_name: tier.display_name.clone(),
            base_price,
            adjusted_price,
            price_per_sqft: round_cents(adjusted_price / sqft),
            material_cost,
            labor_cost,
            deposit: calculate_deposit(adjusted_price, config),
            monthly_estimate: round_dollars(adjusted_price / config.monthly_estimate_months),
        });
    }

    debug!(
        "Priced {} tiers for {sqft} sqft ({} complexity, {} pitch)",
        priced.len(),
        options.complexity.as_str(),
        pitch.as_str()
    );

    Ok(QuotePricing {
        sqft,
        sqft_source: options.sqft_source,
        complexity: options.complexity,
        pitch,
        complexity_multiplier,
        pitch_multiplier,
        tiers: priced,
        expires_at: Utc::now() + Duration::days(config.quote_validity_days),
    })
}

/// Price bounds per tier from a regional sqft estimate. Uses the combined
/// per-sqft rate with no complexity/pitch adjustment, and the preliminary
/// deposit rate at both bounds.
pub fn calculate_price_ranges(
    sqft_min: f64,
    sqft_max: f64,
    tiers: &[PricingTier],
    config: &PricingConfig,
) -> Result<Vec<PriceRange>> {
    if !(sqft_min.is_finite() && sqft_max.is_finite() && sqft_min > 0.0 && sqft_min <= sqft_max) {
        return Err(anyhow!(
            "invalid sqft range {sqft_min}..{sqft_max}; need 0 < min <= max"
        ));
    }
    if tiers.is_empty() {
        return Err(anyhow!("tier catalog is empty"));
    }

    let mut ranges = Vec::with_capacity(tiers.len());
    for tier in tiers {
        tier.validate()?;

        let rate = tier.material_price_per_sqft + tier.labor_price_per_sqft;
        let price_min = round_dollars(sqft_min * rate);
        let price_max = round_dollars(sqft_max * rate);

        ranges.push(PriceRange {
            tier: tier.tier.clone(),
            display_name: tier.display_name.clone(),
            price_min,
            price_max,
            deposit_min: calculate_preliminary_deposit(price_min, config),
            deposit_max: calculate_preliminary_deposit(price_max, config),
        });
    }

    Ok(ranges)
}
