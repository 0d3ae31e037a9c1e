use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Default for Complexity {
    fn default() -> Self {
        Complexity::Moderate
    }
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

/// Pitch ratio (rise over 12 run) bucketed for labor adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PitchCategory {
    Standard,
    Steep,
    VerySteep,
}

impl PitchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PitchCategory::Standard => "standard",
            PitchCategory::Steep => "steep",
            PitchCategory::VerySteep => "very_steep",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementSource {
    Satellite,
    Manual,
}

impl MeasurementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementSource::Satellite => "satellite",
            MeasurementSource::Manual => "manual",
        }
    }
}

/// One package from the pricing catalog (good/better/best). Loaded by the
/// catalog collaborator, read-only during a calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    pub tier: String,
    pub display_name: String,
    pub material_price_per_sqft: f64,
    pub labor_price_per_sqft: f64,
    pub warranty_years: u32,
    pub warranty_type: String,
    pub shingle_type: String,
    pub features: Vec<String>,
}

impl PricingTier {
    /// Reject malformed catalog entries before they reach arithmetic. A zero
    /// or negative rate would produce a zero-priced quote, which must never
    /// reach a customer.
    pub fn validate(&self) -> Result<()> {
        if self.tier.is_empty() {
            return Err(anyhow!("pricing tier is missing an id"));
        }
        if !(self.material_price_per_sqft.is_finite() && self.material_price_per_sqft > 0.0) {
            return Err(anyhow!(
                "tier '{}' has invalid materialPricePerSqft {}",
                self.tier,
                self.material_price_per_sqft
            ));
        }
        if !(self.labor_price_per_sqft.is_finite() && self.labor_price_per_sqft > 0.0) {
            return Err(anyhow!(
                "tier '{}' has invalid laborPricePerSqft {}",
                self.tier,
                self.labor_price_per_sqft
            ));
        }
        Ok(())
    }
}

/// Computed pricing for a single tier. Derived on every call, never persisted
/// by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierPricing {
    pub tier: String,
    pub display_name: String,
    pub base_price: f64,
    pub adjusted_price: f64,
    pub price_per_sqft: f64,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub deposit: f64,
    pub monthly_estimate: f64,
}

/// Envelope for one full pricing run across all tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotePricing {
    pub sqft: f64,
    pub sqft_source: MeasurementSource,
    pub complexity: Complexity,
    pub pitch: PitchCategory,
    pub complexity_multiplier: f64,
    pub pitch_multiplier: f64,
    pub tiers: Vec<TierPricing>,
    pub expires_at: DateTime<Utc>,
}

impl QuotePricing {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Min/max pricing for a tier when only a regional sqft estimate is known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub tier: String,
    pub display_name: String,
    pub price_min: f64,
    pub price_max: f64,
    pub deposit_min: f64,
    pub deposit_max: f64,
}
