use super::types::{Complexity, PitchCategory};

/// Configuration for the pricing calculator with the fixed adjustment tables
/// and deposit rules.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Labor multipliers per roof-shape complexity
    pub multiplier_simple: f64,
    pub multiplier_moderate: f64,
    pub multiplier_complex: f64,

    /// Labor multipliers per pitch category
    pub multiplier_standard_pitch: f64,
    pub multiplier_steep_pitch: f64,
    pub multiplier_very_steep_pitch: f64,

    /// Deposit rate for exact quotes (precise measurement available)
    pub deposit_rate: f64,
    /// Deposit rate for preliminary/range quotes. Intentionally distinct from
    /// `deposit_rate`; the two call sites have never been reconciled.
    pub preliminary_deposit_rate: f64,
    pub deposit_min: f64,
    pub deposit_max: f64,

    /// Divisor for the non-interest monthly display figure (not financing)
    pub monthly_estimate_months: f64,
    /// Quote validity window
    pub quote_validity_days: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            multiplier_simple: 1.0,
            multiplier_moderate: 1.15,
            multiplier_complex: 1.3,
            multiplier_standard_pitch: 1.0,
            multiplier_steep_pitch: 1.1,
            multiplier_very_steep_pitch: 1.2,
            deposit_rate: 0.10,
            preliminary_deposit_rate: 0.05,
            deposit_min: 500.0,
            deposit_max: 2500.0,
            monthly_estimate_months: 48.0,
            quote_validity_days: 30,
        }
    }
}

impl PricingConfig {
    pub fn complexity_multiplier(&self, complexity: Complexity) -> f64 {
        match complexity {
            Complexity::Simple => self.multiplier_simple,
            Complexity::Moderate => self.multiplier_moderate,
            Complexity::Complex => self.multiplier_complex,
        }
    }

    pub fn pitch_multiplier(&self, pitch: PitchCategory) -> f64 {
        match pitch {
            PitchCategory::Standard => self.multiplier_standard_pitch,
            PitchCategory::Steep => self.multiplier_steep_pitch,
            PitchCategory::VerySteep => self.multiplier_very_steep_pitch,
        }
    }
}
