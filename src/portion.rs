//! # Portion Recalculation Module
//!
//! Rescales the cached nutrition estimate when the user corrects the portion
//! size, either as absolute grams or as a fraction of a known baseline. On
//! success the cached estimate is rebased so the next correction chains from
//! the latest values rather than the original ones.

use tracing::debug;

use crate::budget::{self, UserProfile};
use crate::clock::DayKey;
use crate::errors::CoreError;

/// A user-supplied portion refinement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortionCorrection {
    /// Absolute portion size in grams
    Grams(u32),
    /// Fraction of a known baseline (package total, else estimated portion)
    Fraction(f64),
}

/// Result of a successful rescale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescaled {
    pub grams: u32,
    pub new_kcal: u32,
}

/// Rescale the cached estimate and replace its contribution to today's
/// consumption. The caller holds the chat session lock, so the read-modify-
/// write is atomic per event.
pub fn rescale(
    profile: &mut UserProfile,
    correction: PortionCorrection,
    today: DayKey,
) -> Result<Rescaled, CoreError> {
    budget::rollover(profile, today);

    let estimate = profile
        .last_analysis
        .as_ref()
        .ok_or(CoreError::NoPriorAnalysis)?;

    let grams = match correction {
        PortionCorrection::Grams(g) => f64::from(g),
        PortionCorrection::Fraction(fraction) => {
            if !fraction.is_finite() || fraction <= 0.0 {
                return Err(CoreError::InvalidPortion(format!(
                    "fraction must be positive, got {fraction}"
                )));
            }
            let baseline = estimate
                .package_total_g
                .or(estimate.portion_estimate_g)
                .ok_or(CoreError::InsufficientData)?;
            baseline * fraction
        }
    };

    let new_kcal = if let Some(per_100g) = estimate.per_100g_kcal {
        (per_100g * grams / 100.0).round()
    } else {
        match estimate.portion_estimate_g {
            Some(prior_grams) if prior_grams > 0.0 => {
                (estimate.calories_estimate * grams / prior_grams).round()
            }
            _ => return Err(CoreError::InsufficientData),
        }
    };
    let new_kcal = new_kcal.max(0.0) as u32;
    let grams = grams.round().max(0.0) as u32;

    // Replace, not add, the prior contribution to today's consumption.
    let previous = estimate.calories_estimate.max(0.0).round() as u32;
    profile.consumed_today = profile
        .consumed_today
        .saturating_sub(previous)
        .saturating_add(new_kcal);

    debug!(grams, new_kcal, previous, "Portion rescaled");

    // Rebase so a subsequent correction chains from the latest values.
    if let Some(estimate) = profile.last_analysis.as_mut() {
        estimate.calories_estimate = f64::from(new_kcal);
        estimate.portion_estimate_g = Some(f64::from(grams));
    }

    Ok(Rescaled { grams, new_kcal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisEstimate, Macros};
    use crate::config::BudgetConfig;
    use chrono::NaiveDate;

    fn day() -> DayKey {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn estimate() -> AnalysisEstimate {
        AnalysisEstimate {
            dish_name: "Granola".to_string(),
            calories_estimate: 230.0,
            macros: Macros::default(),
            portion_estimate_g: Some(50.0),
            portion_confidence: Some(0.6),
            package_total_g: Some(400.0),
            per_100g_kcal: Some(460.0),
            tips: vec![],
            suggested_portion_options: vec![],
        }
    }

    fn profile_with(estimate: AnalysisEstimate) -> UserProfile {
        let mut profile = UserProfile::new(day(), &BudgetConfig::default());
        profile.consumed_today = estimate.calories_estimate.round() as u32;
        profile.last_analysis = Some(estimate);
        profile
    }

    #[test]
    fn test_rescale_fails_without_prior_analysis() {
        let mut profile = UserProfile::new(day(), &BudgetConfig::default());
        let result = rescale(&mut profile, PortionCorrection::Grams(100), day());
        assert_eq!(result, Err(CoreError::NoPriorAnalysis));
    }

    #[test]
    fn test_grams_correction_uses_per_100g_path() {
        let mut profile = profile_with(estimate());
        let rescaled = rescale(&mut profile, PortionCorrection::Grams(25), day()).unwrap();
        assert_eq!(rescaled.new_kcal, 115);
        assert_eq!(profile.consumed_today, 115);
    }

    #[test]
    fn test_fraction_prefers_package_total() {
        let mut profile = profile_with(estimate());
        let rescaled = rescale(&mut profile, PortionCorrection::Fraction(0.5), day()).unwrap();
        // 0.5 of the 400 g package, not of the 50 g portion estimate
        assert_eq!(rescaled.grams, 200);
        assert_eq!(rescaled.new_kcal, 920);
    }

    #[test]
    fn test_fraction_falls_back_to_portion_estimate() {
        let mut est = estimate();
        est.package_total_g = None;
        let mut profile = profile_with(est);
        let rescaled = rescale(&mut profile, PortionCorrection::Fraction(0.5), day()).unwrap();
        assert_eq!(rescaled.grams, 25);
    }

    #[test]
    fn test_ratio_fallback_without_per_100g() {
        let mut est = estimate();
        est.per_100g_kcal = None;
        let mut profile = profile_with(est);
        // 230 kcal for 50 g -> 100 g is 460 kcal
        let rescaled = rescale(&mut profile, PortionCorrection::Grams(100), day()).unwrap();
        assert_eq!(rescaled.new_kcal, 460);
    }

    #[test]
    fn test_insufficient_data_without_any_baseline() {
        let mut est = estimate();
        est.per_100g_kcal = None;
        est.portion_estimate_g = None;
        est.package_total_g = None;
        let mut profile = profile_with(est);
        assert_eq!(
            rescale(&mut profile, PortionCorrection::Grams(100), day()),
            Err(CoreError::InsufficientData)
        );
        assert_eq!(
            rescale(&mut profile, PortionCorrection::Fraction(0.5), day()),
            Err(CoreError::InsufficientData)
        );
    }

    #[test]
    fn test_corrections_chain_from_latest_base() {
        let mut est = estimate();
        est.per_100g_kcal = Some(50.0);
        est.package_total_g = Some(400.0);
        est.calories_estimate = 100.0;
        est.portion_estimate_g = Some(150.0);
        let mut profile = profile_with(est);

        let first = rescale(&mut profile, PortionCorrection::Grams(200), day()).unwrap();
        assert_eq!(first.new_kcal, 100);

        let second = rescale(&mut profile, PortionCorrection::Fraction(0.5), day()).unwrap();
        assert_eq!(second.grams, 200);
        assert_eq!(second.new_kcal, 100);

        let cached = profile.last_analysis.as_ref().unwrap();
        assert_eq!(cached.calories_estimate, 100.0);
        assert_eq!(cached.portion_estimate_g, Some(200.0));
    }

    #[test]
    fn test_rescale_replaces_prior_contribution() {
        let mut profile = profile_with(estimate());
        profile.consumed_today = 1000; // 230 of which came from this dish

        rescale(&mut profile, PortionCorrection::Grams(25), day()).unwrap();
        assert_eq!(profile.consumed_today, 1000 - 230 + 115);
    }
}
