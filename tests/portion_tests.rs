use anyhow::Result;
use chrono::NaiveDate;

use kcal_bot::analysis::{AnalysisEstimate, Macros};
use kcal_bot::budget::UserProfile;
use kcal_bot::clock::DayKey;
use kcal_bot::config::BudgetConfig;
use kcal_bot::errors::CoreError;
use kcal_bot::portion::{rescale, PortionCorrection};

fn day() -> DayKey {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn estimate_with_per_100g(per_100g: f64) -> AnalysisEstimate {
    AnalysisEstimate {
        dish_name: "Muesli".to_string(),
        calories_estimate: 75.0,
        macros: Macros::default(),
        portion_estimate_g: Some(150.0),
        portion_confidence: Some(0.5),
        package_total_g: Some(400.0),
        per_100g_kcal: Some(per_100g),
        tips: vec!["Use milk instead of cream".to_string()],
        suggested_portion_options: vec![],
    }
}

fn profile_with(estimate: AnalysisEstimate) -> UserProfile {
    let mut profile = UserProfile::new(day(), &BudgetConfig::default());
    profile.consumed_today = estimate.calories_estimate.max(0.0).round() as u32;
    profile.last_analysis = Some(estimate);
    profile
}

/// The chaining example: per100g=50, 200 g gives 100 kcal; a following
/// half-package correction resolves to 200 g and recomputes from the same
/// per-100g path against the updated base
#[test]
fn test_rescale_chaining_stays_consistent() -> Result<()> {
    let mut profile = profile_with(estimate_with_per_100g(50.0));

    let first = rescale(&mut profile, PortionCorrection::Grams(200), day())?;
    assert_eq!(first.new_kcal, 100);

    let cached = profile.last_analysis.as_ref().unwrap();
    assert_eq!(cached.calories_estimate, 100.0);
    assert_eq!(cached.portion_estimate_g, Some(200.0));

    let second = rescale(&mut profile, PortionCorrection::Fraction(0.5), day())?;
    assert_eq!(second.grams, 200);
    assert_eq!(second.new_kcal, 100);
    assert_eq!(profile.consumed_today, 100);

    Ok(())
}

/// Fractions resolve against the package total before the portion estimate
#[test]
fn test_fraction_baseline_preference_order() -> Result<()> {
    let mut profile = profile_with(estimate_with_per_100g(50.0));
    let rescaled = rescale(&mut profile, PortionCorrection::Fraction(0.25), day())?;
    // quarter of the 400 g package, not of the 150 g portion
    assert_eq!(rescaled.grams, 100);

    let mut estimate = estimate_with_per_100g(50.0);
    estimate.package_total_g = None;
    let mut profile = profile_with(estimate);
    let rescaled = rescale(&mut profile, PortionCorrection::Fraction(0.5), day())?;
    assert_eq!(rescaled.grams, 75);

    Ok(())
}

/// Without per-100g data the prior kcal/portion ratio is used
#[test]
fn test_ratio_path_when_per_100g_missing() -> Result<()> {
    let mut estimate = estimate_with_per_100g(50.0);
    estimate.per_100g_kcal = None;
    // 75 kcal per 150 g
    let mut profile = profile_with(estimate);

    let rescaled = rescale(&mut profile, PortionCorrection::Grams(300), day())?;
    assert_eq!(rescaled.new_kcal, 150);

    Ok(())
}

/// Corrections replace the prior contribution in the daily consumption,
/// leaving unrelated consumption untouched
#[test]
fn test_rescale_replaces_only_own_contribution() -> Result<()> {
    let mut profile = profile_with(estimate_with_per_100g(50.0));
    profile.consumed_today += 1200; // other meals

    rescale(&mut profile, PortionCorrection::Grams(100), day())?;
    // 75 replaced by 50
    assert_eq!(profile.consumed_today, 1200 + 50);

    Ok(())
}

/// Error taxonomy: no analysis, no baseline, bad fraction
#[test]
fn test_rescale_error_cases() {
    let mut empty = UserProfile::new(day(), &BudgetConfig::default());
    assert_eq!(
        rescale(&mut empty, PortionCorrection::Grams(100), day()),
        Err(CoreError::NoPriorAnalysis)
    );

    let mut estimate = estimate_with_per_100g(50.0);
    estimate.package_total_g = None;
    estimate.portion_estimate_g = None;
    let mut profile = profile_with(estimate);
    assert_eq!(
        rescale(&mut profile, PortionCorrection::Fraction(0.5), day()),
        Err(CoreError::InsufficientData)
    );

    let mut profile = profile_with(estimate_with_per_100g(50.0));
    assert!(matches!(
        rescale(&mut profile, PortionCorrection::Fraction(0.0), day()),
        Err(CoreError::InvalidPortion(_))
    ));
    assert!(matches!(
        rescale(&mut profile, PortionCorrection::Fraction(f64::NAN), day()),
        Err(CoreError::InvalidPortion(_))
    ));
}

/// A failed rescale leaves consumption and the cached estimate untouched
#[test]
fn test_failed_rescale_mutates_nothing() {
    let mut estimate = estimate_with_per_100g(50.0);
    estimate.per_100g_kcal = None;
    estimate.portion_estimate_g = None;
    estimate.package_total_g = None;
    let mut profile = profile_with(estimate);
    let consumed_before = profile.consumed_today;

    let result = rescale(&mut profile, PortionCorrection::Grams(100), day());
    assert_eq!(result, Err(CoreError::InsufficientData));
    assert_eq!(profile.consumed_today, consumed_before);
    assert_eq!(
        profile.last_analysis.as_ref().unwrap().calories_estimate,
        75.0
    );
}
