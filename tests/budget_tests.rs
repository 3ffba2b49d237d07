use anyhow::Result;
use chrono::NaiveDate;

use kcal_bot::budget::{record_consumption, remaining_today, set_weight, UserProfile};
use kcal_bot::clock::DayKey;
use kcal_bot::config::BudgetConfig;
use kcal_bot::errors::CoreError;

fn day(d: u32) -> DayKey {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn new_profile() -> UserProfile {
    UserProfile::new(day(1), &BudgetConfig::default())
}

/// weight=70, factor=1.4 gives a 2352 kcal target; 500 eaten leaves 1852
#[test]
fn test_daily_target_and_remaining_formula() -> Result<()> {
    let config = BudgetConfig::default();
    let mut profile = new_profile();

    let target = set_weight(&mut profile, 70.0, &config)?;
    assert_eq!(target, 2352);

    record_consumption(&mut profile, 500, day(1));
    assert_eq!(remaining_today(&mut profile, day(1)), Some(1852));

    Ok(())
}

/// remaining_today is None exactly when a weight was never provided
#[test]
fn test_remaining_none_without_weight() {
    let mut profile = new_profile();
    record_consumption(&mut profile, 400, day(1));
    assert_eq!(remaining_today(&mut profile, day(1)), None);
}

/// Boundary weights: 19 and 301 rejected, 72 accepted with target 2419
#[test]
fn test_weight_validation_bounds() {
    let config = BudgetConfig::default();
    let mut profile = new_profile();

    assert!(matches!(
        set_weight(&mut profile, 19.0, &config),
        Err(CoreError::OutOfRange(_))
    ));
    assert!(matches!(
        set_weight(&mut profile, 301.0, &config),
        Err(CoreError::OutOfRange(_))
    ));
    assert_eq!(profile.weight_kg, None);

    assert_eq!(set_weight(&mut profile, 72.0, &config).unwrap(), 2419);
}

/// Consumption resets exactly once on the first touch of a new day
#[test]
fn test_consumption_day_rollover_is_idempotent() -> Result<()> {
    let config = BudgetConfig::default();
    let mut profile = new_profile();
    set_weight(&mut profile, 70.0, &config)?;
    record_consumption(&mut profile, 800, day(1));

    // First access on the new day resets, further accesses accumulate
    record_consumption(&mut profile, 300, day(2));
    assert_eq!(profile.consumed_today, 300);
    record_consumption(&mut profile, 200, day(2));
    assert_eq!(profile.consumed_today, 500);

    Ok(())
}

/// Changing weight keeps the already-consumed amount for the day
#[test]
fn test_weight_change_preserves_consumption() -> Result<()> {
    let config = BudgetConfig::default();
    let mut profile = new_profile();
    set_weight(&mut profile, 70.0, &config)?;
    record_consumption(&mut profile, 1000, day(1));

    set_weight(&mut profile, 80.0, &config)?;
    assert_eq!(profile.daily_target, Some(2688));
    assert_eq!(remaining_today(&mut profile, day(1)), Some(1688));

    Ok(())
}
