//! # Energy Budget Module
//!
//! Per-chat daily calorie target and running consumption. The consumption
//! day rollover is checked on every read or mutation, on its own day key —
//! deliberately independent from the quota ledger's rollover.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::AnalysisEstimate;
use crate::clock::DayKey;
use crate::config::BudgetConfig;
use crate::errors::CoreError;
use crate::flow::AwaitingInput;

/// Per-chat profile: weight, target, consumption and conversation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub weight_kg: Option<f64>,
    pub activity_factor: f64,
    pub daily_target: Option<u32>,
    pub consumed_today: u32,
    pub last_reset_day: DayKey,
    pub awaiting: AwaitingInput,
    pub last_analysis: Option<AnalysisEstimate>,
}

impl UserProfile {
    pub fn new(day: DayKey, config: &BudgetConfig) -> Self {
        Self {
            weight_kg: None,
            activity_factor: config.default_activity_factor,
            daily_target: None,
            consumed_today: 0,
            last_reset_day: day,
            awaiting: AwaitingInput::Idle,
            last_analysis: None,
        }
    }
}

/// Zero the running consumption once per new calendar day.
pub fn rollover(profile: &mut UserProfile, today: DayKey) {
    if profile.last_reset_day != today {
        debug!(old_day = %profile.last_reset_day, new_day = %today, "Consumption day rollover");
        profile.last_reset_day = today;
        profile.consumed_today = 0;
    }
}

/// Validate and store a body weight, recomputing the daily target with the
/// stored or default activity factor. Returns the new target in kcal.
pub fn set_weight(
    profile: &mut UserProfile,
    kg: f64,
    config: &BudgetConfig,
) -> Result<u32, CoreError> {
    if !kg.is_finite() || kg < config.min_weight_kg || kg > config.max_weight_kg {
        return Err(CoreError::OutOfRange(format!(
            "{kg} kg outside [{}, {}]",
            config.min_weight_kg, config.max_weight_kg
        )));
    }

    profile.weight_kg = Some(kg);
    let target = (kg * 24.0 * profile.activity_factor).round() as u32;
    profile.daily_target = Some(target);
    Ok(target)
}

/// Add a non-negative kcal amount to today's consumption. The caller rounds
/// and clamps negative estimates to zero before calling.
pub fn record_consumption(profile: &mut UserProfile, kcal: u32, today: DayKey) {
    rollover(profile, today);
    profile.consumed_today += kcal;
}

/// Kcal left for today, `None` when a weight was never provided.
pub fn remaining_today(profile: &mut UserProfile, today: DayKey) -> Option<u32> {
    rollover(profile, today);
    profile
        .daily_target
        .map(|target| target.saturating_sub(profile.consumed_today))
}
