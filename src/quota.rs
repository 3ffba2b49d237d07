//! # Quota Ledger Module
//!
//! Per-chat daily free-analysis count and purchased-credit balance. The free
//! count resets on day rollover, credits carry over unchanged. Check and
//! consume are separate operations; callers pair them while holding the chat
//! session lock so the pair is atomic per event (see `session`).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::DayKey;
use crate::config::QuotaConfig;
use crate::errors::CoreError;

/// Per-chat usage counters, keyed by the quota day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub day: DayKey,
    pub free_count: u32,
    pub credits: u32,
}

impl UsageRecord {
    pub fn new(day: DayKey) -> Self {
        Self {
            day,
            free_count: 0,
            credits: 0,
        }
    }
}

/// Which quota source an allowed analysis draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaMode {
    Credit,
    Free,
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed(QuotaMode),
    Denied,
}

/// Reset the free counter when the stored day is stale. Credits are untouched.
pub fn rollover(record: &mut UsageRecord, today: DayKey) {
    if record.day != today {
        debug!(old_day = %record.day, new_day = %today, "Quota day rollover, resetting free count");
        record.day = today;
        record.free_count = 0;
    }
}

/// Decide whether one more analysis is allowed and from which source.
/// Credits take precedence over the free tier.
pub fn check_quota(record: &mut UsageRecord, today: DayKey, config: &QuotaConfig) -> QuotaDecision {
    rollover(record, today);

    if record.credits > 0 {
        QuotaDecision::Allowed(QuotaMode::Credit)
    } else if record.free_count < config.free_daily_limit {
        QuotaDecision::Allowed(QuotaMode::Free)
    } else {
        QuotaDecision::Denied
    }
}

/// Spend one analysis from the source a prior `check_quota` selected.
/// Must only be called for an allowed decision, under the same session lock.
pub fn consume_one(record: &mut UsageRecord, mode: QuotaMode) {
    match mode {
        QuotaMode::Credit => record.credits = record.credits.saturating_sub(1),
        QuotaMode::Free => record.free_count += 1,
    }
}

/// Check and consume as one step. The caller holds the chat session lock,
/// which makes the check-then-act pair atomic with respect to concurrent
/// events for the same chat.
pub fn try_consume(
    record: &mut UsageRecord,
    today: DayKey,
    config: &QuotaConfig,
) -> Result<QuotaMode, CoreError> {
    match check_quota(record, today, config) {
        QuotaDecision::Allowed(mode) => {
            consume_one(record, mode);
            Ok(mode)
        }
        QuotaDecision::Denied => Err(CoreError::QuotaExceeded),
    }
}

/// Give back an attempt spent by `try_consume`. Only used when the analysis
/// call failed and `refund_on_failure` is enabled.
pub fn refund_one(record: &mut UsageRecord, mode: QuotaMode) {
    match mode {
        QuotaMode::Credit => record.credits += 1,
        QuotaMode::Free => record.free_count = record.free_count.saturating_sub(1),
    }
}

/// Credit a confirmed purchase. Additive, no upper bound.
pub fn credit_top_up(record: &mut UsageRecord, amount: u32) {
    record.credits += amount;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> DayKey {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_free_tier_precedence_without_credits() {
        let config = QuotaConfig::default();
        let mut record = UsageRecord::new(day(1));

        let decision = check_quota(&mut record, day(1), &config);
        assert_eq!(decision, QuotaDecision::Allowed(QuotaMode::Free));
    }

    #[test]
    fn test_credits_take_precedence_over_free_tier() {
        let config = QuotaConfig::default();
        let mut record = UsageRecord::new(day(1));
        record.credits = 2;

        let mode = try_consume(&mut record, day(1), &config).unwrap();
        assert_eq!(mode, QuotaMode::Credit);
        assert_eq!(record.credits, 1);
        assert_eq!(record.free_count, 0);
    }

    #[test]
    fn test_rollover_resets_free_count_but_keeps_credits() {
        let config = QuotaConfig::default();
        let mut record = UsageRecord::new(day(1));
        record.free_count = config.free_daily_limit;
        record.credits = 3;

        let decision = check_quota(&mut record, day(2), &config);
        assert_eq!(decision, QuotaDecision::Allowed(QuotaMode::Credit));
        assert_eq!(record.free_count, 0);
        assert_eq!(record.credits, 3);
    }

    #[test]
    fn test_refund_restores_free_attempt() {
        let config = QuotaConfig::default();
        let mut record = UsageRecord::new(day(1));

        let mode = try_consume(&mut record, day(1), &config).unwrap();
        assert_eq!(record.free_count, 1);
        refund_one(&mut record, mode);
        assert_eq!(record.free_count, 0);
    }
}
