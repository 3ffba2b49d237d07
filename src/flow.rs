//! Input-awaiting flow module for gating numeric text input.
//!
//! A chat is either idle, waiting for a weight value, or waiting for a
//! manual portion size. Each awaiting state is exited by exactly one
//! successful parse back to `Idle`; a failed parse leaves the state
//! unchanged so the user can retry indefinitely.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::budget::{self, UserProfile};
use crate::clock::DayKey;
use crate::config::{BotConfig, PortionConfig};
use crate::errors::CoreError;
use crate::portion::{self, PortionCorrection, Rescaled};

/// What the next textual input from a chat will be interpreted as.
///
/// A tagged enum rather than boolean flags, so waiting for a weight and a
/// portion at the same time is structurally impossible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwaitingInput {
    #[default]
    Idle,
    Weight,
    PortionGrams,
}

lazy_static! {
    static ref NUMBER_TOKEN: Regex = Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap();
    static ref INTEGER_TOKEN: Regex = Regex::new(r"(\d+)").unwrap();
}

/// Extract the first numeric token from free text as kilograms.
/// Comma decimal separators are tolerated ("72,5" -> 72.5).
/// Range validation happens in the budget tracker, not here.
pub fn extract_weight_kg(text: &str) -> Option<f64> {
    let captures = NUMBER_TOKEN.captures(text.trim())?;
    captures.get(1)?.as_str().replace(',', ".").parse::<f64>().ok()
}

/// True when the message is nothing but a numeric token, i.e. the user most
/// likely typed a bare weight outside any awaiting state.
pub fn is_bare_number(text: &str) -> bool {
    let trimmed = text.trim();
    NUMBER_TOKEN
        .find(trimmed)
        .map(|m| m.start() == 0 && m.end() == trimmed.len())
        .unwrap_or(false)
}

/// Parse a manual portion entry as integer grams within the accepted range.
pub fn parse_portion_grams(text: &str, config: &PortionConfig) -> Result<u32, CoreError> {
    let trimmed = text.trim();
    let grams: u32 = INTEGER_TOKEN
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| CoreError::InvalidPortion(format!("not a number: {trimmed}")))?;

    if grams < config.min_grams || grams > config.max_grams {
        return Err(CoreError::InvalidPortion(format!(
            "{grams} g outside [{}, {}]",
            config.min_grams, config.max_grams
        )));
    }

    Ok(grams)
}

/// What a textual input did to the awaiting flow
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Weight accepted, daily target recomputed; back to `Idle`
    WeightSet(u32),
    /// Input did not contain a numeric token; still `AwaitingWeight`
    WeightUnparsed,
    /// Numeric but outside the accepted range; still `AwaitingWeight`
    WeightOutOfRange,
    /// Portion grams accepted and the estimate rescaled; back to `Idle`
    PortionApplied(Rescaled),
    /// Grams parsed but the rescale failed; back to `Idle`, no mutation
    PortionRescaleFailed(CoreError),
    /// Input did not parse as grams; still `AwaitingPortionGrams`
    PortionRejected(CoreError),
    /// The chat was not awaiting anything
    NotAwaiting,
}

/// Run one textual input through the awaiting flow. Each awaiting state is
/// exited only by a successful parse; the caller holds the chat session
/// lock, so the read-and-transition is atomic per event.
pub fn handle_awaited_text(
    profile: &mut UserProfile,
    text: &str,
    config: &BotConfig,
    today: DayKey,
) -> FlowOutcome {
    match profile.awaiting {
        AwaitingInput::Idle => FlowOutcome::NotAwaiting,
        AwaitingInput::Weight => {
            let Some(kg) = extract_weight_kg(text) else {
                return FlowOutcome::WeightUnparsed;
            };
            match budget::set_weight(profile, kg, &config.budget) {
                Ok(target) => {
                    profile.awaiting = AwaitingInput::Idle;
                    FlowOutcome::WeightSet(target)
                }
                Err(_) => FlowOutcome::WeightOutOfRange,
            }
        }
        AwaitingInput::PortionGrams => match parse_portion_grams(text, &config.portion) {
            Ok(grams) => {
                profile.awaiting = AwaitingInput::Idle;
                match portion::rescale(profile, PortionCorrection::Grams(grams), today) {
                    Ok(rescaled) => FlowOutcome::PortionApplied(rescaled),
                    Err(e) => FlowOutcome::PortionRescaleFailed(e),
                }
            }
            Err(e) => FlowOutcome::PortionRejected(e),
        },
    }
}
