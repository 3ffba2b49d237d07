//! # Core Error Types Module
//!
//! This module defines custom error types used throughout the session and
//! quota core. It provides structured error handling for validation,
//! quota and portion recalculation failure modes.

/// Custom error types for core operations
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Weight outside the accepted range
    OutOfRange(String),
    /// Manual portion input unparsable or outside the accepted range
    InvalidPortion(String),
    /// No free analyses left and no credits on the balance
    QuotaExceeded,
    /// Portion correction requested before any analysis was cached
    NoPriorAnalysis,
    /// Cached estimate lacks the baselines needed to rescale
    InsufficientData,
    /// Vision analysis call failed or returned unparsable data
    Analysis(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::OutOfRange(msg) => write!(f, "Weight out of range: {msg}"),
            CoreError::InvalidPortion(msg) => write!(f, "Invalid portion: {msg}"),
            CoreError::QuotaExceeded => write!(f, "Daily analysis quota exceeded"),
            CoreError::NoPriorAnalysis => write!(f, "No prior analysis cached for this chat"),
            CoreError::InsufficientData => write!(f, "Insufficient data to rescale the estimate"),
            CoreError::Analysis(msg) => write!(f, "Analysis error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
