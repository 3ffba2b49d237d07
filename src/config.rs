//! # Bot Configuration Module
//!
//! This module defines configuration structures for quota, energy budget,
//! portion correction and analysis behaviour, plus the numeric constants
//! the product formulas are built on.

// Constants for bot configuration
pub const FREE_DAILY_LIMIT: u32 = 5;
pub const DEFAULT_ACTIVITY_FACTOR: f64 = 1.4; // formula: weight x 24 x factor
pub const MIN_WEIGHT_KG: f64 = 20.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;
pub const MIN_PORTION_G: u32 = 1;
pub const MAX_PORTION_G: u32 = 2000;
pub const CREDITS_PER_PURCHASE: u32 = 50;

/// Quota ledger configuration
#[derive(Debug, Clone)]
pub struct QuotaConfig {
    /// Free analyses available per chat per calendar day
    pub free_daily_limit: u32,
    /// Credits added for a confirmed purchase without an explicit pack size
    pub credits_per_purchase: u32,
    /// Refund the spent quota attempt when the analysis call fails.
    /// The original product spends the attempt regardless; kept behind a
    /// flag because the intended behaviour is an open question.
    pub refund_on_failure: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_daily_limit: FREE_DAILY_LIMIT,
            credits_per_purchase: CREDITS_PER_PURCHASE,
            refund_on_failure: false,
        }
    }
}

/// Energy budget configuration
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Lowest accepted body weight in kilograms
    pub min_weight_kg: f64,
    /// Highest accepted body weight in kilograms
    pub max_weight_kg: f64,
    /// Activity factor used when the user never picked one
    pub default_activity_factor: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            min_weight_kg: MIN_WEIGHT_KG,
            max_weight_kg: MAX_WEIGHT_KG,
            default_activity_factor: DEFAULT_ACTIVITY_FACTOR,
        }
    }
}

/// Portion correction configuration
#[derive(Debug, Clone)]
pub struct PortionConfig {
    /// Smallest accepted manual portion in grams
    pub min_grams: u32,
    /// Largest accepted manual portion in grams
    pub max_grams: u32,
}

impl Default for PortionConfig {
    fn default() -> Self {
        Self {
            min_grams: MIN_PORTION_G,
            max_grams: MAX_PORTION_G,
        }
    }
}

/// Vision analysis call configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// OpenAI model used for the vision call
    pub model: String,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single analysis request in seconds
    pub request_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_retries: 2,
            base_retry_delay_ms: 1000,  // 1 second
            max_retry_delay_ms: 8000,   // 8 seconds
            request_timeout_secs: 45,
        }
    }
}

/// Top-level configuration for the bot core
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    pub quota: QuotaConfig,
    pub budget: BudgetConfig,
    pub portion: PortionConfig,
    pub analysis: AnalysisConfig,
}
