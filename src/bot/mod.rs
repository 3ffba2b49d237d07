//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles incoming text, photo, document and payment messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

use crate::analysis::AnalysisClient;
use crate::config::BotConfig;
use crate::session::SessionStore;

/// Shared state handed to every handler invocation
pub struct AppState {
    pub store: SessionStore,
    pub config: BotConfig,
    pub analyzer: AnalysisClient,
}

impl AppState {
    pub fn new(config: BotConfig, analyzer: AnalysisClient) -> Self {
        Self {
            store: SessionStore::new(config.budget.clone()),
            config,
            analyzer,
        }
    }
}

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use callback_handler::{parse_callback_token, CallbackToken};
pub use ui_builder::{format_meal_card, format_tips, portion_keyboard};
