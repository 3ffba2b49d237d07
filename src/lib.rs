//! # Calorie Photo Telegram Bot
//!
//! A Telegram bot that estimates meal calories from a photo and tracks a
//! per-chat daily energy budget and analysis quota, with portion corrections
//! rescaling the last cached estimate.

pub mod analysis;
pub mod bot;
pub mod budget;
pub mod clock;
pub mod config;
pub mod errors;
pub mod flow;
pub mod localization;
pub mod portion;
pub mod quota;
pub mod session;
