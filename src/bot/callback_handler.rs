//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import core modules
use crate::budget;
use crate::clock;
use crate::flow::AwaitingInput;
use crate::portion::{self, PortionCorrection};

// Import app state
use super::AppState;

// Import handler helpers
use super::message_handler::rescale_reply;
use super::ui_builder::format_tips;

/// Button tokens understood by the bot. Opaque strings on the wire; each
/// maps to exactly one core operation or an informational reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallbackToken {
    How,
    Tips,
    Next,
    PortionManual,
    PortionGrams(u32),
    PortionFraction(f64),
    Buy(u32),
    DiaryAdd,
    RemindMorning,
}

/// Parse a raw callback data string into a token
pub fn parse_callback_token(data: &str) -> Option<CallbackToken> {
    match data {
        "how" => Some(CallbackToken::How),
        "tips" => Some(CallbackToken::Tips),
        "next" => Some(CallbackToken::Next),
        "portion:manual" => Some(CallbackToken::PortionManual),
        "diary:add" => Some(CallbackToken::DiaryAdd),
        "remind:morning" => Some(CallbackToken::RemindMorning),
        _ => {
            if let Some(grams) = data.strip_prefix("portion:g:") {
                grams.parse().ok().map(CallbackToken::PortionGrams)
            } else if let Some(fraction) = data.strip_prefix("portion:frac:") {
                fraction.parse().ok().map(CallbackToken::PortionFraction)
            } else if let Some(pack) = data.strip_prefix("buy:") {
                pack.parse().ok().map(CallbackToken::Buy)
            } else {
                None
            }
        }
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: teloxide::types::CallbackQuery,
    state: Arc<AppState>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let lang = q.from.language_code.clone();
    let lang = lang.as_deref();
    let chat_id = q.message.as_ref().map(|msg| msg.chat().id);
    let token = q.data.as_deref().and_then(parse_callback_token);

    if let (Some(chat_id), Some(token)) = (chat_id, token) {
        let today = clock::today();

        match token {
            CallbackToken::How => {
                let limit = state.config.quota.free_daily_limit.to_string();
                bot.send_message(chat_id, t_args_lang("how-it-works", &[("limit", &limit)], lang))
                    .await?;
            }
            CallbackToken::Tips => {
                let tips = {
                    let session = state.store.session(chat_id, today);
                    let session = session.lock().await;
                    session
                        .profile
                        .last_analysis
                        .as_ref()
                        .map(|estimate| estimate.tips.clone())
                        .unwrap_or_default()
                };
                let reply = if tips.is_empty() {
                    t_lang("tips-not-ready", lang)
                } else {
                    format_tips(&tips, lang)
                };
                bot.send_message(chat_id, reply).await?;
            }
            CallbackToken::Next => {
                bot.send_message(chat_id, t_lang("next-photo", lang)).await?;
            }
            CallbackToken::PortionManual => {
                {
                    let session = state.store.session(chat_id, today);
                    let mut session = session.lock().await;
                    session.profile.awaiting = AwaitingInput::PortionGrams;
                }
                bot.send_message(chat_id, t_lang("portion-manual-prompt", lang))
                    .await?;
            }
            CallbackToken::PortionGrams(grams) => {
                let correction = PortionCorrection::Grams(
                    grams.clamp(state.config.portion.min_grams, state.config.portion.max_grams),
                );
                let reply = apply_correction(&state, chat_id, correction, lang).await;
                bot.send_message(chat_id, reply).await?;
            }
            CallbackToken::PortionFraction(fraction) => {
                let reply =
                    apply_correction(&state, chat_id, PortionCorrection::Fraction(fraction), lang)
                        .await;
                bot.send_message(chat_id, reply).await?;
            }
            CallbackToken::Buy(_) => {
                bot.send_message(chat_id, t_lang("buy-stub", lang)).await?;
            }
            CallbackToken::DiaryAdd => {
                bot.send_message(chat_id, t_lang("diary-stub", lang)).await?;
            }
            CallbackToken::RemindMorning => {
                bot.send_message(chat_id, t_lang("remind-stub", lang)).await?;
            }
        }
    } else {
        debug!(user_id = %q.from.id, "Ignoring callback with unknown token");
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;

    Ok(())
}

/// Rescale under the chat lock and build the user-facing reply
async fn apply_correction(
    state: &AppState,
    chat_id: ChatId,
    correction: PortionCorrection,
    lang: Option<&str>,
) -> String {
    let today = clock::today();
    let session = state.store.session(chat_id, today);
    let mut session = session.lock().await;
    let result = portion::rescale(&mut session.profile, correction, today);
    let remaining = budget::remaining_today(&mut session.profile, today);
    rescale_reply(result, remaining, lang)
}
