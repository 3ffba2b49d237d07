//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import core modules
use crate::analysis::AnalysisOutcome;
use crate::budget;
use crate::clock;
use crate::errors::CoreError;
use crate::flow::{self, AwaitingInput, FlowOutcome};
use crate::portion;
use crate::quota::{self, QuotaMode};

// Import app state
use super::AppState;

// Import UI builder functions
use super::ui_builder::{buy_keyboard, format_meal_card, portion_keyboard, start_keyboard, tips_keyboard};

fn language_code(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str())
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    state: Arc<AppState>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let text = text.trim();
    let lang = language_code(msg);
    let chat_id = msg.chat.id;
    let today = clock::today();

    debug!(user_id = %chat_id, message_length = text.len(), "Received text message from user");

    // Handle /start command
    if text == "/start" {
        bot.send_message(chat_id, t_lang("start-greeting", lang))
            .reply_markup(start_keyboard(lang))
            .await?;
        return Ok(());
    }

    // Handle /help command
    if text == "/help" {
        let limit = state.config.quota.free_daily_limit.to_string();
        bot.send_message(chat_id, t_args_lang("how-it-works", &[("limit", &limit)], lang))
            .await?;
        return Ok(());
    }

    // Handle /stats command
    if text == "/stats" {
        let session = state.store.session(chat_id, today);
        let (free_count, credits, consumed, remaining) = {
            let mut session = session.lock().await;
            quota::rollover(&mut session.usage, today);
            let remaining = budget::remaining_today(&mut session.profile, today);
            (
                session.usage.free_count,
                session.usage.credits,
                session.profile.consumed_today,
                remaining,
            )
        };

        let mut reply = t_args_lang(
            "stats-summary",
            &[
                ("free", &free_count.to_string()),
                ("limit", &state.config.quota.free_daily_limit.to_string()),
                ("credits", &credits.to_string()),
                ("consumed", &consumed.to_string()),
            ],
            lang,
        );
        if let Some(remaining) = remaining {
            reply.push('\n');
            reply.push_str(&t_args_lang(
                "stats-remaining",
                &[("remaining", &remaining.to_string())],
                lang,
            ));
        }
        bot.send_message(chat_id, reply).await?;
        return Ok(());
    }

    // Handle /weight command: enter the awaiting-weight state
    if text == "/weight" {
        let session = state.store.session(chat_id, today);
        let current = {
            let mut session = session.lock().await;
            session.profile.awaiting = AwaitingInput::Weight;
            session.profile.weight_kg
        };

        let current_display = current
            .map(|kg| format!("{kg}"))
            .unwrap_or_else(|| t_lang("weight-unset", lang));
        bot.send_message(
            chat_id,
            t_args_lang("weight-prompt", &[("current", &current_display)], lang),
        )
        .await?;
        return Ok(());
    }

    // The awaiting flow and the opportunistic weight shortcut both mutate
    // session state; the whole decision runs under the chat lock.
    let session = state.store.session(chat_id, today);
    let reply = {
        let mut session = session.lock().await;
        match flow::handle_awaited_text(&mut session.profile, text, &state.config, today) {
            FlowOutcome::WeightSet(target) => {
                info!(user_id = %chat_id, daily_target = target, "Weight set");
                t_args_lang("weight-saved", &[("target", &target.to_string())], lang)
            }
            FlowOutcome::WeightUnparsed => t_lang("weight-invalid", lang),
            FlowOutcome::WeightOutOfRange => weight_range_reply(&state, lang),
            FlowOutcome::PortionApplied(rescaled) => {
                let remaining = budget::remaining_today(&mut session.profile, today);
                rescale_reply(Ok(rescaled), remaining, lang)
            }
            FlowOutcome::PortionRescaleFailed(e) => rescale_reply(Err(e), None, lang),
            FlowOutcome::PortionRejected(_) => t_args_lang(
                "portion-invalid",
                &[
                    ("min", &state.config.portion.min_grams.to_string()),
                    ("max", &state.config.portion.max_grams.to_string()),
                ],
                lang,
            ),
            FlowOutcome::NotAwaiting => {
                // A bare number outside any awaiting state is treated as a
                // weight-setting shortcut
                if flow::is_bare_number(text) {
                    match flow::extract_weight_kg(text)
                        .ok_or_else(|| CoreError::OutOfRange("unparsable".to_string()))
                        .and_then(|kg| {
                            budget::set_weight(&mut session.profile, kg, &state.config.budget)
                        }) {
                        Ok(target) => t_args_lang(
                            "weight-saved-shortcut",
                            &[("target", &target.to_string())],
                            lang,
                        ),
                        Err(_) => weight_range_reply(&state, lang),
                    }
                } else {
                    t_lang("send-photo-prompt", lang)
                }
            }
        }
    };

    bot.send_message(chat_id, reply).await?;
    Ok(())
}

fn weight_range_reply(state: &AppState, lang: Option<&str>) -> String {
    t_args_lang(
        "weight-out-of-range",
        &[
            ("min", &format!("{}", state.config.budget.min_weight_kg)),
            ("max", &format!("{}", state.config.budget.max_weight_kg)),
        ],
        lang,
    )
}

/// Build the user-facing reply for a portion rescale outcome
pub(super) fn rescale_reply(
    result: Result<portion::Rescaled, CoreError>,
    remaining: Option<u32>,
    lang: Option<&str>,
) -> String {
    match result {
        Ok(rescaled) => {
            let mut reply = t_args_lang(
                "portion-updated",
                &[
                    ("grams", &rescaled.grams.to_string()),
                    ("kcal", &rescaled.new_kcal.to_string()),
                ],
                lang,
            );
            if let Some(remaining) = remaining {
                reply.push('\n');
                reply.push_str(&t_args_lang(
                    "stats-remaining",
                    &[("remaining", &remaining.to_string())],
                    lang,
                ));
            }
            reply
        }
        Err(CoreError::NoPriorAnalysis) => t_lang("no-prior-analysis", lang),
        Err(_) => t_lang("insufficient-data", lang),
    }
}

async fn handle_image_message(
    bot: &Bot,
    msg: &Message,
    file_id: teloxide::types::FileId,
    state: Arc<AppState>,
) -> Result<()> {
    let lang = language_code(msg);
    let chat_id = msg.chat.id;
    let today = clock::today();

    debug!(user_id = %chat_id, "Received image message from user");

    let session = state.store.session(chat_id, today);

    // Check and consume one quota attempt atomically under the chat lock
    let mode = {
        let mut session = session.lock().await;
        quota::try_consume(&mut session.usage, today, &state.config.quota)
    };
    let mode = match mode {
        Ok(mode) => mode,
        Err(CoreError::QuotaExceeded) => {
            info!(user_id = %chat_id, "Analysis denied, quota exhausted");
            let limit = state.config.quota.free_daily_limit.to_string();
            bot.send_message(chat_id, t_args_lang("quota-exhausted", &[("limit", &limit)], lang))
                .reply_markup(buy_keyboard(state.config.quota.credits_per_purchase, lang))
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Resolve the Telegram file path; the URL is handed straight to the
    // vision API, nothing is downloaded locally
    let file_url = match bot.get_file(file_id).await {
        Ok(file) => format!(
            "https://api.telegram.org/file/bot{}/{}",
            bot.token(),
            file.path
        ),
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to resolve file path");
            refund_if_configured(&state, &session, mode).await;
            bot.send_message(chat_id, t_lang("download-failed", lang))
                .await?;
            return Ok(());
        }
    };

    let estimate = match state.analyzer.analyze(&file_url).await {
        Ok(AnalysisOutcome::Food(estimate)) => estimate,
        Ok(AnalysisOutcome::NotFood) => {
            info!(user_id = %chat_id, "Photo rejected as not food");
            refund_if_configured(&state, &session, mode).await;
            bot.send_message(chat_id, t_lang("not-food", lang)).await?;
            return Ok(());
        }
        Err(e) => {
            warn!(user_id = %chat_id, error = %e, "Analysis call failed");
            refund_if_configured(&state, &session, mode).await;
            bot.send_message(chat_id, t_lang("analysis-failed", lang))
                .await?;
            return Ok(());
        }
    };

    info!(
        user_id = %chat_id,
        dish = %estimate.dish_name,
        kcal = estimate.calories_estimate,
        "Analysis completed"
    );

    // Cache the analysis and record its calories in one lock hold
    let kcal = estimate.calories_estimate.max(0.0).round() as u32;
    let (remaining, daily_target) = {
        let mut session = session.lock().await;
        session.profile.last_analysis = Some(estimate.clone());
        budget::record_consumption(&mut session.profile, kcal, today);
        let remaining = budget::remaining_today(&mut session.profile, today);
        (remaining, session.profile.daily_target)
    };

    let card = format_meal_card(&estimate, remaining, daily_target, lang);
    bot.send_message(chat_id, card)
        .reply_markup(tips_keyboard(lang))
        .await?;

    // Small natural pause before the follow-up
    tokio::time::sleep(Duration::from_millis(700)).await;

    bot.send_message(chat_id, t_lang("followup-portion", lang))
        .reply_markup(portion_keyboard(&estimate, lang))
        .await?;

    Ok(())
}

async fn refund_if_configured(
    state: &AppState,
    session: &Arc<tokio::sync::Mutex<crate::session::ChatSession>>,
    mode: QuotaMode,
) {
    if state.config.quota.refund_on_failure {
        let mut session = session.lock().await;
        quota::refund_one(&mut session.usage, mode);
    }
}

async fn handle_payment_message(
    bot: &Bot,
    msg: &Message,
    payment: &teloxide::types::SuccessfulPayment,
    state: Arc<AppState>,
) -> Result<()> {
    let lang = language_code(msg);
    let chat_id = msg.chat.id;
    let today = clock::today();

    // Pack size travels in the invoice payload as "credits:<n>"
    let credits = payment
        .invoice_payload
        .strip_prefix("credits:")
        .and_then(|n| n.parse().ok())
        .unwrap_or(state.config.quota.credits_per_purchase);

    {
        let session = state.store.session(chat_id, today);
        let mut session = session.lock().await;
        quota::credit_top_up(&mut session.usage, credits);
    }

    info!(user_id = %chat_id, credits, "Payment confirmed, credits added");
    bot.send_message(
        chat_id,
        t_args_lang("payment-received", &[("credits", &credits.to_string())], lang),
    )
    .await?;
    Ok(())
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    let lang = language_code(msg);
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
    bot.send_message(msg.chat.id, t_lang("send-photo-prompt", lang))
        .await?;
    Ok(())
}

/// Extract the analyzable image reference from a message: the largest photo
/// size, or a document with an image mime type
fn image_file_id(msg: &Message) -> Option<teloxide::types::FileId> {
    if let Some(photos) = msg.photo() {
        return photos.last().map(|photo| photo.file.id.clone());
    }
    if let Some(doc) = msg.document() {
        if let Some(mime_type) = &doc.mime_type {
            if mime_type.to_string().starts_with("image/") {
                return Some(doc.file.id.clone());
            }
        }
    }
    None
}

pub async fn message_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> Result<()> {
    if let Some(payment) = msg.successful_payment() {
        handle_payment_message(&bot, &msg, payment, state).await?;
    } else if msg.text().is_some() {
        handle_text_message(&bot, &msg, state).await?;
    } else if let Some(file_id) = image_file_id(&msg) {
        handle_image_message(&bot, &msg, file_id, state).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
