//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import analysis types
use crate::analysis::AnalysisEstimate;

/// Format the result card for a fresh analysis
pub fn format_meal_card(
    estimate: &AnalysisEstimate,
    remaining: Option<u32>,
    daily_target: Option<u32>,
    language_code: Option<&str>,
) -> String {
    let kcal = estimate.calories_estimate.max(0.0).round() as u32;
    let mut card = t_args_lang(
        "meal-card",
        &[
            ("dish", &estimate.dish_name),
            ("kcal", &kcal.to_string()),
            ("protein", &format_grams(estimate.macros.protein_g)),
            ("fat", &format_grams(estimate.macros.fat_g)),
            ("carbs", &format_grams(estimate.macros.carbs_g)),
        ],
        language_code,
    );

    if let Some(portion) = estimate.portion_estimate_g {
        card.push('\n');
        card.push_str(&t_args_lang(
            "meal-card-portion",
            &[("grams", &(portion.round() as u32).to_string())],
            language_code,
        ));
    }

    match (remaining, daily_target) {
        (Some(remaining), Some(target)) => {
            card.push_str("\n\n");
            card.push_str(&t_args_lang(
                "meal-card-remaining",
                &[
                    ("remaining", &remaining.to_string()),
                    ("target", &target.to_string()),
                ],
                language_code,
            ));
        }
        _ => {
            card.push_str("\n\n");
            card.push_str(&t_lang("meal-card-no-target", language_code));
        }
    }

    card
}

fn format_grams(value: f64) -> String {
    if (value - value.round()).abs() < 0.05 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Format the cached tips as a numbered list
pub fn format_tips(tips: &[String], language_code: Option<&str>) -> String {
    let mut result = t_lang("tips-header", language_code);
    for (i, tip) in tips.iter().enumerate() {
        result.push_str(&format!("\n{}. {}", i + 1, tip));
    }
    result
}

/// Keyboard attached to the /start greeting
pub fn start_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang("btn-how", language_code),
        "how".to_string(),
    )]])
}

/// Keyboard attached to the result card
pub fn tips_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang("btn-tips", language_code),
        "tips".to_string(),
    )]])
}

/// Keyboard attached to the quota-exhausted denial
pub fn buy_keyboard(pack_size: u32, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_args_lang("btn-buy", &[("credits", &pack_size.to_string())], language_code),
        format!("buy:{pack_size}"),
    )]])
}

/// Keyboard for the portion-correction follow-up.
///
/// Fraction buttons are only offered when a baseline exists to resolve them
/// against; without a package total the fractions apply to the estimated
/// portion. Manual gram entry is always available.
pub fn portion_keyboard(
    estimate: &AnalysisEstimate,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if estimate.package_total_g.is_some() || estimate.portion_estimate_g.is_some() {
        rows.push(vec![
            InlineKeyboardButton::callback("¼", "portion:frac:0.25".to_string()),
            InlineKeyboardButton::callback("⅓", "portion:frac:0.33".to_string()),
            InlineKeyboardButton::callback("½", "portion:frac:0.5".to_string()),
        ]);
    }

    if let Some(portion) = estimate.portion_estimate_g {
        let grams = portion.round() as u32;
        let quick: Vec<InlineKeyboardButton> = [grams / 2, grams * 2]
            .into_iter()
            .filter(|g| (crate::config::MIN_PORTION_G..=crate::config::MAX_PORTION_G).contains(g))
            .map(|g| {
                InlineKeyboardButton::callback(
                    t_args_lang("btn-grams", &[("grams", &g.to_string())], language_code),
                    format!("portion:g:{g}"),
                )
            })
            .collect();
        if !quick.is_empty() {
            rows.push(quick);
        }
    }

    rows.push(vec![
        InlineKeyboardButton::callback(
            t_lang("btn-portion-manual", language_code),
            "portion:manual".to_string(),
        ),
        InlineKeyboardButton::callback(t_lang("btn-next", language_code), "next".to_string()),
    ]);

    InlineKeyboardMarkup::new(rows)
}
