//! # Vision Analysis Module
//!
//! Turns a meal photo (by URL) into a structured nutrition estimate via the
//! OpenAI vision API. The estimate is treated as immutable input by the rest
//! of the core, except for the two fields the portion rescale engine rebases
//! (`calories_estimate`, `portion_estimate_g`).

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::errors::CoreError;

/// Macronutrients for the estimated portion, in grams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
}

/// Structured nutrition estimate for one photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEstimate {
    pub dish_name: String,
    pub calories_estimate: f64,
    #[serde(default)]
    pub macros: Macros,
    #[serde(default)]
    pub portion_estimate_g: Option<f64>,
    #[serde(default)]
    pub portion_confidence: Option<f64>,
    #[serde(default)]
    pub package_total_g: Option<f64>,
    #[serde(default)]
    pub per_100g_kcal: Option<f64>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub suggested_portion_options: Vec<String>,
}

/// Result of an analysis call that reached the model
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Food(AnalysisEstimate),
    NotFood,
}

/// Sentinel the model returns when the photo is not a meal
#[derive(Debug, Deserialize)]
struct ErrorSentinel {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "\
You are a nutritionist assistant. The input is a single photo of a meal. \
Estimate calories and macros for the visible portion. Reply with STRICT JSON \
and nothing else, using this shape: \
{\"dish_name\": string, \"calories_estimate\": number, \
\"macros\": {\"protein_g\": number, \"fat_g\": number, \"carbs_g\": number}, \
\"portion_estimate_g\": number|null, \"portion_confidence\": number|null, \
\"package_total_g\": number|null, \"per_100g_kcal\": number|null, \
\"tips\": [string], \"suggested_portion_options\": [string]}. \
If the photo is not food, reply {\"error\": \"not_food\"}.";

/// Parse the model reply into an outcome. Tolerates markdown code fences
/// around the JSON body.
pub fn parse_analysis_content(content: &str) -> Result<AnalysisOutcome, CoreError> {
    let body = strip_code_fences(content);

    if let Ok(sentinel) = serde_json::from_str::<ErrorSentinel>(body) {
        if sentinel.error == "not_food" {
            return Ok(AnalysisOutcome::NotFood);
        }
        return Err(CoreError::Analysis(format!(
            "model reported error: {}",
            sentinel.error
        )));
    }

    serde_json::from_str::<AnalysisEstimate>(body)
        .map(AnalysisOutcome::Food)
        .map_err(|e| CoreError::Analysis(format!("unparsable analysis payload: {e}")))
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Client for the external vision analysis collaborator
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    api_key: String,
    config: AnalysisConfig,
}

impl AnalysisClient {
    pub fn new(api_key: String, config: AnalysisConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            config,
        }
    }

    /// Analyze a meal photo by URL. Retries transient transport failures
    /// with exponential backoff and random jitter.
    pub async fn analyze(&self, image_url: &str) -> Result<AnalysisOutcome, CoreError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self
                    .config
                    .base_retry_delay_ms
                    .saturating_mul(1u64 << (attempt - 1))
                    .min(self.config.max_retry_delay_ms);
                let jitter = rand::thread_rng().gen_range(0..250);
                debug!(attempt, backoff_ms = backoff + jitter, "Retrying analysis call");
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }

            match self.request_once(image_url).await {
                Ok(content) => return parse_analysis_content(&content),
                Err(e) => {
                    warn!(attempt, error = %e, "Analysis request failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(CoreError::Analysis(last_error))
    }

    async fn request_once(&self, image_url: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": image_url } }
                    ]
                }
            ],
            "temperature": 0.2,
        });

        let response = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("empty completion choices"))?;

        Ok(content)
    }
}
