use crate::config::{read_api_key, FilterConfig};
use crate::leads::EmailFilter;
use crate::HarvestError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You validate email addresses harvested from a business website. \
You receive the business name and a JSON array of addresses. Return a JSON array holding only \
the syntactically valid addresses that plausibly belong to that business, judging by how the \
domain matches the business name. Drop placeholders such as example.com or test addresses. \
If you are unsure whether an address belongs to the business, keep it when it is valid. \
Output the JSON array only.";

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("quoted string regex is valid"));

/// Keeps the addresses from a model reply that were also in `input`
///
/// The reply is read loosely: single quotes count as double quotes and every
/// quoted string is a candidate. The result keeps `input` order.
///
/// # Examples
///
/// ```
/// use lead_harvester::leads::parse_reply;
///
/// let input = vec!["info@golf.com".to_string(), "x@gmail.com".to_string()];
/// let kept = parse_reply("['info@golf.com', 'made-up@golf.com']", &input);
/// assert_eq!(kept, vec!["info@golf.com"]);
/// ```
pub fn parse_reply(reply: &str, input: &[String]) -> Vec<String> {
    let normalized = reply.replace('\'', "\"");
    let mentioned: HashSet<String> = QUOTED
        .captures_iter(&normalized)
        .map(|caps| caps[1].trim().to_lowercase())
        .collect();

    input
        .iter()
        .filter(|email| mentioned.contains(&email.to_lowercase()))
        .cloned()
        .collect()
}

/// Chat-completion relevance filter (OpenRouter API)
#[derive(Clone)]
pub struct OpenRouterFilter {
    http_client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterFilter {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Builds the filter from config, reading the key from the named env var
    pub fn from_config(config: &FilterConfig) -> Result<Self, HarvestError> {
        let api_key = read_api_key(&config.api_key_env)?;
        Self::new(&config.endpoint, api_key, &config.model, config.timeout())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl EmailFilter for OpenRouterFilter {
    async fn filter(
        &self,
        business_name: &str,
        emails: &[String],
    ) -> Result<Vec<String>, HarvestError> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let user_prompt = format!(
            "Business Name: {}\nEmails: {}",
            business_name,
            serde_json::to_string(emails)?
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": user_prompt},
                ],
                "reasoning": {"exclude": true},
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Filter(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| "[]".to_string());

        let kept = parse_reply(&content, emails);
        debug!(
            business = business_name,
            before = emails.len(),
            after = kept.len(),
            "Filtered emails"
        );
        Ok(kept)
    }
}

/// Filter that keeps every address; used when filtering is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughFilter;

#[async_trait]
impl EmailFilter for PassThroughFilter {
    async fn filter(
        &self,
        _business_name: &str,
        emails: &[String],
    ) -> Result<Vec<String>, HarvestError> {
        Ok(emails.to_vec())
    }
}
