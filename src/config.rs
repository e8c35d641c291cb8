use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_SEARCH_API_URL: &str = "https://hn.algolia.com/api/v1/search";
pub const DEFAULT_SENTIMENT_API_URL: &str =
    "https://router.huggingface.co/hf-inference/models/cardiffnlp/twitter-roberta-base-sentiment-latest";
pub const DEFAULT_DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";

#[derive(Debug, Clone)]
pub struct Config {
    // Headline search
    pub search_api_url: String,

    // Sentiment (HuggingFace inference)
    pub huggingface_api_token: Option<String>,
    pub sentiment_api_url: String,

    // Translation (DeepL)
    pub deepl_api_key: Option<String>,
    pub deepl_api_url: String,

    // Outbound requests
    pub request_timeout_secs: u64,

    // Feature toggle for AI annotations
    pub use_ai: bool,

    // Typing animation
    pub typing_speed_ms: u64,
    pub typing_randomness: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            search_api_url: std::env::var("SEARCH_API_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_API_URL.to_string()),

            huggingface_api_token: non_empty_var("HUGGINGFACE_API_TOKEN"),
            sentiment_api_url: std::env::var("SENTIMENT_API_URL")
                .unwrap_or_else(|_| DEFAULT_SENTIMENT_API_URL.to_string()),

            deepl_api_key: non_empty_var("DEEPL_API_KEY"),
            deepl_api_url: std::env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEEPL_API_URL.to_string()),

            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS")?.unwrap_or(15),

            use_ai: std::env::var("USE_AI")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),

            typing_speed_ms: parse_var("TYPING_SPEED_MS")?.unwrap_or(10),
            typing_randomness: parse_var("TYPING_RANDOMNESS")?.unwrap_or(0.25),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the HTTP client shared by every remote call.
    ///
    /// None of the remote services enforce a deadline, so the per-request
    /// timeout is applied here once.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .user_agent(concat!("news-reader/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}
