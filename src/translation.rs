use crate::config::Config;
use crate::language::Language;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Text shown in place of a translation that could not be obtained
pub const TRANSLATION_FAILED: &str = "Translation failed.";

/// DeepL translate request (JSON form of the v2 API)
#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    text: String,
}

/// Result of translating one headline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Translated(String),
    Failed,
}

impl TranslationResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, TranslationResult::Failed)
    }

    /// Text to display: the translation, or the failure sentinel
    pub fn as_str(&self) -> &str {
        match self {
            TranslationResult::Translated(text) => text,
            TranslationResult::Failed => TRANSLATION_FAILED,
        }
    }
}

impl std::fmt::Display for TranslationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend able to translate a single piece of text.
///
/// Implementations never fail: errors are reported as `TranslationResult::Failed`.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> TranslationResult;
}

/// DeepL translation client. One request per call, no batching.
#[derive(Debug, Clone)]
pub struct DeeplTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl DeeplTranslator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.deepl_api_url.clone(),
            api_key: config.deepl_api_key.clone(),
        }
    }

    async fn request_translation(&self, text: &str, target: Language) -> Result<String> {
        let api_key = self.api_key.as_deref().context("DEEPL_API_KEY not set")?;

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .json(&TranslationRequest {
                text: [text],
                target_lang: target.code(),
            })
            .send()
            .await
            .context("Failed to send translation request to DeepL API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("DeepL API error during translation ({}): {}", status, body);
        }

        let parsed: TranslationResponse = response
            .json()
            .await
            .context("Failed to parse DeepL translation response")?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .context("DeepL translation response contained no translations")
    }
}

#[async_trait]
impl Translate for DeeplTranslator {
    async fn translate(&self, text: &str, target: Language) -> TranslationResult {
        match self.request_translation(text, target).await {
            Ok(translated) => TranslationResult::Translated(translated),
            Err(e) => {
                warn!("Translation to {} failed: {:#}", target.name(), e);
                TranslationResult::Failed
            }
        }
    }
}
