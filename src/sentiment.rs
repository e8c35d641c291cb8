use crate::config::Config;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Request body for the HuggingFace inference endpoint
#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Three-class sentiment of a headline, each score in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl SentimentScore {
    /// Scores in lexicographic label order: negative, neutral, positive.
    ///
    /// Consumers that index positionally rely on this order.
    pub fn ordered(&self) -> [f64; 3] {
        [self.negative, self.neutral, self.positive]
    }

    /// Popup lines, most positive first
    pub fn display_lines(&self) -> [String; 3] {
        [
            format!("Positive: {:.2}%", self.positive * 100.0),
            format!("Neutral: {:.2}%", self.neutral * 100.0),
            format!("Negative: {:.2}%", self.negative * 100.0),
        ]
    }
}

/// Outcome of one annotation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentiment {
    Scores(SentimentScore),
    Unavailable,
}

impl Sentiment {
    pub fn scores(&self) -> Option<&SentimentScore> {
        match self {
            Sentiment::Scores(scores) => Some(scores),
            Sentiment::Unavailable => None,
        }
    }
}

/// Client for the remote sentiment classifier.
///
/// Results are never cached; every hover asks again.
#[derive(Debug, Clone)]
pub struct SentimentAnnotator {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl SentimentAnnotator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.sentiment_api_url.clone(),
            api_token: config.huggingface_api_token.clone(),
        }
    }

    /// Score a headline. Any failure is logged and reported as `Unavailable`.
    pub async fn annotate(&self, headline: &str) -> Sentiment {
        match self.request_scores(headline).await {
            Ok(scores) => Sentiment::Scores(scores),
            Err(e) => {
                warn!("Sentiment unavailable for {:?}: {:#}", headline, e);
                Sentiment::Unavailable
            }
        }
    }

    async fn request_scores(&self, headline: &str) -> Result<SentimentScore> {
        let token = self
            .api_token
            .as_deref()
            .context("HUGGINGFACE_API_TOKEN not set")?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&InferenceRequest { inputs: headline })
            .send()
            .await
            .context("Failed to send request to sentiment API")?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse sentiment response")?;

        if !status.is_success() {
            bail!("Sentiment API error ({}): {}", status, body);
        }

        parse_scores(body)
    }
}

/// Extract the three labelled scores from `[[{label, score}, ...]]`.
///
/// Labels are matched case-insensitively, so the provider's return order
/// does not matter.
fn parse_scores(body: serde_json::Value) -> Result<SentimentScore> {
    if let Some(error) = body.get("error") {
        bail!("Sentiment API returned an error payload: {}", error);
    }

    let batches: Vec<Vec<LabelScore>> =
        serde_json::from_value(body).context("Unexpected sentiment response shape")?;
    let mut entries = batches
        .into_iter()
        .next()
        .context("Sentiment response contained no results")?;

    if entries.len() < 3 {
        bail!("Expected 3 sentiment labels, got {}", entries.len());
    }

    for entry in entries.iter_mut() {
        entry.label = entry.label.to_lowercase();
    }
    debug!("Sentiment labels: {:?}", entries);

    let score_of = |label: &str| -> Result<f64> {
        entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.score.clamp(0.0, 1.0))
            .with_context(|| format!("Sentiment response is missing the {:?} label", label))
    };

    Ok(SentimentScore {
        negative: score_of("negative")?,
        neutral: score_of("neutral")?,
        positive: score_of("positive")?,
    })
}
