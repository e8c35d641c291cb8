use crate::config::Config;
use anyhow::Result;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Raw hit as returned by the Algolia HN search API
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    story_title: Option<String>,
    url: Option<String>,
    story_url: Option<String>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    created_at: String,
    num_comments: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// A story as displayed in the headline list.
///
/// Immutable once fetched; a new search replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub author: String,
    pub created_at: String,
    pub num_comments: Option<u64>,
}

impl Story {
    pub fn popularity(&self) -> Popularity {
        Popularity::from_comments(self.num_comments)
    }
}

impl SearchHit {
    /// Headline falls back to `story_title` and link to `story_url` (comment hits).
    fn into_story(self) -> Option<Story> {
        let url = non_blank(self.url).or_else(|| non_blank(self.story_url))?;
        let title = non_blank(self.title).or_else(|| non_blank(self.story_title))?;

        Some(Story {
            id: self.object_id,
            title,
            url: Some(url),
            author: self.author,
            created_at: self.created_at,
            num_comments: self.num_comments,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Comment-count tier used to colour a headline box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popularity {
    Viral,
    Hot,
    Warm,
    Normal,
}

impl Popularity {
    pub fn from_comments(num_comments: Option<u64>) -> Self {
        match num_comments.unwrap_or(0) {
            n if n > 1000 => Popularity::Viral,
            n if n > 500 => Popularity::Hot,
            n if n > 150 => Popularity::Warm,
            _ => Popularity::Normal,
        }
    }

    pub fn border_color(&self) -> &'static str {
        match self {
            Popularity::Viral => "#ff4c4c",
            Popularity::Hot => "#ffa500",
            Popularity::Warm => "#ffd700",
            Popularity::Normal => "#353535",
        }
    }

    pub fn is_viral(&self) -> bool {
        matches!(self, Popularity::Viral)
    }
}

#[derive(Debug, thiserror::Error)]
enum SearchAttemptError {
    #[error("Search API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to send search request: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to parse search response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl SearchAttemptError {
    /// Retry 429, 5xx and transport failures; other 4xx are permanent
    fn is_retryable(&self) -> bool {
        match self {
            SearchAttemptError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            SearchAttemptError::Transport(_) | SearchAttemptError::Decode(_) => true,
        }
    }
}

/// How often a failed search is repeated and how long to pause in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchBackoff {
    attempts: u32,
    first_pause: Duration,
    max_pause: Duration,
}

/// 3 attempts with pauses of 500ms and 1s
const SEARCH_BACKOFF: SearchBackoff = SearchBackoff {
    attempts: 3,
    first_pause: Duration::from_millis(500),
    max_pause: Duration::from_secs(2),
};

impl SearchBackoff {
    /// Pause before each retry: doubles every time, never above `max_pause`
    fn pauses(self) -> impl Iterator<Item = Duration> {
        let first = self.first_pause.min(self.max_pause);
        std::iter::successors(Some(first), move |pause| Some((*pause * 2).min(self.max_pause)))
            .take(self.attempts.saturating_sub(1) as usize)
    }
}

async fn search_once(
    client: &reqwest::Client,
    config: &Config,
    query: &str,
) -> Result<SearchResponse, SearchAttemptError> {
    // The client handles percent-encoding of the query
    let response = client
        .get(&config.search_api_url)
        .query(&[("query", query)])
        .send()
        .await
        .map_err(SearchAttemptError::Transport)?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(SearchAttemptError::Status { status, body });
    }

    response
        .json::<SearchResponse>()
        .await
        .map_err(SearchAttemptError::Decode)
}

/// Search stories matching `query`. An empty query returns the front page.
///
/// Hits without a link or a headline are dropped.
pub async fn search_stories(
    client: &reqwest::Client,
    config: &Config,
    query: &str,
) -> Result<Vec<Story>> {
    info!("Searching stories for {:?}", query);

    // Step 1: Fetch, repeating transient failures
    let mut pauses = SEARCH_BACKOFF.pauses();
    let mut attempt = 1;
    let response = loop {
        match search_once(client, config, query).await {
            Ok(response) => break response,
            Err(e) if e.is_retryable() => {
                let Some(pause) = pauses.next() else {
                    warn!("Headline search failed after {} attempts: {}", attempt, e);
                    return Err(e.into());
                };
                warn!(
                    "Headline search attempt {} failed ({}), retrying in {:?}",
                    attempt, e, pause
                );
                sleep(pause).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    };

    // Step 2: Keep only hits that can be shown as a linked headline
    let total = response.hits.len();
    let stories: Vec<Story> = response
        .hits
        .into_iter()
        .filter_map(SearchHit::into_story)
        .collect();

    debug!("Dropped {} hits without a link or title", total - stories.len());
    info!("Fetched {} stories", stories.len());

    Ok(stories)
}
