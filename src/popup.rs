//! Metadata popup: where it goes and what it says.

use crate::date::format_date;
use crate::sentiment::Sentiment;
use crate::story::Story;
use chrono::{DateTime, Utc};

/// Gap between the pointer and the popup, in pixels
pub const DEFAULT_OFFSET: f64 = 15.0;

/// Size assumed for a popup that has not been measured yet
pub const ESTIMATED_POPUP_SIZE: Size = Size {
    width: 200.0,
    height: 100.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Place the popup below-right of the pointer, flipping to the left or
/// above when it would overflow the viewport.
pub fn position(pointer: Point, popup: Size, viewport: Size, offset: f64) -> Point {
    let mut x = pointer.x + offset;
    let mut y = pointer.y + offset;

    if x + popup.width > viewport.width {
        x = pointer.x - popup.width - offset;
    }

    if y + popup.height > viewport.height {
        y = pointer.y - popup.height - offset;
    }

    Point { x, y }
}

/// Sentiment section of a popup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SentimentState {
    /// AI annotations are switched off
    Disabled,
    /// Request in flight
    Pending,
    Ready(Sentiment),
}

pub struct PopupContent;

impl PopupContent {
    /// Lines shown in the popup for `story`, top to bottom.
    pub fn render(story: &Story, sentiment: &SentimentState, now: DateTime<Utc>) -> Vec<String> {
        let mut lines = Vec::with_capacity(9);

        if story.popularity().is_viral() {
            lines.push("VIRAL!".to_string());
        }

        lines.push(format!("Author: {}", story.author));
        lines.push(format_date(&story.created_at, now));
        lines.push(match story.num_comments {
            Some(n) if n > 0 => format!("Comments: {}", n),
            _ => "Comments: Unknown".to_string(),
        });
        lines.push(format!("URL: {}", story.url.as_deref().unwrap_or_default()));

        match sentiment {
            SentimentState::Disabled => {
                lines.push("AI sentiment analysis is disabled.".to_string());
            }
            SentimentState::Pending => {
                lines.push("Generating sentiment...".to_string());
            }
            SentimentState::Ready(Sentiment::Scores(scores)) => {
                lines.extend(scores.display_lines());
            }
            SentimentState::Ready(Sentiment::Unavailable) => {
                lines.push("AI sentiment analysis is not currently available.".to_string());
            }
        }

        lines
    }
}
