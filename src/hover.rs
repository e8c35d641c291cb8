use crate::popup::{position, Point, SentimentState, Size, DEFAULT_OFFSET, ESTIMATED_POPUP_SIZE};
use crate::sentiment::Sentiment;
use tracing::debug;

/// Identifies one hover over one headline. Sentiment results carry it back
/// so that answers for an earlier hover can be recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTicket {
    pub id: String,
    epoch: u64,
}

/// The single popup currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePopup {
    pub id: String,
    pub position: Point,
    pub sentiment: SentimentState,
    measured: Option<Size>,
    epoch: u64,
}

/// Tracks which headline is under the pointer. At most one popup exists.
#[derive(Debug)]
pub struct HoverTracker {
    use_ai: bool,
    epoch: u64,
    active: Option<ActivePopup>,
}

impl HoverTracker {
    pub fn new(use_ai: bool) -> Self {
        Self {
            use_ai,
            epoch: 0,
            active: None,
        }
    }

    pub fn use_ai(&self) -> bool {
        self.use_ai
    }

    /// Toggling AI does not touch an already visible popup.
    pub fn set_use_ai(&mut self, use_ai: bool) {
        self.use_ai = use_ai;
    }

    /// Pointer entered a headline. Any other popup is replaced.
    ///
    /// Returns a ticket when a sentiment request should be started.
    pub fn enter(&mut self, id: &str) -> Option<HoverTicket> {
        self.epoch += 1;
        let sentiment = if self.use_ai {
            SentimentState::Pending
        } else {
            SentimentState::Disabled
        };

        self.active = Some(ActivePopup {
            id: id.to_string(),
            position: Point { x: 0.0, y: 0.0 },
            sentiment,
            measured: None,
            epoch: self.epoch,
        });

        self.use_ai.then(|| HoverTicket {
            id: id.to_string(),
            epoch: self.epoch,
        })
    }

    /// Pointer left a headline. Leaving one that is not shown is ignored.
    pub fn leave(&mut self, id: &str) {
        if self.active.as_ref().is_some_and(|popup| popup.id == id) {
            self.active = None;
        }
    }

    /// Record the rendered size of the visible popup.
    pub fn popup_measured(&mut self, size: Size) {
        if let Some(popup) = self.active.as_mut() {
            popup.measured = Some(size);
        }
    }

    /// Recompute the popup position for a pointer move.
    ///
    /// Uses the estimated size until the popup has been measured.
    pub fn pointer_moved(&mut self, pointer: Point, viewport: Size) -> Option<Point> {
        let popup = self.active.as_mut()?;
        let size = popup.measured.unwrap_or(ESTIMATED_POPUP_SIZE);
        popup.position = position(pointer, size, viewport, DEFAULT_OFFSET);
        Some(popup.position)
    }

    /// Store a sentiment result if it belongs to the current hover.
    pub fn accept_sentiment(&mut self, ticket: &HoverTicket, sentiment: Sentiment) -> bool {
        match self.active.as_mut() {
            Some(popup) if popup.epoch == ticket.epoch && popup.id == ticket.id => {
                popup.sentiment = SentimentState::Ready(sentiment);
                true
            }
            _ => {
                debug!("Dropping sentiment for {} from an earlier hover", ticket.id);
                false
            }
        }
    }

    pub fn active(&self) -> Option<&ActivePopup> {
        self.active.as_ref()
    }
}
