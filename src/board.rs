//! The set of headlines currently on screen.
//!
//! Every search replaces the whole set and bumps the generation. Updates
//! produced by work started against an older generation are dropped when
//! they arrive, so late translations never land on unrelated headlines.

use crate::story::Story;
use tracing::debug;

/// A headline as handed to the translation orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineRecord {
    pub id: String,
    pub text: String,
}

/// Ordered headlines, top to bottom, tagged with the board generation
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub generation: u64,
    pub headlines: Vec<HeadlineRecord>,
}

/// Display update emitted while a translation run progresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlineEvent {
    /// The headline should now read `text` (one animation frame)
    Typed {
        generation: u64,
        id: String,
        text: String,
    },
    /// Translation failed; the headline keeps its current text
    Failed { generation: u64, id: String },
}

impl HeadlineEvent {
    pub fn generation(&self) -> u64 {
        match self {
            HeadlineEvent::Typed { generation, .. } | HeadlineEvent::Failed { generation, .. } => {
                *generation
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            HeadlineEvent::Typed { id, .. } | HeadlineEvent::Failed { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    story: Story,
    displayed: String,
}

#[derive(Debug, Default)]
pub struct HeadlineBoard {
    generation: u64,
    entries: Vec<Entry>,
}

impl HeadlineBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the results of a new search. Returns the new generation.
    pub fn replace(&mut self, stories: Vec<Story>) -> u64 {
        self.generation += 1;
        self.entries = stories
            .into_iter()
            .map(|story| Entry {
                displayed: story.title.clone(),
                story,
            })
            .collect();
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stories with the text currently displayed for each, in display order
    pub fn headlines(&self) -> impl Iterator<Item = (&Story, &str)> {
        self.entries.iter().map(|e| (&e.story, e.displayed.as_str()))
    }

    pub fn story(&self, id: &str) -> Option<&Story> {
        self.entry(id).map(|e| &e.story)
    }

    pub fn displayed_text(&self, id: &str) -> Option<&str> {
        self.entry(id).map(|e| e.displayed.as_str())
    }

    /// What is on screen right now, for a translation run.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            generation: self.generation,
            headlines: self
                .entries
                .iter()
                .map(|e| HeadlineRecord {
                    id: e.story.id.clone(),
                    text: e.displayed.clone(),
                })
                .collect(),
        }
    }

    /// Apply an update. Returns `false` when it was stale and ignored.
    pub fn apply(&mut self, event: &HeadlineEvent) -> bool {
        if event.generation() != self.generation {
            debug!(
                "Dropping stale update for {} (generation {} != {})",
                event.id(),
                event.generation(),
                self.generation
            );
            return false;
        }

        let Some(entry) = self.entries.iter_mut().find(|e| e.story.id == event.id()) else {
            debug!("Dropping update for unknown headline {}", event.id());
            return false;
        };

        if let HeadlineEvent::Typed { text, .. } = event {
            entry.displayed.clone_from(text);
        }
        true
    }

    fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.story.id == id)
    }
}
