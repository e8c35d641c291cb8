//! Typewriter effect: reveal text one character at a time.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{error, warn};

/// A display target refused a write.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display target is gone")]
    Closed,
}

/// Something that shows a line of text, replacing what it showed before.
#[async_trait]
pub trait DisplayTarget: Send {
    async fn show(&mut self, text: &str) -> Result<(), DisplayError>;
}

/// State of one running animation.
#[derive(Debug, Clone)]
pub struct AnimationJob {
    target_text: String,
    displayed_prefix: String,
    cursor: usize,
}

impl AnimationJob {
    pub fn new(target_text: &str) -> Self {
        Self {
            target_text: target_text.to_string(),
            displayed_prefix: String::with_capacity(target_text.len()),
            cursor: 0,
        }
    }

    /// Reveal the next character and return the text to display, or `None`
    /// once the whole text is shown.
    pub fn advance(&mut self) -> Option<&str> {
        let next = self.target_text[self.cursor..].chars().next()?;
        self.cursor += next.len_utf8();
        self.displayed_prefix.push(next);
        Some(&self.displayed_prefix)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.target_text.len()
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }
}

/// Per-character pacing of the typewriter effect.
#[derive(Debug, Clone, Copy)]
pub struct TypingAnimator {
    speed: Duration,
    randomness: f64,
}

impl TypingAnimator {
    /// `randomness` is a fraction of `speed` added as uniform jitter.
    pub fn new(speed: Duration, randomness: f64) -> Self {
        Self {
            speed,
            randomness: if randomness.is_finite() { randomness.max(0.0) } else { 0.0 },
        }
    }

    /// Delay before the next character, uniform in `[speed, speed + randomness * speed)`
    fn next_delay(&self) -> Duration {
        if self.randomness == 0.0 {
            return self.speed;
        }
        let jitter: f64 = rand::thread_rng().gen();
        self.speed + self.speed.mul_f64(jitter * self.randomness)
    }

    /// Type `text` into `target`. Empty text is a no-op.
    ///
    /// If a write fails midway the full text is shown at once instead.
    /// Returns `false` only when the target never received the full text.
    pub async fn animate<T>(&self, target: &mut T, text: &str) -> bool
    where
        T: DisplayTarget + ?Sized,
    {
        if text.is_empty() {
            return true;
        }

        let Err(e) = self.type_out(target, text).await else {
            return true;
        };
        warn!("Animation error, showing text instantly: {}", e);
        match target.show(text).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to show text after animation error: {}", e);
                false
            }
        }
    }

    /// Animate each `(target, text)` pair in order, one at a time.
    ///
    /// Pairs with an empty or missing text are skipped. If a write fails,
    /// the remaining targets get their text instantly.
    pub async fn animate_batch<T, S>(&self, targets: &mut [T], texts: &[S])
    where
        T: DisplayTarget,
        S: AsRef<str>,
    {
        for index in 0..targets.len() {
            let Some(text) = texts.get(index).map(|t| t.as_ref()).filter(|t| !t.is_empty()) else {
                continue;
            };

            if let Err(e) = self.type_out(&mut targets[index], text).await {
                warn!("Batch animation error at item {}: {}", index, e);
                show_remaining(&mut targets[index..], &texts[index..]).await;
                return;
            }
        }
    }

    async fn type_out<T>(&self, target: &mut T, text: &str) -> Result<(), DisplayError>
    where
        T: DisplayTarget + ?Sized,
    {
        let mut job = AnimationJob::new(text);
        loop {
            tokio::time::sleep(self.next_delay()).await;
            match job.advance() {
                Some(frame) => target.show(frame).await?,
                None => return Ok(()),
            }
            if job.is_finished() {
                return Ok(());
            }
        }
    }
}

async fn show_remaining<T, S>(targets: &mut [T], texts: &[S])
where
    T: DisplayTarget,
    S: AsRef<str>,
{
    for (target, text) in targets.iter_mut().zip(texts) {
        let text = text.as_ref();
        if text.is_empty() {
            continue;
        }
        if let Err(e) = target.show(text).await {
            error!("Failed to show text after batch animation error: {}", e);
        }
    }
}
