use crate::animation::{DisplayError, DisplayTarget, TypingAnimator};
use crate::board::{BoardSnapshot, HeadlineEvent};
use crate::language::Language;
use crate::translation::{Translate, TranslationResult};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Why a translation run did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Another run is still in progress
    Busy { running: Language },
    /// The headlines were last translated to this language already
    AlreadyActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub language: Language,
    pub translated: usize,
    pub failed: usize,
    /// The display went away before every headline was processed
    pub interrupted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    Rejected(RejectReason),
}

#[derive(Debug)]
struct RunState {
    /// Language of the run in progress, if any
    running: Option<Language>,
    /// Language the headlines were last translated to
    active: Language,
}

/// Clears the running slot however the run ends, including on panic.
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).running = None;
    }
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Display target for one headline: each frame becomes a `HeadlineEvent::Typed`.
struct HeadlineTarget<'a> {
    generation: u64,
    id: &'a str,
    events: &'a mpsc::Sender<HeadlineEvent>,
}

#[async_trait]
impl DisplayTarget for HeadlineTarget<'_> {
    async fn show(&mut self, text: &str) -> Result<(), DisplayError> {
        self.events
            .send(HeadlineEvent::Typed {
                generation: self.generation,
                id: self.id.to_string(),
                text: text.to_string(),
            })
            .await
            .map_err(|_| DisplayError::Closed)
    }
}

/// Translates every displayed headline, one after another, typing each
/// result out before moving on. Only one run may be active at a time.
pub struct TranslationOrchestrator<T> {
    translator: T,
    animator: TypingAnimator,
    state: Mutex<RunState>,
}

impl<T: Translate> TranslationOrchestrator<T> {
    pub fn new(translator: T, animator: TypingAnimator) -> Self {
        Self {
            translator,
            animator,
            state: Mutex::new(RunState {
                running: None,
                active: Language::ENGLISH,
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).running.is_some()
    }

    pub fn active_language(&self) -> Language {
        lock(&self.state).active
    }

    /// Fresh search results arrive in English.
    ///
    /// A run still in progress keeps its own language for busy rejections.
    pub fn reset_language(&self) {
        lock(&self.state).active = Language::ENGLISH;
    }

    fn try_begin(&self, language: Language) -> Result<RunGuard<'_>, RejectReason> {
        let mut state = lock(&self.state);
        if let Some(running) = state.running {
            return Err(RejectReason::Busy { running });
        }
        if state.active == language {
            return Err(RejectReason::AlreadyActive);
        }
        state.running = Some(language);
        state.active = language;
        Ok(RunGuard { state: &self.state })
    }

    /// Translate the headlines in `snapshot` to `language`, in order.
    ///
    /// The text sent for translation is whatever the snapshot shows, which
    /// may already be a translation. A failed headline is reported and
    /// skipped; the run always continues with the next one.
    pub async fn run(
        &self,
        language: Language,
        snapshot: BoardSnapshot,
        events: &mpsc::Sender<HeadlineEvent>,
    ) -> RunOutcome {
        let _guard = match self.try_begin(language) {
            Ok(guard) => guard,
            Err(reason) => {
                info!("Translation to {} rejected: {:?}", language, reason);
                return RunOutcome::Rejected(reason);
            }
        };

        let total = snapshot.headlines.len();
        info!("Translating {} headlines to {}", total, language.name());

        let mut summary = RunSummary {
            language,
            translated: 0,
            failed: 0,
            interrupted: false,
        };

        for (index, headline) in snapshot.headlines.iter().enumerate() {
            if events.is_closed() {
                summary.interrupted = true;
                break;
            }

            match self.translator.translate(&headline.text, language).await {
                TranslationResult::Translated(translated) => {
                    let mut target = HeadlineTarget {
                        generation: snapshot.generation,
                        id: &headline.id,
                        events,
                    };
                    if !self.animator.animate(&mut target, &translated).await {
                        summary.interrupted = true;
                        break;
                    }
                    summary.translated += 1;
                }
                TranslationResult::Failed => {
                    warn!(
                        "[{}/{}] Translation failed for headline {}, keeping original text",
                        index + 1,
                        total,
                        headline.id
                    );
                    summary.failed += 1;
                    let failed = HeadlineEvent::Failed {
                        generation: snapshot.generation,
                        id: headline.id.clone(),
                    };
                    if events.send(failed).await.is_err() {
                        summary.interrupted = true;
                        break;
                    }
                }
            }
        }

        if summary.interrupted {
            error!(
                "Translation to {} interrupted: display closed after {} of {} headlines",
                language.name(),
                summary.translated + summary.failed,
                total
            );
        } else {
            info!(
                "Translation to {} complete: {} translated, {} failed",
                language.name(),
                summary.translated,
                summary.failed
            );
        }

        RunOutcome::Completed(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::HeadlineRecord;
    use std::sync::Arc;
    use std::time::Duration;

    /// Prefixes text with the language code; fails for texts listed in `fail_on`
    struct FakeTranslator {
        delay: Duration,
        fail_on: Vec<String>,
        calls: Arc<Mutex<Vec<(String, Language)>>>,
    }

    impl FakeTranslator {
        fn new() -> Self {
            Self {
                delay: Duration::ZERO,
                fail_on: Vec::new(),
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl Translate for FakeTranslator {
        async fn translate(&self, text: &str, target: Language) -> TranslationResult {
            self.calls.lock().unwrap().push((text.to_string(), target));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on.iter().any(|f| f == text) {
                TranslationResult::Failed
            } else {
                TranslationResult::Translated(format!("{}:{}", target, text))
            }
        }
    }

    fn snapshot(generation: u64, texts: &[&str]) -> BoardSnapshot {
        BoardSnapshot {
            generation,
            headlines: texts
                .iter()
                .enumerate()
                .map(|(i, text)| HeadlineRecord {
                    id: format!("id-{}", i + 1),
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    fn fast_animator() -> TypingAnimator {
        TypingAnimator::new(Duration::from_millis(1), 0.0)
    }

    fn lang(code: &str) -> Language {
        Language::from_code(code).unwrap()
    }

    /// Final text per id, in order of first appearance
    fn final_texts(events: &[HeadlineEvent]) -> Vec<(String, String)> {
        let mut finals: Vec<(String, String)> = Vec::new();
        for event in events {
            if let HeadlineEvent::Typed { id, text, .. } = event {
                match finals.iter_mut().find(|(i, _)| i == id) {
                    Some(entry) => entry.1.clone_from(text),
                    None => finals.push((id.clone(), text.clone())),
                }
            }
        }
        finals
    }

    async fn drain(mut rx: mpsc::Receiver<HeadlineEvent>) -> Vec<HeadlineEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_translates_every_headline_in_order() {
        let orchestrator = TranslationOrchestrator::new(FakeTranslator::new(), fast_animator());
        let (tx, rx) = mpsc::channel(1024);
        let collector = tokio::spawn(drain(rx));

        let outcome = orchestrator
            .run(lang("FR"), snapshot(1, &["one", "two"]), &tx)
            .await;
        drop(tx);
        let events = collector.await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Completed(RunSummary {
                language: lang("FR"),
                translated: 2,
                failed: 0,
                interrupted: false,
            })
        );
        assert_eq!(
            final_texts(&events),
            vec![
                ("id-1".to_string(), "FR:one".to_string()),
                ("id-2".to_string(), "FR:two".to_string()),
            ]
        );
        assert!(events.iter().all(|e| e.generation() == 1));

        // Frames for id-1 all come before any frame for id-2
        let first_two = events.iter().position(|e| e.id() == "id-2").unwrap();
        assert!(events[first_two..].iter().all(|e| e.id() == "id-2"));

        assert!(!orchestrator.is_busy());
        assert_eq!(orchestrator.active_language(), lang("FR"));
    }

    #[tokio::test]
    async fn test_failed_headline_does_not_stop_the_run() {
        let mut translator = FakeTranslator::new();
        translator.fail_on = vec!["two".to_string()];
        let orchestrator = TranslationOrchestrator::new(translator, fast_animator());
        let (tx, rx) = mpsc::channel(1024);
        let collector = tokio::spawn(drain(rx));

        let outcome = orchestrator
            .run(lang("DE"), snapshot(3, &["one", "two", "three"]), &tx)
            .await;
        drop(tx);
        let events = collector.await.unwrap();

        match outcome {
            RunOutcome::Completed(summary) => {
                assert_eq!(summary.translated, 2);
                assert_eq!(summary.failed, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            final_texts(&events),
            vec![
                ("id-1".to_string(), "DE:one".to_string()),
                ("id-3".to_string(), "DE:three".to_string()),
            ]
        );
        assert!(events.contains(&HeadlineEvent::Failed {
            generation: 3,
            id: "id-2".to_string(),
        }));
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_second_run_while_busy_is_rejected() {
        let mut translator = FakeTranslator::new();
        translator.delay = Duration::from_millis(100);
        let calls = translator.calls.clone();
        let orchestrator = Arc::new(TranslationOrchestrator::new(translator, fast_animator()));
        let (tx, rx) = mpsc::channel(1024);
        let collector = tokio::spawn(drain(rx));

        let first = {
            let orchestrator = orchestrator.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                orchestrator
                    .run(lang("DE"), snapshot(1, &["a", "b"]), &tx)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(orchestrator.is_busy());

        let second = orchestrator
            .run(lang("FR"), snapshot(1, &["a", "b"]), &tx)
            .await;
        assert_eq!(
            second,
            RunOutcome::Rejected(RejectReason::Busy { running: lang("DE") })
        );

        let first = first.await.unwrap();
        drop(tx);
        let events = collector.await.unwrap();

        assert!(matches!(first, RunOutcome::Completed(ref s) if s.translated == 2));
        assert!(calls.lock().unwrap().iter().all(|(_, l)| *l == lang("DE")));
        assert!(final_texts(&events).iter().all(|(_, text)| text.starts_with("DE:")));
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_same_language_is_rejected_until_reset() {
        let orchestrator = TranslationOrchestrator::new(FakeTranslator::new(), fast_animator());
        let (tx, mut rx) = mpsc::channel(1024);

        let english = orchestrator
            .run(Language::ENGLISH, snapshot(1, &["x"]), &tx)
            .await;
        assert_eq!(english, RunOutcome::Rejected(RejectReason::AlreadyActive));

        orchestrator.run(lang("ES"), snapshot(1, &["x"]), &tx).await;
        let again = orchestrator.run(lang("es"), snapshot(1, &["x"]), &tx).await;
        assert_eq!(again, RunOutcome::Rejected(RejectReason::AlreadyActive));

        orchestrator.reset_language();
        assert_eq!(orchestrator.active_language(), Language::ENGLISH);
        let after_reset = orchestrator.run(lang("ES"), snapshot(2, &["x"]), &tx).await;
        assert!(matches!(after_reset, RunOutcome::Completed(_)));

        drop(tx);
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_translates_currently_displayed_text() {
        let translator = FakeTranslator::new();
        let calls = translator.calls.clone();
        let orchestrator = TranslationOrchestrator::new(translator, fast_animator());
        let (tx, mut rx) = mpsc::channel(1024);

        // The snapshot already shows a French translation; it is fed as-is.
        orchestrator
            .run(lang("DE"), snapshot(1, &["FR:hello"]), &tx)
            .await;
        drop(tx);
        while rx.recv().await.is_some() {}

        assert_eq!(
            calls.lock().unwrap().clone(),
            vec![("FR:hello".to_string(), lang("DE"))]
        );
    }

    #[tokio::test]
    async fn test_closed_display_interrupts_and_releases_flag() {
        let translator = FakeTranslator::new();
        let calls = translator.calls.clone();
        let orchestrator = TranslationOrchestrator::new(translator, fast_animator());
        let (tx, rx) = mpsc::channel(1024);
        drop(rx);

        let outcome = orchestrator
            .run(lang("IT"), snapshot(1, &["a", "b", "c"]), &tx)
            .await;

        assert!(matches!(outcome, RunOutcome::Completed(ref s) if s.interrupted));
        assert!(calls.lock().unwrap().is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_empty_snapshot_completes() {
        let orchestrator = TranslationOrchestrator::new(FakeTranslator::new(), fast_animator());
        let (tx, _rx) = mpsc::channel(8);

        let outcome = orchestrator.run(lang("SV"), snapshot(1, &[]), &tx).await;

        assert_eq!(
            outcome,
            RunOutcome::Completed(RunSummary {
                language: lang("SV"),
                translated: 0,
                failed: 0,
                interrupted: false,
            })
        );
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_display_closing_mid_headline_is_not_counted() {
        let orchestrator = TranslationOrchestrator::new(FakeTranslator::new(), fast_animator());
        let (tx, mut rx) = mpsc::channel(1);

        // Take the first frame, then go away while the headline is still typing
        let reader = tokio::spawn(async move {
            let first = rx.recv().await;
            drop(rx);
            first
        });

        let outcome = orchestrator
            .run(lang("FR"), snapshot(1, &["a rather long headline", "next"]), &tx)
            .await;
        let first = reader.await.unwrap();

        assert!(matches!(first, Some(HeadlineEvent::Typed { ref text, .. }) if text == "F"));
        assert_eq!(
            outcome,
            RunOutcome::Completed(RunSummary {
                language: lang("FR"),
                translated: 0,
                failed: 0,
                interrupted: true,
            })
        );
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_reset_during_run_keeps_running_language() {
        let mut translator = FakeTranslator::new();
        translator.delay = Duration::from_millis(100);
        let orchestrator = Arc::new(TranslationOrchestrator::new(translator, fast_animator()));
        let (tx, rx) = mpsc::channel(1024);
        let collector = tokio::spawn(drain(rx));

        let first = {
            let orchestrator = orchestrator.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                orchestrator
                    .run(lang("DE"), snapshot(1, &["a"]), &tx)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.reset_language();
        assert_eq!(orchestrator.active_language(), Language::ENGLISH);

        let second = orchestrator.run(lang("FR"), snapshot(2, &["a"]), &tx).await;
        assert_eq!(
            second,
            RunOutcome::Rejected(RejectReason::Busy { running: lang("DE") })
        );

        first.await.unwrap();
        drop(tx);
        collector.await.unwrap();

        assert!(!orchestrator.is_busy());
        assert_eq!(orchestrator.active_language(), Language::ENGLISH);
    }

    struct PanickingTranslator;

    #[async_trait]
    impl Translate for PanickingTranslator {
        async fn translate(&self, _text: &str, _target: Language) -> TranslationResult {
            panic!("translator blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_translator_releases_busy_flag() {
        let orchestrator = Arc::new(TranslationOrchestrator::new(
            PanickingTranslator,
            fast_animator(),
        ));
        let (tx, _rx) = mpsc::channel(8);

        let run = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .run(lang("NL"), snapshot(1, &["a"]), &tx)
                    .await
            })
        };

        assert!(run.await.unwrap_err().is_panic());
        assert!(!orchestrator.is_busy());
        assert_eq!(orchestrator.active_language(), lang("NL"));
    }
}
