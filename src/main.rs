//! Terminal front end for the headline reader
//!
//! Usage:
//!   news-reader [QUERY...] [--lang CODE] [--sentiment]
//!   news-reader --languages
//!
//! Optional environment variables (a `.env` file is honoured):
//! - SEARCH_API_URL
//! - HUGGINGFACE_API_TOKEN, SENTIMENT_API_URL, USE_AI
//! - DEEPL_API_KEY, DEEPL_API_URL
//! - REQUEST_TIMEOUT_SECS, TYPING_SPEED_MS, TYPING_RANDOMNESS

use anyhow::{bail, Context, Result};
use chrono::Utc;
use news_reader::animation::TypingAnimator;
use news_reader::board::{HeadlineBoard, HeadlineEvent};
use news_reader::config::Config;
use news_reader::hover::HoverTracker;
use news_reader::language::Language;
use news_reader::orchestrator::{RunOutcome, TranslationOrchestrator};
use news_reader::popup::{PopupContent, SentimentState};
use news_reader::sentiment::SentimentAnnotator;
use news_reader::story::{search_stories, Popularity};
use news_reader::translation::{DeeplTranslator, Translate};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Args {
    query: String,
    language: Option<Language>,
    sentiment: bool,
    list_languages: bool,
}

impl Args {
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = Args::default();
        let mut words = Vec::new();
        let mut raw = raw.into_iter();

        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--lang" => {
                    let code = raw.next().context("--lang needs a language code")?;
                    args.language = Some(Language::from_code(&code)?);
                }
                "--sentiment" => args.sentiment = true,
                "--languages" => args.list_languages = true,
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                _ => words.push(arg),
            }
        }

        args.query = words.join(" ");
        Ok(args)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never break the typing animation on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("news_reader=info".parse()?),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;

    // --languages only prints the table, no configuration needed
    if args.list_languages {
        for language in Language::all() {
            println!("{} {} {}", language.flag(), language.code(), language.name());
        }
        return Ok(());
    }

    // Load configuration
    let mut config = Config::from_env()?;
    if args.sentiment {
        config.use_ai = true;
    }
    let client = config.http_client()?;

    // One client and one orchestrator for the whole session
    let mut board = HeadlineBoard::new();
    let orchestrator = TranslationOrchestrator::new(
        DeeplTranslator::new(client.clone(), &config),
        TypingAnimator::new(
            Duration::from_millis(config.typing_speed_ms),
            config.typing_randomness,
        ),
    );

    // Step 1: Search and fill the board
    let stories = search_stories(&client, &config, &args.query).await?;
    board.replace(stories);
    orchestrator.reset_language();

    if board.is_empty() {
        info!("No stories found for {:?}", args.query);
        return Ok(());
    }

    print_headlines(&board)?;

    // Step 2: Sentiment for every headline (optional)
    if config.use_ai {
        print_sentiment(&board, &SentimentAnnotator::new(client.clone(), &config)).await?;
    }

    // Step 3: Translate in place (optional)
    if let Some(language) = args.language {
        translate_headlines(&mut board, &orchestrator, language, std::io::stdout()).await?;
    }

    Ok(())
}

fn print_headlines(board: &HeadlineBoard) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for (index, (story, text)) in board.headlines().enumerate() {
        let tier = match story.popularity() {
            Popularity::Viral => " [viral]",
            Popularity::Hot => " [hot]",
            Popularity::Warm => " [warm]",
            Popularity::Normal => "",
        };
        writeln!(out, "{:>2}. {}{}", index + 1, text, tier)?;
    }
    out.flush()?;
    Ok(())
}

/// Hover over every headline at once: all requests are in flight together.
async fn print_sentiment(board: &HeadlineBoard, annotator: &SentimentAnnotator) -> Result<()> {
    let stories: Vec<_> = board.headlines().map(|(story, _)| story.clone()).collect();
    let results =
        futures::future::join_all(stories.iter().map(|story| annotator.annotate(&story.title)))
            .await;

    let now = Utc::now();
    let mut tracker = HoverTracker::new(true);
    let mut out = std::io::stdout().lock();

    for (story, sentiment) in stories.iter().zip(results) {
        let Some(ticket) = tracker.enter(&story.id) else {
            continue;
        };
        tracker.accept_sentiment(&ticket, sentiment);
        let state = tracker
            .active()
            .map(|popup| popup.sentiment)
            .unwrap_or(SentimentState::Pending);

        writeln!(out, "\n{}", story.title)?;
        for line in PopupContent::render(story, &state, now) {
            writeln!(out, "    {}", line)?;
        }
        tracker.leave(&story.id);
    }
    out.flush()?;
    Ok(())
}

async fn translate_headlines<T, W>(
    board: &mut HeadlineBoard,
    orchestrator: &TranslationOrchestrator<T>,
    language: Language,
    mut out: W,
) -> Result<()>
where
    T: Translate,
    W: Write,
{
    let (tx, rx) = mpsc::channel::<HeadlineEvent>(256);
    let snapshot = board.snapshot();
    let positions: Vec<String> = snapshot.headlines.iter().map(|h| h.id.clone()).collect();

    writeln!(out, "\n{} {}", language.flag(), language.name())?;

    let producer = async move {
        let outcome = orchestrator.run(language, snapshot, &tx).await;
        drop(tx);
        outcome
    };

    // Owns the receiver: a render error drops it, which stops the run
    let consumer = async move {
        let mut rx = rx;
        let mut current: Option<String> = None;

        while let Some(event) = rx.recv().await {
            if !board.apply(&event) {
                continue;
            }
            let HeadlineEvent::Typed { id, text, .. } = &event else {
                continue;
            };

            // A new headline starts on its own line
            if current.as_deref() != Some(id.as_str()) {
                if current.is_some() {
                    writeln!(out)?;
                }
                current = Some(id.clone());
            }
            let number = positions.iter().position(|p| p == id).map_or(0, |i| i + 1);
            write!(out, "\r\x1b[2K{:>2}. {}", number, text)?;
            out.flush()?;
        }

        if current.is_some() {
            writeln!(out)?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (outcome, rendered) = tokio::join!(producer, consumer);
    rendered.context("Failed to render translated headlines")?;

    match outcome {
        RunOutcome::Completed(summary) if summary.failed > 0 => {
            warn!(
                "{} of {} headlines could not be translated",
                summary.failed,
                summary.failed + summary.translated
            );
        }
        RunOutcome::Completed(_) => {}
        RunOutcome::Rejected(reason) => warn!("Translation not started: {:?}", reason),
    }

    Ok(())
}
