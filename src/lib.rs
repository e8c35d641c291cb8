//! Headline reader: search Hacker News stories, score their sentiment and
//! translate them in place with a typewriter effect.

pub mod animation;
pub mod board;
pub mod config;
pub mod date;
pub mod hover;
pub mod language;
pub mod orchestrator;
pub mod popup;
pub mod sentiment;
pub mod story;
pub mod translation;
