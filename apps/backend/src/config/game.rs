use std::env;
use std::time::Duration;

use crate::domain::rules::{DEFAULT_ROUNDS, MAX_PLAYERS};
use crate::error::AppError;

pub const DEFAULT_DECK_API_URL: &str = "https://deckofcardsapi.com/api/deck";

/// Table rules a new lobby is created with, plus round pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub max_players: usize,
    pub rounds: u32,
    /// Pause between a round summary and the next deal.
    pub round_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            rounds: DEFAULT_ROUNDS,
            round_delay: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckProviderKind {
    /// deckofcardsapi over HTTP
    Http,
    /// In-process shuffled decks
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckConfig {
    pub provider: DeckProviderKind,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            provider: DeckProviderKind::Http,
            api_url: DEFAULT_DECK_API_URL.to_string(),
            timeout: Duration::from_millis(5000),
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let max_players = parsed(&lookup, "GOLF_MAX_PLAYERS")?.unwrap_or(defaults.max_players);
        if !(1..=MAX_PLAYERS).contains(&max_players) {
            return Err(AppError::config(format!(
                "GOLF_MAX_PLAYERS must be between 1 and {MAX_PLAYERS}, got {max_players}"
            )));
        }
        let rounds = parsed(&lookup, "GOLF_ROUNDS")?.unwrap_or(defaults.rounds);
        if rounds == 0 {
            return Err(AppError::config("GOLF_ROUNDS must be at least 1"));
        }
        let round_delay = parsed(&lookup, "GOLF_ROUND_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.round_delay);

        Ok(Self {
            max_players,
            rounds,
            round_delay,
        })
    }
}

impl DeckConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let provider = match lookup("DECK_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("http") => DeckProviderKind::Http,
            Some("local") => DeckProviderKind::Local,
            Some(other) => {
                return Err(AppError::config(format!(
                    "DECK_PROVIDER must be 'http' or 'local', got '{other}'"
                )))
            }
        };
        let api_url = lookup("DECK_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);
        let timeout = parsed(&lookup, "DECK_API_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);

        Ok(Self {
            provider,
            api_url,
            timeout,
        })
    }
}

/// Parses an optional variable; set-but-malformed is an error.
pub(crate) fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AppError::config(format!("Environment variable '{name}' has invalid value '{raw}'"))
        }),
    }
}
