//! External deck service seam.
//!
//! `HttpDeckProvider` talks to a deckofcardsapi-compatible REST service.
//! `LocalDeckProvider` keeps decks in process for offline runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::cards::{Card, CardImages, Rank};
use crate::domain::deck::{Deck, Drawn};
use crate::error::AppError;
use crate::errors::domain::{DomainError, InfraErrorKind};

#[async_trait]
pub trait DeckProvider: Send + Sync {
    /// Creates and shuffles `deck_count` decks with jokers.
    async fn create_deck(&self, deck_count: u32) -> Result<Deck, DomainError>;

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Drawn, DomainError>;

    /// Returns every card to the deck and shuffles it.
    async fn reshuffle(&self, deck_id: &str) -> Result<Deck, DomainError>;

    /// Forgets a deck whose lobby is gone. The remote API has no delete
    /// call and expires idle decks itself, so the default does nothing.
    async fn release(&self, _deck_id: &str) {}
}

fn unavailable(detail: impl Into<String>) -> DomainError {
    DomainError::infra(InfraErrorKind::DeckUnavailable, detail)
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiDeck {
    success: bool,
    #[serde(default)]
    deck_id: String,
    #[serde(default)]
    remaining: u32,
    #[serde(default)]
    cards: Vec<ApiCard>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    code: String,
    value: String,
    suit: String,
    #[serde(default)]
    images: Option<CardImages>,
}

impl TryFrom<ApiCard> for Card {
    type Error = DomainError;

    fn try_from(c: ApiCard) -> Result<Self, Self::Error> {
        Card::new(c.code, c.suit, c.value, c.images)
            .map_err(|e| unavailable(format!("provider sent an unusable card: {e}")))
    }
}

pub struct HttpDeckProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeckProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("deck http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<ApiDeck, DomainError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "deck provider request");

        let resp = self.client.get(&url).send().await.map_err(map_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "deck provider returned error status");
            return Err(unavailable(format!("deck provider answered {status}")));
        }

        let body: ApiDeck = resp.json().await.map_err(map_reqwest)?;
        if !body.success {
            let reason = body.error.unwrap_or_else(|| "unknown".to_string());
            warn!(%url, %reason, "deck provider reported failure");
            return Err(unavailable(format!("deck provider failed: {reason}")));
        }
        Ok(body)
    }
}

fn map_reqwest(err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::infra(InfraErrorKind::DeckTimeout, format!("deck provider timed out: {err}"))
    } else {
        unavailable(format!("deck provider unreachable: {err}"))
    }
}

#[async_trait]
impl DeckProvider for HttpDeckProvider {
    async fn create_deck(&self, deck_count: u32) -> Result<Deck, DomainError> {
        let body = self
            .get(&format!(
                "new/shuffle/?deck_count={deck_count}&jokers_enabled=true"
            ))
            .await?;
        Ok(Deck::new(body.deck_id, body.remaining))
    }

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Drawn, DomainError> {
        let body = self.get(&format!("{deck_id}/draw/?count={count}")).await?;
        if body.cards.len() != count {
            return Err(unavailable(format!(
                "asked for {count} cards, provider returned {}",
                body.cards.len()
            )));
        }
        let cards = body
            .cards
            .into_iter()
            .map(Card::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Drawn {
            cards,
            remaining: body.remaining,
        })
    }

    async fn reshuffle(&self, deck_id: &str) -> Result<Deck, DomainError> {
        let body = self.get(&format!("{deck_id}/shuffle/")).await?;
        Ok(Deck::new(body.deck_id, body.remaining))
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

const SUITS: [(&str, char); 4] = [
    ("SPADES", 'S'),
    ("DIAMONDS", 'D'),
    ("CLUBS", 'C'),
    ("HEARTS", 'H'),
];
const IMAGE_BASE: &str = "https://deckofcardsapi.com/static/img";

fn code_char(rank: Rank) -> char {
    match rank {
        Rank::Ace => 'A',
        Rank::Pip(10) => '0',
        Rank::Pip(n) => char::from(b'0' + n),
        Rank::Jack => 'J',
        Rank::Queen => 'Q',
        Rank::King => 'K',
        Rank::Joker => 'X',
    }
}

fn images_for(code: &str) -> Option<CardImages> {
    Some(CardImages {
        svg: format!("{IMAGE_BASE}/{code}.svg"),
        png: format!("{IMAGE_BASE}/{code}.png"),
    })
}

/// 52 suited cards plus two jokers, per deck copy.
fn full_deck(deck_count: u32) -> Vec<Card> {
    let ranks = std::iter::once(Rank::Ace)
        .chain((2..=10).map(Rank::Pip))
        .chain([Rank::Jack, Rank::Queen, Rank::King]);
    let ranks: Vec<Rank> = ranks.collect();

    let mut cards = Vec::with_capacity(54 * deck_count as usize);
    for _ in 0..deck_count {
        for (suit, s) in SUITS {
            for rank in &ranks {
                let code = format!("{}{}", code_char(*rank), s);
                cards.push(Card {
                    images: images_for(&code),
                    code,
                    suit: suit.to_string(),
                    value: rank.as_value(),
                    face_up: false,
                    score: rank.score(),
                });
            }
        }
        for (code, suit) in [("X1", "BLACK"), ("X2", "RED")] {
            cards.push(Card {
                code: code.to_string(),
                suit: suit.to_string(),
                value: Rank::Joker.as_value(),
                face_up: false,
                score: Rank::Joker.score(),
                images: images_for(code),
            });
        }
    }
    cards
}

struct LocalDeck {
    deck_count: u32,
    /// Top of the deck is the end of the vec.
    undrawn: Vec<Card>,
}

pub struct LocalDeckProvider {
    decks: DashMap<String, LocalDeck>,
    rng: Mutex<ChaCha8Rng>,
    failing: AtomicBool,
}

impl Default for LocalDeckProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDeckProvider {
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Deterministic shuffles for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            decks: DashMap::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every call fails as if the remote service were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn deck_count(&self) -> usize {
        self.decks.len()
    }

    fn check_up(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable("local deck provider is set to fail"));
        }
        Ok(())
    }

    fn shuffled(&self, deck_count: u32) -> Vec<Card> {
        let mut cards = full_deck(deck_count);
        cards.shuffle(&mut *self.rng.lock());
        cards
    }

    fn new_deck_id(&self) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = self.rng.lock();
        (0..12)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect()
    }
}

#[async_trait]
impl DeckProvider for LocalDeckProvider {
    async fn create_deck(&self, deck_count: u32) -> Result<Deck, DomainError> {
        self.check_up()?;
        let undrawn = self.shuffled(deck_count);
        let remaining = undrawn.len() as u32;
        let mut deck_id = self.new_deck_id();
        while self.decks.contains_key(&deck_id) {
            deck_id = self.new_deck_id();
        }
        self.decks.insert(
            deck_id.clone(),
            LocalDeck {
                deck_count,
                undrawn,
            },
        );
        Ok(Deck::new(deck_id, remaining))
    }

    async fn draw(&self, deck_id: &str, count: usize) -> Result<Drawn, DomainError> {
        self.check_up()?;
        let mut deck = self
            .decks
            .get_mut(deck_id)
            .ok_or_else(|| unavailable(format!("deck {deck_id} does not exist")))?;
        if deck.undrawn.len() < count {
            return Err(unavailable(format!(
                "not enough cards remaining to draw {count}"
            )));
        }
        let at = deck.undrawn.len() - count;
        let mut cards = deck.undrawn.split_off(at);
        cards.reverse();
        Ok(Drawn {
            cards,
            remaining: deck.undrawn.len() as u32,
        })
    }

    async fn reshuffle(&self, deck_id: &str) -> Result<Deck, DomainError> {
        self.check_up()?;
        let deck_count = self
            .decks
            .get(deck_id)
            .map(|d| d.deck_count)
            .ok_or_else(|| unavailable(format!("deck {deck_id} does not exist")))?;
        let undrawn = self.shuffled(deck_count);
        let remaining = undrawn.len() as u32;
        if let Some(mut deck) = self.decks.get_mut(deck_id) {
            deck.undrawn = undrawn;
        }
        Ok(Deck::new(deck_id, remaining))
    }

    async fn release(&self, deck_id: &str) {
        if self.decks.remove(deck_id).is_some() {
            debug!(deck_id, "Local deck released");
        }
    }
}
