//! Handle to a provider-side deck.

use serde::{Deserialize, Serialize};

use super::cards::Card;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub deck_id: String,
    pub remaining: u32,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(deck_id: impl Into<String>, remaining: u32) -> Self {
        Self {
            deck_id: deck_id.into(),
            remaining,
            cards: Vec::new(),
        }
    }
}

/// Result of drawing from a provider deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawn {
    pub cards: Vec<Card>,
    pub remaining: u32,
}
