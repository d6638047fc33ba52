//! Card model as exchanged with the deck provider and clients.
//!
//! The provider identifies values by name ("ACE", "7", "QUEEN", "JOKER").
//! `Rank` is the parsed form; a card's `score` is always derived from it and
//! never taken from a client payload.

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, ValidationKind};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Rank {
    Ace,
    /// Pip cards 2 through 10.
    Pip(u8),
    Jack,
    Queen,
    King,
    Joker,
}

impl Rank {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let rank = match value.trim().to_ascii_uppercase().as_str() {
            "ACE" => Rank::Ace,
            "JACK" => Rank::Jack,
            "QUEEN" => Rank::Queen,
            "KING" => Rank::King,
            "JOKER" => Rank::Joker,
            other => match other.parse::<u8>() {
                Ok(n) if (2..=10).contains(&n) => Rank::Pip(n),
                _ => {
                    return Err(DomainError::validation(
                        ValidationKind::InvalidCard,
                        format!("unknown card value {value:?}"),
                    ))
                }
            },
        };
        Ok(rank)
    }

    /// Points for a single card.
    pub const fn score(self) -> i32 {
        match self {
            Rank::Ace => 1,
            Rank::Pip(2) => -2,
            Rank::Pip(n) => n as i32,
            Rank::Jack | Rank::Queen => 10,
            Rank::King => 0,
            Rank::Joker => -1,
        }
    }

    /// Name used by the provider.
    pub fn as_value(self) -> String {
        match self {
            Rank::Ace => "ACE".to_string(),
            Rank::Pip(n) => n.to_string(),
            Rank::Jack => "JACK".to_string(),
            Rank::Queen => "QUEEN".to_string(),
            Rank::King => "KING".to_string(),
            Rank::Joker => "JOKER".to_string(),
        }
    }
}

/// Score for a provider value name; unknown names score 0.
pub fn card_score(value: &str) -> i32 {
    Rank::parse(value).map(Rank::score).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImages {
    pub svg: String,
    pub png: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub code: String,
    pub suit: String,
    pub value: String,
    #[serde(default)]
    pub face_up: bool,
    #[serde(default)]
    pub score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<CardImages>,
}

impl Card {
    /// Builds a face-down card with its score derived from `value`.
    pub fn new(
        code: impl Into<String>,
        suit: impl Into<String>,
        value: impl Into<String>,
        images: Option<CardImages>,
    ) -> Result<Self, DomainError> {
        let value = value.into();
        let rank = Rank::parse(&value)?;
        Ok(Self {
            code: code.into(),
            suit: suit.into(),
            value,
            face_up: false,
            score: rank.score(),
            images,
        })
    }

    pub fn rank(&self) -> Option<Rank> {
        Rank::parse(&self.value).ok()
    }

    pub fn is_joker(&self) -> bool {
        matches!(self.rank(), Some(Rank::Joker))
    }

    pub fn face_up(mut self) -> Self {
        self.face_up = true;
        self
    }

    pub fn face_down(mut self) -> Self {
        self.face_up = false;
        self
    }
}

/// Client-supplied card reference; only the code is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CardRef {
    pub code: String,
}
