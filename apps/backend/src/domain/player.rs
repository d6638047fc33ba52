//! Players and their six-card boards.

use serde::{Deserialize, Serialize};

use super::cards::Card;
use super::rules::{BOARD_SIZE, COLUMNS, FIRST_TURN_MOVES};
use super::scoring::column_scores;
use crate::errors::domain::{DomainError, ValidationKind};

/// Two rows of three; column `c` holds slots `c` and `c + COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Card; BOARD_SIZE]);

impl Board {
    pub fn cards(&self) -> &[Card; BOARD_SIZE] {
        &self.0
    }

    pub fn column(&self, col: usize) -> (&Card, &Card) {
        (&self.0[col], &self.0[col + COLUMNS])
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.0.iter().position(|c| c.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }

    pub fn all_face_up(&self) -> bool {
        self.0.iter().all(|c| c.face_up)
    }

    /// Turns one card face-up. Returns false when the card is not on the
    /// board or is already showing.
    pub fn flip(&mut self, code: &str) -> bool {
        match self.0.iter_mut().find(|c| c.code == code) {
            Some(card) if !card.face_up => {
                card.face_up = true;
                true
            }
            _ => false,
        }
    }

    pub fn reveal_all(&mut self) {
        for card in self.0.iter_mut() {
            card.face_up = true;
        }
    }

    /// Puts `card` face-up in the slot holding `code`, returning the card
    /// that was there.
    pub fn swap(&mut self, code: &str, card: Card) -> Option<Card> {
        let idx = self.position(code)?;
        Some(std::mem::replace(&mut self.0[idx], card.face_up()))
    }
}

impl TryFrom<Vec<Card>> for Board {
    type Error = DomainError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        let len = cards.len();
        <[Card; BOARD_SIZE]>::try_from(cards).map(Board).map_err(|_| {
            DomainError::validation(
                ValidationKind::Other("board size".into()),
                format!("a board needs {BOARD_SIZE} cards, got {len}"),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: String,
    pub nickname: String,
    pub image: String,
    pub is_host: bool,
    pub moves_left: u8,
    pub cards: Option<Board>,
    pub score: [i32; COLUMNS],
}

impl Player {
    pub fn new(
        player_id: impl Into<String>,
        nickname: impl Into<String>,
        image: impl Into<String>,
        is_host: bool,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            nickname: nickname.into(),
            image: image.into(),
            is_host,
            moves_left: FIRST_TURN_MOVES,
            cards: None,
            score: [0; COLUMNS],
        }
    }

    /// Gives the player a fresh face-down board.
    pub fn deal(&mut self, board: Board) {
        self.cards = Some(board);
        self.moves_left = FIRST_TURN_MOVES;
        self.recompute_score();
    }

    pub fn board_face_up(&self) -> bool {
        self.cards.as_ref().is_some_and(Board::all_face_up)
    }

    pub fn holds(&self, code: &str) -> bool {
        self.cards.as_ref().is_some_and(|b| b.contains(code))
    }

    pub fn flip(&mut self, code: &str) -> bool {
        let flipped = self.cards.as_mut().is_some_and(|b| b.flip(code));
        if flipped {
            self.recompute_score();
        }
        flipped
    }

    pub fn reveal_all(&mut self) {
        if let Some(board) = self.cards.as_mut() {
            board.reveal_all();
        }
        self.recompute_score();
    }

    pub fn recompute_score(&mut self) {
        self.score = self
            .cards
            .as_ref()
            .map(column_scores)
            .unwrap_or([0; COLUMNS]);
    }
}
