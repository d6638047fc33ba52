//! Lobby (session) model.
//!
//! Table state only exists once cards are dealt: `Stage::Waiting` has none,
//! every later stage carries a `Table` with a deck handle.

use serde::{Deserialize, Serialize};

use super::cards::Card;
use super::deck::Deck;
use super::player::Player;
use super::rules::successor;
use super::scoring::ScoreboardEntry;
use crate::errors::domain::{ConflictKind, DomainError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LobbyStatus {
    Waiting,
    InProgress,
}

/// A card drawn from the deck and held server-side until the drawer
/// places or discards it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDraw {
    pub player_id: String,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub deck: Deck,
    pub discard_pile: Vec<Card>,
    pub current_turn: String,
    pub player_started_last_turn: Option<String>,
    pub pending_draw: Option<PendingDraw>,
    /// The final lap finished but scoring it failed upstream; the next
    /// action retries the round end instead of playing on.
    pub round_end_due: bool,
}

impl Table {
    pub fn top_discard(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    /// Appends face-up, removing any stale copy of the same code first.
    pub fn push_discard(&mut self, card: Card) {
        self.discard_pile.retain(|c| c.code != card.code);
        self.discard_pile.push(card.face_up());
    }

    pub fn pending_for(&self, player_id: &str) -> Option<&Card> {
        self.pending_draw
            .as_ref()
            .filter(|p| p.player_id == player_id)
            .map(|p| &p.card)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Waiting,
    Playing(Table),
    /// Round scored; the next deal is scheduled.
    RoundOver(Table),
    GameOver(Table),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Waiting => "WAITING",
            Stage::Playing(_) => "PLAYING",
            Stage::RoundOver(_) => "ROUND_OVER",
            Stage::GameOver(_) => "GAME_OVER",
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            Stage::Waiting => None,
            Stage::Playing(t) | Stage::RoundOver(t) | Stage::GameOver(t) => Some(t),
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Stage::Waiting => None,
            Stage::Playing(t) | Stage::RoundOver(t) | Stage::GameOver(t) => Some(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    pub id: String,
    pub host: String,
    pub max_players: usize,
    pub rounds: u32,
    pub current_round: u32,
    pub players: Vec<Player>,
    pub scoreboard: Option<Vec<ScoreboardEntry>>,
    pub stage: Stage,
}

impl Lobby {
    pub fn new(id: impl Into<String>, mut host: Player, max_players: usize, rounds: u32) -> Self {
        host.is_host = true;
        Self {
            id: id.into(),
            host: host.player_id.clone(),
            max_players,
            rounds,
            current_round: 1,
            players: vec![host],
            scoreboard: None,
            stage: Stage::Waiting,
        }
    }

    pub fn current_players(&self) -> usize {
        self.players.len()
    }

    pub fn status(&self) -> LobbyStatus {
        match self.stage {
            Stage::Waiting => LobbyStatus::Waiting,
            _ => LobbyStatus::InProgress,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    /// Seats a new non-host player.
    pub fn add_player(&mut self, mut player: Player) -> Result<(), DomainError> {
        if !matches!(self.stage, Stage::Waiting) {
            return Err(DomainError::conflict(
                ConflictKind::GameInProgress,
                format!("lobby {} already started", self.id),
            ));
        }
        if self.is_full() {
            return Err(DomainError::conflict(
                ConflictKind::LobbyFull,
                format!("lobby {} has {} players", self.id, self.max_players),
            ));
        }
        player.is_host = false;
        self.players.push(player);
        Ok(())
    }

    /// Removes a player and repairs every role they held.
    ///
    /// The host role passes to the first remaining player. At the table the
    /// turn and the last-turn latch pass to the leaver's successor, and a
    /// pending draw goes to the discard pile.
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.player_id == player_id)?;
        let heir = successor(&self.players, player_id)
            .filter(|next| *next != player_id)
            .map(str::to_string);

        let removed = self.players.remove(idx);

        if removed.is_host {
            if let Some(first) = self.players.first_mut() {
                first.is_host = true;
                self.host = first.player_id.clone();
            }
        }

        if let (Some(table), Some(heir)) = (self.stage.table_mut(), heir) {
            if table.current_turn == player_id {
                table.current_turn.clone_from(&heir);
            }
            if table.player_started_last_turn.as_deref() == Some(player_id) {
                table.player_started_last_turn = Some(heir);
            }
            if table
                .pending_draw
                .as_ref()
                .is_some_and(|p| p.player_id == player_id)
            {
                if let Some(pending) = table.pending_draw.take() {
                    table.push_discard(pending.card);
                }
            }
        }

        Some(removed)
    }

    pub fn table(&self) -> Option<&Table> {
        self.stage.table()
    }

    pub fn table_mut(&mut self) -> Option<&mut Table> {
        self.stage.table_mut()
    }

    /// Table of a round in progress.
    pub fn playing_mut(&mut self) -> Option<(&mut Table, &mut Vec<Player>)> {
        match &mut self.stage {
            Stage::Playing(t) => Some((t, &mut self.players)),
            _ => None,
        }
    }

    /// True while a finished round is still waiting to be scored.
    pub fn round_end_due(&self) -> bool {
        matches!(&self.stage, Stage::Playing(t) if t.round_end_due)
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round + 1 > self.rounds
    }
}
