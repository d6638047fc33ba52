//! Flat wire view of a lobby, as sent to clients.
//!
//! The pending draw card itself is never exposed; only who holds it.

use serde::{Deserialize, Serialize};

use crate::domain::cards::Card;
use crate::domain::deck::Deck;
use crate::domain::lobby::{Lobby, LobbyStatus};
use crate::domain::player::Player;
use crate::domain::scoring::ScoreboardEntry;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub id: String,
    pub host: String,
    pub status: LobbyStatus,
    pub phase: String,
    pub max_players: usize,
    pub current_players: usize,
    pub players: Vec<Player>,
    pub rounds: u32,
    pub current_round: u32,
    pub score_board: Option<Vec<ScoreboardEntry>>,
    pub deck: Option<Deck>,
    pub discard_pile: Vec<Card>,
    pub current_turn: Option<String>,
    pub player_started_last_turn: Option<String>,
    pub pending_draw_by: Option<String>,
}

impl From<&Lobby> for LobbySnapshot {
    fn from(lobby: &Lobby) -> Self {
        let table = lobby.table();
        Self {
            id: lobby.id.clone(),
            host: lobby.host.clone(),
            status: lobby.status(),
            phase: lobby.stage.name().to_string(),
            max_players: lobby.max_players,
            current_players: lobby.current_players(),
            players: lobby.players.clone(),
            rounds: lobby.rounds,
            current_round: lobby.current_round,
            score_board: lobby.scoreboard.clone(),
            deck: table.map(|t| t.deck.clone()),
            discard_pile: table.map(|t| t.discard_pile.clone()).unwrap_or_default(),
            current_turn: table.map(|t| t.current_turn.clone()),
            player_started_last_turn: table.and_then(|t| t.player_started_last_turn.clone()),
            pending_draw_by: table
                .and_then(|t| t.pending_draw.as_ref())
                .map(|p| p.player_id.clone()),
        }
    }
}
