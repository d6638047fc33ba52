use std::ops::RangeInclusive;

use super::player::Player;
use crate::errors::domain::{DomainError, ValidationKind};

pub const BOARD_SIZE: usize = 6;
pub const COLUMNS: usize = 3;
pub const FIRST_TURN_MOVES: u8 = 3;
pub const MAX_PLAYERS: usize = 6;
pub const DEFAULT_ROUNDS: u32 = 2;
pub const LOBBY_ID_LEN: usize = 12;
pub const NICKNAME_LEN: RangeInclusive<usize> = 3..=12;

/// Cards drawn to deal a round: one board each plus the discard starter.
pub fn cards_to_deal(players: usize) -> usize {
    players * BOARD_SIZE + 1
}

/// The first-turn phase lasts while anyone still has reveal moves.
pub fn is_first_turn(players: &[Player]) -> bool {
    players.iter().any(|p| p.moves_left > 0)
}

pub fn is_last_turn(players: &[Player]) -> bool {
    players.iter().any(Player::board_face_up)
}

/// Index of the player after `player_id`, wrapping to 0. Unknown ids and
/// single-player lobbies yield 0.
pub fn next_turn(players: &[Player], player_id: &str) -> usize {
    match players.iter().position(|p| p.player_id == player_id) {
        Some(idx) if idx + 1 < players.len() => idx + 1,
        _ => 0,
    }
}

pub fn successor<'a>(players: &'a [Player], player_id: &str) -> Option<&'a str> {
    players
        .get(next_turn(players, player_id))
        .map(|p| p.player_id.as_str())
}

/// Missing players have no moves left.
pub fn has_moves_left(players: &[Player], player_id: &str) -> bool {
    players
        .iter()
        .find(|p| p.player_id == player_id)
        .is_some_and(|p| p.moves_left > 0)
}

/// True when this action should set the round's one-shot last-turn latch.
pub fn starts_last_turn(players: &[Player], latch: Option<&str>, actor: &str) -> bool {
    latch.is_none()
        && players
            .iter()
            .find(|p| p.player_id == actor)
            .is_some_and(Player::board_face_up)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPhase {
    FirstTurn,
    Normal,
    LastTurnPending { started_by: String },
}

impl TurnPhase {
    pub fn of(players: &[Player], latch: Option<&str>) -> Self {
        match latch {
            Some(started_by) => TurnPhase::LastTurnPending {
                started_by: started_by.to_string(),
            },
            None if is_first_turn(players) => TurnPhase::FirstTurn,
            None => TurnPhase::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    /// Actor keeps the turn (first-turn reveals remaining).
    Stay,
    Next(String),
    RoundOver,
}

/// Decides who plays next after `actor` completed an action.
///
/// In the last-turn phase the actor's board is revealed. In the first-turn
/// phase the actor's reveal counter is consumed.
pub fn advance_turn(phase: &TurnPhase, players: &mut [Player], actor: &str) -> TurnAdvance {
    let next_id = |players: &[Player]| successor(players, actor).map(str::to_string);

    match phase {
        TurnPhase::LastTurnPending { started_by } => {
            if let Some(p) = players.iter_mut().find(|p| p.player_id == actor) {
                p.reveal_all();
            }
            match next_id(players) {
                Some(next) if next != *started_by => TurnAdvance::Next(next),
                _ => TurnAdvance::RoundOver,
            }
        }
        TurnPhase::FirstTurn => {
            if let Some(p) = players.iter_mut().find(|p| p.player_id == actor) {
                p.moves_left = p.moves_left.saturating_sub(1);
            }
            if has_moves_left(players, actor) {
                TurnAdvance::Stay
            } else {
                next_id(players).map_or(TurnAdvance::Stay, TurnAdvance::Next)
            }
        }
        TurnPhase::Normal => next_id(players).map_or(TurnAdvance::Stay, TurnAdvance::Next),
    }
}

/// Whether `actor` may take a turn action right now.
///
/// During the first-turn phase reveals are simultaneous: anyone with moves
/// left may act. Afterwards only the current-turn player may.
pub fn ensure_may_act(
    players: &[Player],
    current_turn: &str,
    actor: &str,
) -> Result<(), DomainError> {
    if !players.iter().any(|p| p.player_id == actor) {
        return Err(DomainError::validation(
            ValidationKind::InvalidPlayerId,
            format!("{actor} is not seated"),
        ));
    }
    if is_first_turn(players) {
        if has_moves_left(players, actor) {
            return Ok(());
        }
        return Err(DomainError::validation(
            ValidationKind::PhaseMismatch,
            format!("{actor} has no first-turn moves left"),
        ));
    }
    if current_turn != actor {
        return Err(DomainError::validation(
            ValidationKind::OutOfTurn,
            format!("it is {current_turn}'s turn, not {actor}'s"),
        ));
    }
    Ok(())
}
