//! Column scoring and the cumulative scoreboard.

use serde::{Deserialize, Serialize};

use super::cards::Card;
use super::player::{Board, Player};
use super::rules::COLUMNS;

pub use super::cards::card_score;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntry {
    pub player_id: String,
    pub nickname: String,
    pub score: i32,
}

fn column_score(top: &Card, bottom: &Card) -> i32 {
    match (top.face_up, bottom.face_up) {
        (false, false) => 0,
        (true, false) => top.score,
        (false, true) => bottom.score,
        (true, true) if top.value == bottom.value => 0,
        (true, true) => top.score + bottom.score,
    }
}

/// Per-column score of a board. Only face-up cards count; a face-up joker
/// cancels its column even if its partner is still hidden.
pub fn column_scores(board: &Board) -> [i32; COLUMNS] {
    let mut out = [0; COLUMNS];
    for (col, slot) in out.iter_mut().enumerate() {
        let (top, bottom) = board.column(col);
        let joker_up = (top.face_up && top.is_joker()) || (bottom.face_up && bottom.is_joker());
        *slot = if joker_up { 0 } else { column_score(top, bottom) };
    }
    out
}

pub fn round_total(scores: &[i32; COLUMNS]) -> i32 {
    scores.iter().sum()
}

/// Adds each player's round total to the running scoreboard.
///
/// Entries are keyed by player id; players who left keep their entry.
/// The result is sorted ascending by score, ties keeping prior order.
pub fn merge_scoreboard(
    previous: Option<&[ScoreboardEntry]>,
    players: &[Player],
) -> Vec<ScoreboardEntry> {
    let mut board: Vec<ScoreboardEntry> = previous.map(<[_]>::to_vec).unwrap_or_default();

    for player in players {
        let total = round_total(&player.score);
        match board.iter_mut().find(|e| e.player_id == player.player_id) {
            Some(entry) => {
                entry.score += total;
                entry.nickname.clone_from(&player.nickname);
            }
            None => board.push(ScoreboardEntry {
                player_id: player.player_id.clone(),
                nickname: player.nickname.clone(),
                score: total,
            }),
        }
    }

    board.sort_by_key(|e| e.score);
    board
}
