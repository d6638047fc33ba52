//! Test-only builders for cards, boards, players and lobbies.

use crate::domain::cards::Card;
use crate::domain::deck::Deck;
use crate::domain::lobby::{Lobby, Stage, Table};
use crate::domain::player::{Board, Player};

const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "0", "J", "Q", "K",
];
const SUITS: [&str; 4] = ["S", "D", "C", "H"];

/// Provider value name for a deckofcardsapi-style code.
pub fn value_for_code(code: &str) -> &'static str {
    match code.chars().next() {
        Some('A') => "ACE",
        Some('0') => "10",
        Some('J') => "JACK",
        Some('Q') => "QUEEN",
        Some('K') => "KING",
        Some('X') => "JOKER",
        Some('2') => "2",
        Some('3') => "3",
        Some('4') => "4",
        Some('5') => "5",
        Some('6') => "6",
        Some('7') => "7",
        Some('8') => "8",
        Some('9') => "9",
        _ => "KING",
    }
}

pub fn card(code: &str, value: &str) -> Card {
    Card::new(code, "SPADES", value, None).expect("test card value")
}

pub fn card_from_code(code: &str) -> Card {
    card(code, value_for_code(code))
}

pub fn board_of(codes: &[&str]) -> Board {
    let cards: Vec<Card> = codes.iter().map(|c| card_from_code(c)).collect();
    Board::try_from(cards).expect("six codes")
}

/// All 52 suited codes in a fixed order.
pub fn all_codes() -> Vec<String> {
    SUITS
        .iter()
        .flat_map(|s| RANKS.iter().map(move |r| format!("{r}{s}")))
        .collect()
}

/// An undealt player.
pub fn seat(id: &str) -> Player {
    Player::new(id, format!("nick-{id}"), "avatar.png", false)
}

/// A player holding six face-down cards taken from `all_codes()[offset..]`.
pub fn dealt_player(id: &str, offset: usize) -> Player {
    let codes = all_codes();
    let mut p = seat(id);
    let cards: Vec<Card> = codes[offset..offset + 6]
        .iter()
        .map(|c| card_from_code(c))
        .collect();
    p.deal(Board::try_from(cards).expect("six cards"));
    p
}

/// A lobby already in play with every player dealt and first-turn moves
/// spent, the host holding the turn.
pub fn playing_lobby(ids: &[&str]) -> Lobby {
    let mut lobby = Lobby::new("ABCDEFGHJKMN", seat(ids[0]), 6, 2);
    for id in &ids[1..] {
        lobby.add_player(seat(id)).expect("room for player");
    }
    for (i, p) in lobby.players.iter_mut().enumerate() {
        let dealt = dealt_player(&p.player_id, i * 6);
        p.deal(dealt.cards.expect("dealt"));
        p.moves_left = 0;
    }
    lobby.stage = Stage::Playing(Table {
        deck: Deck::new("deck-1", 54 - (ids.len() as u32 * 6 + 1)),
        discard_pile: vec![card_from_code("KH").face_up()],
        current_turn: ids[0].to_string(),
        player_started_last_turn: None,
        pending_draw: None,
        round_end_due: false,
    });
    lobby
}
