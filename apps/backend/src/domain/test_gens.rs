// Proptest generators for domain types.
// Boards are drawn from distinct codes so a code appears once per board.

use std::ops::RangeInclusive;

use proptest::prelude::*;

use crate::domain::cards::Card;
use crate::domain::player::{Board, Player};
use crate::domain::test_state_helpers::{all_codes, card_from_code, seat};

/// Six distinct cards with arbitrary face-up flags.
pub fn board() -> impl Strategy<Value = Board> {
    let mut pool = all_codes();
    pool.push("X1".into());
    pool.push("X2".into());
    (
        proptest::sample::subsequence(pool, 6).prop_shuffle(),
        prop::array::uniform6(any::<bool>()),
    )
        .prop_map(|(codes, up)| {
            let cards: Vec<Card> = codes
                .iter()
                .zip(up)
                .map(|(c, show)| {
                    let card = card_from_code(c);
                    if show {
                        card.face_up()
                    } else {
                        card
                    }
                })
                .collect();
            Board::try_from(cards).expect("six cards")
        })
}

/// Seated players with unique ids.
pub fn players(count: RangeInclusive<usize>) -> impl Strategy<Value = Vec<Player>> {
    count.prop_map(|n| (0..n).map(|i| seat(&format!("p{i}"))).collect())
}

pub fn score_vec() -> impl Strategy<Value = [i32; 3]> {
    prop::array::uniform3(-4..=20i32)
}
