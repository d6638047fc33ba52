use crate::domain::player::Player;
use crate::domain::scoring::{column_scores, merge_scoreboard, round_total, ScoreboardEntry};
use crate::domain::test_state_helpers::{board_of, seat};

fn revealed(codes: [&str; 6], up: [bool; 6]) -> crate::domain::player::Board {
    let mut board = board_of(&codes);
    for (code, show) in codes.iter().zip(up) {
        if show {
            board.flip(code);
        }
    }
    board
}

#[test]
fn hidden_columns_score_zero() {
    let board = revealed(["AS", "5S", "9S", "QD", "KD", "2D"], [false; 6]);
    assert_eq!(column_scores(&board), [0, 0, 0]);
}

#[test]
fn single_face_up_card_counts_alone() {
    // column 0: AS / QD, only the queen is up
    let board = revealed(
        ["AS", "5S", "9S", "QD", "KD", "2D"],
        [false, true, false, true, false, false],
    );
    assert_eq!(column_scores(&board), [10, 5, 0]);
}

#[test]
fn matching_pair_cancels() {
    let board = revealed(
        ["7S", "JS", "3S", "7D", "JD", "4D"],
        [true, true, true, true, true, true],
    );
    assert_eq!(column_scores(&board), [0, 0, 3 + 4]);
}

#[test]
fn unmatched_pair_sums_including_negative_two() {
    let board = revealed(
        ["2S", "KS", "0S", "5D", "AD", "QD"],
        [true, true, true, true, true, true],
    );
    assert_eq!(column_scores(&board), [-2 + 5, 0 + 1, 10 + 10]);
}

#[test]
fn face_up_joker_zeroes_its_column() {
    // X1 on top of column 0 with a hidden queen underneath, X2 over a shown king
    let board = revealed(
        ["X1", "X2", "9S", "QD", "KD", "9D"],
        [true, true, true, false, true, true],
    );
    assert_eq!(column_scores(&board), [0, 0, 0]);
}

#[test]
fn hidden_joker_does_not_zero() {
    let board = revealed(
        ["X1", "5S", "9S", "QD", "5D", "8D"],
        [false, false, false, true, false, false],
    );
    assert_eq!(column_scores(&board), [10, 0, 0]);
}

#[test]
fn scoring_is_idempotent() {
    let mut p = seat("p1");
    p.deal(board_of(&["AS", "5S", "9S", "QD", "KD", "2D"]));
    p.flip("QD");
    p.flip("5S");
    let first = p.score;
    p.recompute_score();
    p.recompute_score();
    assert_eq!(p.score, first);
}

fn scored(id: &str, score: [i32; 3]) -> Player {
    let mut p = seat(id);
    p.score = score;
    p
}

#[test]
fn first_round_seeds_scoreboard_sorted() {
    let players = vec![scored("a", [5, 5, 0]), scored("b", [1, -2, 0])];
    let board = merge_scoreboard(None, &players);
    assert_eq!(
        board,
        vec![
            ScoreboardEntry {
                player_id: "b".into(),
                nickname: "nick-b".into(),
                score: -1
            },
            ScoreboardEntry {
                player_id: "a".into(),
                nickname: "nick-a".into(),
                score: 10
            },
        ]
    );
}

#[test]
fn later_rounds_accumulate_and_keep_leavers() {
    let first = merge_scoreboard(
        None,
        &[scored("a", [3, 0, 0]), scored("b", [4, 0, 0]), scored("c", [9, 0, 0])],
    );
    // c left before the second round ended
    let second = merge_scoreboard(Some(&first), &[scored("a", [10, 0, 0]), scored("b", [0, 0, 0])]);
    let by_id = |id: &str| second.iter().find(|e| e.player_id == id).map(|e| e.score);
    assert_eq!(by_id("a"), Some(13));
    assert_eq!(by_id("b"), Some(4));
    assert_eq!(by_id("c"), Some(9));
    assert!(second.windows(2).all(|w| w[0].score <= w[1].score));
}

#[test]
fn round_total_sums_columns() {
    assert_eq!(round_total(&[3, -2, 10]), 11);
}
