use std::sync::Arc;
use std::time::Duration;

use super::{Audience, GameFlowService};
use crate::config::GameConfig;
use crate::domain::lobby::{Lobby, Stage};
use crate::domain::scoring::{column_scores, round_total};
use crate::domain::snapshot::LobbySnapshot;
use crate::domain::test_state_helpers::seat;
use crate::services::deck_coordinator::DeckCoordinator;
use crate::services::deck_provider::LocalDeckProvider;
use crate::services::registry::LobbyRegistry;
use crate::ws::hub::LobbyHub;
use crate::ws::protocol::ServerEvent;

fn flow_with(config: GameConfig) -> (GameFlowService, Arc<LocalDeckProvider>) {
    let provider = Arc::new(LocalDeckProvider::with_seed(7));
    let flow = GameFlowService::new(
        Arc::new(LobbyRegistry::new()),
        DeckCoordinator::new(provider.clone()),
        Arc::new(LobbyHub::new()),
        config,
    );
    (flow, provider)
}

/// A service whose round continuation never fires during a test.
fn flow() -> (GameFlowService, Arc<LocalDeckProvider>) {
    flow_with(GameConfig {
        round_delay: Duration::from_secs(3600),
        ..GameConfig::default()
    })
}

fn lobby_of(event: &ServerEvent) -> &LobbySnapshot {
    match event {
        ServerEvent::LobbyCreated(s)
        | ServerEvent::JoinedLobby(s)
        | ServerEvent::LobbyDetails(s)
        | ServerEvent::UpdatedLobby(s)
        | ServerEvent::UpdatedGame(s)
        | ServerEvent::GameStarted(s)
        | ServerEvent::FinishRound(s)
        | ServerEvent::ProceedToNextRound(s)
        | ServerEvent::EndGame(s) => s,
        ServerEvent::FullLobby { lobby, .. } => lobby,
        other => panic!("no lobby in {}", other.name()),
    }
}

async fn lobby(flow: &GameFlowService, id: &str) -> Lobby {
    flow.registry().get(id).await.expect("lobby exists")
}

async fn arrange(flow: &GameFlowService, id: &str, f: impl FnOnce(&mut Lobby)) {
    let mut guard = flow.registry().lock(id).await.expect("lobby exists");
    let mut copy = guard.lobby().clone();
    f(&mut copy);
    guard.commit(copy);
}

fn board_codes(lobby: &Lobby, player_id: &str) -> Vec<String> {
    lobby
        .player(player_id)
        .and_then(|p| p.cards.as_ref())
        .map(|b| b.cards().iter().map(|c| c.code.clone()).collect())
        .unwrap_or_default()
}

/// Creates a lobby hosted by `ids[0]` and seats the rest.
async fn seated(flow: &GameFlowService, ids: &[&str]) -> String {
    let created = flow.create_lobby(seat(ids[0])).unwrap();
    let id = created.subscribe.clone().unwrap();
    for pid in &ids[1..] {
        flow.join_lobby(&id, seat(pid)).await.unwrap();
    }
    id
}

async fn started(flow: &GameFlowService, ids: &[&str]) -> String {
    let id = seated(flow, ids).await;
    let d = flow.start_game(&id, ids[0]).await;
    assert_eq!(d.event_names(), ["game-started"]);
    id
}

/// First turn spent, `p1` one reveal away from a full board and on turn.
async fn p1_about_to_latch(flow: &GameFlowService, id: &str) {
    arrange(flow, id, |l| {
        for p in &mut l.players {
            p.moves_left = 0;
        }
        let codes = board_codes(l, "p1");
        if let Some(p1) = l.player_mut("p1") {
            for code in &codes[..5] {
                p1.flip(code);
            }
        }
        if let Some(table) = l.table_mut() {
            table.current_turn = "p1".into();
        }
    })
    .await;
}

/// Plays the unwind of a two-player round: p1 latches, p2 takes the last turn.
async fn unwind_round(flow: &GameFlowService, id: &str) -> super::Dispatch {
    p1_about_to_latch(flow, id).await;
    let last = board_codes(&lobby(flow, id).await, "p1")[5].clone();
    let d = flow.flip_card(id, "p1", &last).await;
    assert_eq!(d.event_names(), ["updated-game"]);

    let mid = lobby(flow, id).await;
    let table = mid.table().unwrap();
    assert_eq!(table.player_started_last_turn.as_deref(), Some("p1"));
    assert_eq!(table.current_turn, "p2");

    let p2_card = board_codes(&mid, "p2")[0].clone();
    flow.flip_card(id, "p2", &p2_card).await
}

#[tokio::test]
async fn create_join_and_start() {
    let (flow, _) = flow();
    let created = flow.create_lobby(seat("p1")).unwrap();
    assert_eq!(created.event_names(), ["lobby-created"]);
    let id = created.subscribe.clone().unwrap();
    let snap = lobby_of(created.first_for(Audience::Actor).unwrap());
    assert_eq!(snap.host, "p1");
    assert_eq!(snap.max_players, 6);
    assert_eq!(snap.rounds, 2);
    assert_eq!(snap.current_round, 1);

    let joined = flow.join_lobby(&id, seat("p2")).await.unwrap();
    assert_eq!(joined.subscribe.as_deref(), Some(id.as_str()));
    assert_eq!(joined.event_names(), ["joined-lobby", "updated-lobby"]);
    assert_eq!(
        lobby_of(joined.first_for(Audience::Others).unwrap()).current_players,
        2
    );

    assert!(flow.start_game(&id, "p2").await.is_empty(), "only the host starts");

    let started = flow.start_game(&id, "p1").await;
    let snap = lobby_of(started.first_for(Audience::Room).unwrap());
    assert_eq!(snap.phase, "PLAYING");
    assert_eq!(snap.discard_pile.len(), 1);
    assert_eq!(snap.current_turn.as_deref(), Some("p1"));
    for p in &snap.players {
        assert_eq!(p.cards.as_ref().unwrap().cards().len(), 6);
        assert_eq!(p.moves_left, 3);
    }

    assert!(flow.start_game(&id, "p1").await.is_empty(), "already started");
}

#[tokio::test]
async fn first_turn_reveals_then_rotate() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    let codes = board_codes(&lobby(&flow, &id).await, "p1");

    for (i, code) in codes[..3].iter().enumerate() {
        let d = flow.flip_card(&id, "p1", code).await;
        assert_eq!(d.event_names(), ["updated-game"]);
        let snap = lobby_of(d.first_for(Audience::Room).unwrap());
        let p1 = snap.players.iter().find(|p| p.player_id == "p1").unwrap();
        assert_eq!(p1.moves_left as usize, 2 - i);
        assert_eq!(p1.score, column_scores(p1.cards.as_ref().unwrap()));
    }

    let after = lobby(&flow, &id).await;
    assert_eq!(after.table().unwrap().current_turn, "p2");
    let board = after.player("p1").unwrap().cards.clone().unwrap();
    assert_eq!(board.cards().iter().filter(|c| c.face_up).count(), 3);

    assert!(
        flow.flip_card(&id, "p1", &codes[3]).await.is_empty(),
        "no first-turn moves left"
    );
    let top = after.table().unwrap().top_discard().unwrap().code.clone();
    assert!(
        flow.replace_card(&id, "p2", &top, &board_codes(&after, "p2")[0])
            .await
            .is_empty(),
        "only reveals in the first turn"
    );
}

#[tokio::test]
async fn bad_flips_are_no_ops() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    let before = lobby(&flow, &id).await;
    let p2_code = board_codes(&before, "p2")[0].clone();

    assert!(flow.flip_card(&id, "p1", &p2_code).await.is_empty());
    assert!(flow.flip_card(&id, "p1", "ZZ").await.is_empty());
    assert!(flow.flip_card(&id, "stranger", &p2_code).await.is_empty());
    assert!(flow.flip_card("NOSUCHLOBBY0", "p1", "AS").await.is_empty());
    assert_eq!(lobby(&flow, &id).await, before);

    let own = board_codes(&before, "p1")[0].clone();
    assert!(!flow.flip_card(&id, "p1", &own).await.is_empty());
    assert!(
        flow.flip_card(&id, "p1", &own).await.is_empty(),
        "already face-up"
    );
    assert_eq!(lobby(&flow, &id).await.player("p1").unwrap().moves_left, 2);
}

#[tokio::test]
async fn join_refusals() {
    let (flow, _) = flow_with(GameConfig {
        max_players: 2,
        ..GameConfig::default()
    });
    let id = seated(&flow, &["p1", "p2"]).await;
    let before = lobby(&flow, &id).await;

    let full = flow.join_lobby(&id, seat("p3")).await.unwrap();
    assert!(full.subscribe.is_none());
    match full.first_for(Audience::Actor).unwrap() {
        ServerEvent::FullLobby { message, lobby } => {
            assert_eq!(message, "Lobby is full");
            assert_eq!(lobby.current_players, 2);
        }
        other => panic!("unexpected {}", other.name()),
    }
    assert_eq!(lobby(&flow, &id).await, before);

    let missing = flow.join_lobby("NOSUCHLOBBY0", seat("p3")).await.unwrap();
    assert_eq!(missing.event_names(), ["lobby-not-found"]);

    let rejoin = flow.join_lobby(&id, seat("p2")).await.unwrap();
    assert_eq!(rejoin.event_names(), ["joined-lobby"]);
    assert_eq!(rejoin.subscribe.as_deref(), Some(id.as_str()));
    assert_eq!(lobby(&flow, &id).await.current_players(), 2);
}

#[tokio::test]
async fn join_after_start_is_refused() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    let d = flow.join_lobby(&id, seat("p3")).await.unwrap();
    match d.first_for(Audience::Actor).unwrap() {
        ServerEvent::FullLobby { message, .. } => assert_eq!(message, "Game already started"),
        other => panic!("unexpected {}", other.name()),
    }
}

#[tokio::test]
async fn get_lobby_details_or_not_found() {
    let (flow, _) = flow();
    let id = seated(&flow, &["p1"]).await;
    assert_eq!(flow.get_lobby(&id).await.event_names(), ["lobby-details"]);
    assert_eq!(
        flow.get_lobby("NOSUCHLOBBY0").await.event_names(),
        ["lobby-not-found"]
    );
}

#[tokio::test]
async fn leaving_passes_host_and_deletes_empty_lobbies() {
    let (flow, _) = flow();
    let id = seated(&flow, &["p1", "p2"]).await;

    let d = flow.leave_lobby(&id, "p1").await;
    assert_eq!(d.unsubscribe.as_deref(), Some(id.as_str()));
    let snap = lobby_of(d.first_for(Audience::Others).unwrap());
    assert_eq!(snap.host, "p2");
    assert_eq!(snap.current_players, 1);

    let d = flow.leave_lobby(&id, "p2").await;
    assert!(d.deliveries.is_empty());
    assert!(flow.registry().get(&id).await.is_none());
}

#[tokio::test]
async fn deleting_a_dealt_lobby_releases_its_deck() {
    let (flow, provider) = flow();
    let kept = started(&flow, &["p1", "p2"]).await;
    let id = started(&flow, &["p3", "p4"]).await;
    assert_eq!(provider.deck_count(), 2);

    flow.leave_lobby(&id, "p3").await;
    assert_eq!(provider.deck_count(), 2, "a seated player keeps the deck");
    assert_eq!(flow.disconnect("p4").await, 1);
    assert!(flow.registry().get(&id).await.is_none());
    assert_eq!(provider.deck_count(), 1);

    let own = board_codes(&lobby(&flow, &kept).await, "p1")[0].clone();
    assert_eq!(flow.flip_card(&kept, "p1", &own).await.event_names(), ["updated-game"]);
}

#[tokio::test]
async fn leaving_mid_game_hands_over_the_turn() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2", "p3"]).await;
    arrange(&flow, &id, |l| {
        for p in &mut l.players {
            p.moves_left = 0;
        }
    })
    .await;

    flow.leave_lobby(&id, "p1").await;
    let after = lobby(&flow, &id).await;
    assert_eq!(after.host, "p2");
    assert_eq!(after.table().unwrap().current_turn, "p2");
    assert!(matches!(after.stage, Stage::Playing(_)));
}

#[tokio::test]
async fn disconnect_removes_player_everywhere() {
    let (flow, _) = flow();
    let shared = seated(&flow, &["p1", "p2"]).await;
    let solo = seated(&flow, &["p2"]).await;
    let other = seated(&flow, &["p3"]).await;

    assert_eq!(flow.disconnect("p2").await, 2);
    assert!(flow.registry().get(&solo).await.is_none());
    let kept = lobby(&flow, &shared).await;
    assert_eq!(kept.current_players(), 1);
    assert!(kept.contains("p1"));
    assert_eq!(lobby(&flow, &other).await.current_players(), 1);

    assert_eq!(flow.disconnect("nobody").await, 0);
}

#[tokio::test]
async fn start_failure_reports_and_keeps_lobby() {
    let (flow, provider) = flow();
    let id = seated(&flow, &["p1", "p2"]).await;
    provider.set_failing(true);

    let d = flow.start_game(&id, "p1").await;
    assert_eq!(d.event_names(), ["error-start-game"]);
    assert!(matches!(lobby(&flow, &id).await.stage, Stage::Waiting));

    let d = flow.start_game("NOSUCHLOBBY0", "p1").await;
    assert_eq!(d.event_names(), ["error-start-game"]);
}

#[tokio::test]
async fn draw_then_discard_passes_the_turn() {
    let (flow, provider) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    arrange(&flow, &id, |l| {
        for p in &mut l.players {
            p.moves_left = 0;
        }
    })
    .await;

    let refused = flow.draw_card(&id, "p2").await;
    match refused.first_for(Audience::Actor).unwrap() {
        ServerEvent::DrawCardFromDeck(ack) => assert!(!ack.success),
        other => panic!("unexpected {}", other.name()),
    }

    let d = flow.draw_card(&id, "p1").await;
    let drawn = match d.first_for(Audience::Actor).unwrap() {
        ServerEvent::DrawCardFromDeck(ack) => {
            assert!(ack.success);
            ack.card.clone().unwrap()
        }
        other => panic!("unexpected {}", other.name()),
    };
    let others = lobby_of(d.first_for(Audience::Others).unwrap());
    assert_eq!(others.pending_draw_by.as_deref(), Some("p1"));

    let own = board_codes(&lobby(&flow, &id).await, "p1")[0].clone();
    assert!(
        flow.flip_card(&id, "p1", &own).await.is_empty(),
        "pending draw must be resolved first"
    );

    let d = flow.discard_card(&id, "p1", &drawn.code).await;
    assert_eq!(d.event_names(), ["updated-game"]);
    let after = lobby(&flow, &id).await;
    let table = after.table().unwrap();
    assert_eq!(table.top_discard().unwrap().code, drawn.code);
    assert!(table.pending_draw.is_none());
    assert_eq!(table.current_turn, "p2");

    provider.set_failing(true);
    let d = flow.draw_card(&id, "p2").await;
    match d.first_for(Audience::Actor).unwrap() {
        ServerEvent::DrawCardFromDeck(ack) => {
            assert!(!ack.success);
            assert!(ack.message.is_some());
        }
        other => panic!("unexpected {}", other.name()),
    }
    assert!(lobby(&flow, &id).await.table().unwrap().pending_draw.is_none());
}

#[tokio::test]
async fn replace_with_drawn_card() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    arrange(&flow, &id, |l| {
        for p in &mut l.players {
            p.moves_left = 0;
        }
    })
    .await;

    let drawn = match flow
        .draw_card(&id, "p1")
        .await
        .first_for(Audience::Actor)
        .cloned()
    {
        Some(ServerEvent::DrawCardFromDeck(ack)) => ack.card.unwrap(),
        _ => panic!("expected a draw ack"),
    };
    let target = board_codes(&lobby(&flow, &id).await, "p1")[4].clone();

    let d = flow.replace_card(&id, "p1", &drawn.code, &target).await;
    assert_eq!(d.event_names(), ["updated-game"]);
    let after = lobby(&flow, &id).await;
    let slot = &after.player("p1").unwrap().cards.as_ref().unwrap().cards()[4];
    assert_eq!(slot.code, drawn.code);
    assert!(slot.face_up);
    assert_eq!(after.table().unwrap().top_discard().unwrap().code, target);
    assert_eq!(after.table().unwrap().current_turn, "p2");
}

#[tokio::test]
async fn two_round_game_runs_to_the_end() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1", "p2"]).await;

    let d = unwind_round(&flow, &id).await;
    assert_eq!(d.event_names(), ["finish-round"]);
    let summary = lobby(&flow, &id).await;
    assert!(matches!(summary.stage, Stage::RoundOver(_)));
    assert_eq!(summary.current_round, 2);
    let mut first_totals = Vec::new();
    for p in &summary.players {
        let board = p.cards.as_ref().unwrap();
        assert!(board.all_face_up());
        assert_eq!(p.score, [0, 0, 0]);
        first_totals.push((p.player_id.clone(), round_total(&column_scores(board))));
    }
    let board = summary.scoreboard.clone().unwrap();
    assert!(board.windows(2).all(|w| w[0].score <= w[1].score));
    for (pid, total) in &first_totals {
        assert_eq!(board.iter().find(|e| &e.player_id == pid).unwrap().score, *total);
    }

    let next = flow.proceed_to_round(&id, 2).await;
    assert!(matches!(next, Some(ServerEvent::ProceedToNextRound(_))));
    assert!(flow.proceed_to_round(&id, 2).await.is_none(), "already dealt");
    let dealt = lobby(&flow, &id).await;
    assert!(matches!(dealt.stage, Stage::Playing(_)));
    assert!(dealt.table().unwrap().player_started_last_turn.is_none());
    for p in &dealt.players {
        assert!(p.cards.as_ref().unwrap().cards().iter().all(|c| !c.face_up));
        assert_eq!(p.moves_left, 3);
    }

    let d = unwind_round(&flow, &id).await;
    assert_eq!(d.event_names(), ["end-game"]);
    let over = lobby(&flow, &id).await;
    assert!(matches!(over.stage, Stage::GameOver(_)));
    assert_eq!(over.current_round, 2);
    let final_board = over.scoreboard.clone().unwrap();
    for (pid, first) in &first_totals {
        let p = over.player(pid).unwrap();
        let second = round_total(&column_scores(p.cards.as_ref().unwrap()));
        let entry = final_board.iter().find(|e| &e.player_id == pid).unwrap();
        assert_eq!(entry.score, first + second);
    }
    assert!(flow.proceed_to_round(&id, 3).await.is_none(), "no deal after the game");
}

#[tokio::test]
async fn end_round_failure_keeps_the_final_action_undone() {
    let (flow, provider) = flow();
    let id = started(&flow, &["p1", "p2"]).await;
    p1_about_to_latch(&flow, &id).await;
    let last = board_codes(&lobby(&flow, &id).await, "p1")[5].clone();
    flow.flip_card(&id, "p1", &last).await;
    let before = lobby(&flow, &id).await;

    provider.set_failing(true);
    let p2_card = board_codes(&before, "p2")[0].clone();
    let d = flow.flip_card(&id, "p2", &p2_card).await;
    assert_eq!(d.event_names(), ["error-end-game"]);
    assert_eq!(d.deliveries[0].audience, Audience::Actor);
    assert_eq!(lobby(&flow, &id).await, before);
}

#[tokio::test]
async fn scheduled_round_is_dealt_after_the_delay() {
    let (flow, _) = flow_with(GameConfig {
        round_delay: Duration::ZERO,
        ..GameConfig::default()
    });
    let id = started(&flow, &["p1", "p2"]).await;
    assert_eq!(unwind_round(&flow, &id).await.event_names(), ["finish-round"]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let dealt = lobby(&flow, &id).await;
    assert!(matches!(dealt.stage, Stage::Playing(_)));
    assert_eq!(dealt.current_round, 2);
}

#[tokio::test]
async fn lone_player_latching_ends_the_round() {
    let (flow, _) = flow();
    let id = started(&flow, &["p1"]).await;
    let codes = board_codes(&lobby(&flow, &id).await, "p1");
    for code in &codes[..5] {
        assert_eq!(flow.flip_card(&id, "p1", code).await.event_names(), ["updated-game"]);
    }
    let d = flow.flip_card(&id, "p1", &codes[5]).await;
    assert_eq!(d.event_names(), ["finish-round"]);
}

#[tokio::test]
async fn last_seat_before_latch_leaving_ends_the_round() {
    let (flow, _) = flow();
    let id = p3_closing_the_lap(&flow).await;

    let d = flow.leave_lobby(&id, "p3").await;
    assert_eq!(d.event_names(), ["updated-lobby", "finish-round"]);
    assert!(matches!(lobby(&flow, &id).await.stage, Stage::RoundOver(_)));
}

/// Three seats, p1 latched and the turn with p3, the last seat before p1.
async fn p3_closing_the_lap(flow: &GameFlowService) -> String {
    let id = started(flow, &["p1", "p2", "p3"]).await;
    p1_about_to_latch(flow, &id).await;
    let last = board_codes(&lobby(flow, &id).await, "p1")[5].clone();
    flow.flip_card(&id, "p1", &last).await;
    arrange(flow, &id, |l| {
        if let Some(t) = l.table_mut() {
            t.current_turn = "p3".into();
        }
    })
    .await;
    id
}

#[tokio::test]
async fn failed_round_end_after_leaving_is_reported_and_retried() {
    let (flow, provider) = flow();
    let id = p3_closing_the_lap(&flow).await;

    provider.set_failing(true);
    let d = flow.leave_lobby(&id, "p3").await;
    assert_eq!(d.event_names(), ["updated-lobby", "error-end-game"]);
    assert!(d.deliveries.iter().all(|x| x.audience == Audience::Others));

    let stuck = lobby(&flow, &id).await;
    assert!(stuck.player("p3").is_none(), "the departure itself stands");
    assert!(stuck.round_end_due());

    // still failing: nobody gets an extra turn
    let own = board_codes(&stuck, "p2")[0].clone();
    let d = flow.flip_card(&id, "p2", &own).await;
    assert_eq!(d.event_names(), ["error-end-game"]);
    assert_eq!(d.deliveries[0].audience, Audience::Room);
    assert_eq!(lobby(&flow, &id).await, stuck);

    provider.set_failing(false);
    let d = flow.draw_card(&id, "p1").await;
    assert_eq!(d.event_names(), ["finish-round", "draw-card-from-deck"]);
    assert_eq!(d.first_for(Audience::Room).map(ServerEvent::name), Some("finish-round"));
    match d.first_for(Audience::Actor) {
        Some(ServerEvent::DrawCardFromDeck(ack)) => assert!(!ack.success),
        other => panic!("expected a refused draw, got {other:?}"),
    }

    let scored = lobby(&flow, &id).await;
    assert!(matches!(scored.stage, Stage::RoundOver(_)));
    assert!(!scored.round_end_due());
    assert_eq!(scored.current_round, 2);
}
