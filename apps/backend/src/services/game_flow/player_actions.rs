use tracing::{debug, info, warn};

use super::dispatch::snapshot;
use super::lobby_actions::LOBBY_NOT_FOUND;
use super::round_lifecycle::END_ROUND_FAILED;
use super::{Dispatch, GameFlowService};
use crate::domain::cards::Card;
use crate::domain::lobby::Lobby;
use crate::domain::rules::{self, TurnAdvance, TurnPhase};
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::services::registry::LobbyGuard;
use crate::ws::protocol::{DrawAck, ServerEvent};

const DRAW_FAILED: &str = "Could not draw a card, try again";
const DRAW_REFUSED: &str = "You cannot draw right now";

fn phase_mismatch(detail: &str) -> DomainError {
    DomainError::validation(ValidationKind::PhaseMismatch, detail)
}

fn ignored(lobby_id: &str, actor: &str, action: &'static str, err: &DomainError) -> Dispatch {
    debug!(lobby_id, actor, action, error = %err, "Action ignored");
    Dispatch::empty()
}

fn draw_ack(success: bool, card: Option<Card>, message: Option<&str>) -> ServerEvent {
    ServerEvent::DrawCardFromDeck(DrawAck {
        success,
        card,
        message: message.map(str::to_string),
    })
}

/// Turns an actor's face-down card face-up. Counts as a first-turn reveal
/// or a whole turn afterwards.
fn apply_flip(lobby: &mut Lobby, actor: &str, code: &str) -> Result<(), DomainError> {
    let (table, players) = lobby
        .playing_mut()
        .ok_or_else(|| phase_mismatch("no round in progress"))?;
    rules::ensure_may_act(players, &table.current_turn, actor)?;
    if table.pending_for(actor).is_some() {
        return Err(DomainError::conflict(
            ConflictKind::DrawPending,
            "place or discard the drawn card first",
        ));
    }
    let player = players
        .iter_mut()
        .find(|p| p.player_id == actor)
        .ok_or_else(|| {
            DomainError::validation(ValidationKind::InvalidPlayerId, "actor not seated")
        })?;
    if !player.flip(code) {
        return Err(DomainError::validation(
            ValidationKind::InvalidCard,
            format!("{code} is not a face-down card on the board"),
        ));
    }
    Ok(())
}

/// Replace and discard are whole-turn actions: not in the first turn and
/// only by the current player.
fn ensure_turn_action(lobby: &mut Lobby, actor: &str) -> Result<(), DomainError> {
    let (table, players) = lobby
        .playing_mut()
        .ok_or_else(|| phase_mismatch("no round in progress"))?;
    if rules::is_first_turn(players) {
        return Err(phase_mismatch("only reveals are allowed in the first turn"));
    }
    rules::ensure_may_act(players, &table.current_turn, actor)
}

impl GameFlowService {
    pub async fn flip_card(&self, lobby_id: &str, actor: &str, code: &str) -> Dispatch {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            return Dispatch::empty();
        };
        if guard.round_end_due() {
            return self.retry_round_end(&mut guard).await;
        }
        let mut lobby = guard.lobby().clone();
        if let Err(err) = apply_flip(&mut lobby, actor, code) {
            return ignored(lobby_id, actor, "flip-card", &err);
        }
        self.settle(guard, lobby, actor).await
    }

    pub async fn replace_card(
        &self,
        lobby_id: &str,
        actor: &str,
        drawn_code: &str,
        replace_code: &str,
    ) -> Dispatch {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            return Dispatch::empty();
        };
        if guard.round_end_due() {
            return self.retry_round_end(&mut guard).await;
        }
        let mut lobby = guard.lobby().clone();
        let applied = ensure_turn_action(&mut lobby, actor)
            .and_then(|()| self.deck.replace(&mut lobby, actor, drawn_code, replace_code));
        if let Err(err) = applied {
            return ignored(lobby_id, actor, "replace-card", &err);
        }
        self.settle(guard, lobby, actor).await
    }

    pub async fn discard_card(&self, lobby_id: &str, actor: &str, code: &str) -> Dispatch {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            return Dispatch::empty();
        };
        if guard.round_end_due() {
            return self.retry_round_end(&mut guard).await;
        }
        let mut lobby = guard.lobby().clone();
        let applied = ensure_turn_action(&mut lobby, actor)
            .and_then(|()| self.deck.discard(&mut lobby, actor, code));
        if let Err(err) = applied {
            return ignored(lobby_id, actor, "discard-card", &err);
        }
        self.settle(guard, lobby, actor).await
    }

    /// Draws into the actor's pending slot. The drawer is acknowledged with
    /// the card; the rest of the room only learns that a draw is pending.
    pub async fn draw_card(&self, lobby_id: &str, actor: &str) -> Dispatch {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            return Dispatch::empty().to_actor(draw_ack(false, None, Some(LOBBY_NOT_FOUND)));
        };
        if guard.round_end_due() {
            return self
                .retry_round_end(&mut guard)
                .await
                .to_actor(draw_ack(false, None, Some(DRAW_REFUSED)));
        }
        let mut lobby = guard.lobby().clone();
        match self.deck.draw_one(&mut lobby, actor).await {
            Ok(card) => {
                let snap = snapshot(&lobby);
                guard.commit(lobby);
                Dispatch::for_lobby(lobby_id)
                    .to_actor(draw_ack(true, Some(card), None))
                    .to_others(ServerEvent::UpdatedGame(snap))
            }
            Err(err) if err.is_upstream() => {
                warn!(lobby_id, actor, error = %err, "Deck draw failed");
                Dispatch::for_lobby(lobby_id).to_actor(draw_ack(false, None, Some(DRAW_FAILED)))
            }
            Err(err) => {
                debug!(lobby_id, actor, error = %err, "Draw refused");
                Dispatch::for_lobby(lobby_id).to_actor(draw_ack(false, None, Some(DRAW_REFUSED)))
            }
        }
    }

    /// Runs the turn decision for an applied action and commits it.
    ///
    /// The latch is evaluated first, then exactly one of: last-turn unwind,
    /// first-turn consumption or normal rotation.
    async fn settle(&self, mut guard: LobbyGuard<'_>, mut lobby: Lobby, actor: &str) -> Dispatch {
        let lobby_id = lobby.id.clone();
        let advance = {
            let Some((table, players)) = lobby.playing_mut() else {
                return Dispatch::empty();
            };
            if rules::starts_last_turn(players, table.player_started_last_turn.as_deref(), actor) {
                info!(lobby_id = %lobby_id, actor, "Last turn started");
                table.player_started_last_turn = Some(actor.to_string());
            }
            let phase = TurnPhase::of(players, table.player_started_last_turn.as_deref());
            let advance = rules::advance_turn(&phase, players, actor);
            if let TurnAdvance::Next(next) = &advance {
                table.current_turn.clone_from(next);
            }
            advance
        };

        if advance == TurnAdvance::RoundOver {
            return match self.finish_round(&mut guard, lobby).await {
                Ok(event) => Dispatch::for_lobby(lobby_id).to_room(event),
                Err(err) => {
                    warn!(lobby_id = %lobby_id, error = %err, "Failed to end round");
                    Dispatch::for_lobby(lobby_id).to_actor(ServerEvent::ErrorEndGame {
                        message: END_ROUND_FAILED.to_string(),
                    })
                }
            };
        }

        let snap = snapshot(&lobby);
        guard.commit(lobby);
        Dispatch::for_lobby(lobby_id).to_room(ServerEvent::UpdatedGame(snap))
    }
}
