use tracing::{debug, info, warn};

use super::dispatch::snapshot;
use super::lobby_actions::START_FAILED;
use super::{Dispatch, GameFlowService};
use crate::domain::lobby::{Lobby, Stage};
use crate::domain::rules::COLUMNS;
use crate::domain::scoring::merge_scoreboard;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::services::registry::LobbyGuard;
use crate::ws::protocol::ServerEvent;

pub(super) const END_ROUND_FAILED: &str = "Could not finish the round, try again";

impl GameFlowService {
    /// Scores a finished round on the working copy.
    ///
    /// Every board is revealed and the round totals are folded into the
    /// scoreboard before score vectors reset. The deck is reshuffled first, so
    /// a provider failure leaves the copy untouched.
    pub(super) async fn end_round(&self, lobby: &mut Lobby) -> Result<ServerEvent, DomainError> {
        if !matches!(lobby.stage, Stage::Playing(_)) {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "no round in progress",
            ));
        }
        self.deck.reshuffle(lobby).await?;

        for player in &mut lobby.players {
            player.reveal_all();
        }
        lobby.scoreboard = Some(merge_scoreboard(
            lobby.scoreboard.as_deref(),
            &lobby.players,
        ));
        for player in &mut lobby.players {
            player.score = [0; COLUMNS];
        }

        let table = match std::mem::replace(&mut lobby.stage, Stage::Waiting) {
            Stage::Playing(mut table) => {
                table.pending_draw = None;
                table.round_end_due = false;
                table
            }
            other => {
                lobby.stage = other;
                return Err(DomainError::validation(
                    ValidationKind::PhaseMismatch,
                    "no round in progress",
                ));
            }
        };

        if lobby.is_last_round() {
            lobby.stage = Stage::GameOver(table);
            info!(lobby_id = %lobby.id, round = lobby.current_round, "Game over");
            Ok(ServerEvent::EndGame(snapshot(lobby)))
        } else {
            lobby.current_round += 1;
            lobby.stage = Stage::RoundOver(table);
            info!(lobby_id = %lobby.id, next_round = lobby.current_round, "Round over");
            Ok(ServerEvent::FinishRound(snapshot(lobby)))
        }
    }

    /// Ends the round, commits it and schedules the next deal when one is due.
    pub(super) async fn finish_round(
        &self,
        guard: &mut LobbyGuard<'_>,
        mut lobby: Lobby,
    ) -> Result<ServerEvent, DomainError> {
        let event = self.end_round(&mut lobby).await?;
        let next_round = matches!(lobby.stage, Stage::RoundOver(_)).then_some(lobby.current_round);
        let lobby_id = lobby.id.clone();
        guard.commit(lobby);
        if let Some(round) = next_round {
            self.schedule_next_round(lobby_id, round);
        }
        Ok(event)
    }

    /// Scores a round whose final lap already ended but whose round end
    /// failed earlier. The whole room hears the outcome; on another failure
    /// the lobby stays due for the next attempt.
    pub(super) async fn retry_round_end(&self, guard: &mut LobbyGuard<'_>) -> Dispatch {
        let working = guard.lobby().clone();
        let lobby_id = working.id.clone();
        match self.finish_round(guard, working).await {
            Ok(event) => {
                info!(lobby_id = %lobby_id, "Overdue round end completed");
                Dispatch::for_lobby(lobby_id).to_room(event)
            }
            Err(err) => {
                warn!(lobby_id = %lobby_id, error = %err, "Overdue round end failed again");
                Dispatch::for_lobby(lobby_id).to_room(ServerEvent::ErrorEndGame {
                    message: END_ROUND_FAILED.to_string(),
                })
            }
        }
    }

    /// Deals `round` after the configured delay, unless the lobby moved on.
    pub fn schedule_next_round(&self, lobby_id: String, round: u32) {
        let flow = self.clone();
        let delay = self.config.round_delay;
        debug!(lobby_id = %lobby_id, round, delay_ms = delay.as_millis() as u64, "Next round scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flow.proceed_to_round(&lobby_id, round).await;
        });
    }

    /// Deals the next round if the lobby still exists, is between rounds and
    /// is on `round`. The result is broadcast to the room and returned.
    pub async fn proceed_to_round(&self, lobby_id: &str, round: u32) -> Option<ServerEvent> {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            debug!(lobby_id, round, "Lobby gone before next round");
            return None;
        };
        if !matches!(guard.stage, Stage::RoundOver(_)) || guard.current_round != round {
            debug!(
                lobby_id,
                round,
                phase = guard.stage.name(),
                current = guard.current_round,
                "Stale round continuation"
            );
            return None;
        }

        let mut lobby = guard.lobby().clone();
        let event = match self.deck.start_round(&mut lobby).await {
            Ok(()) => {
                let snap = snapshot(&lobby);
                guard.commit(lobby);
                ServerEvent::ProceedToNextRound(snap)
            }
            Err(err) => {
                warn!(lobby_id, round, error = %err, "Failed to deal next round");
                ServerEvent::ErrorStartGame {
                    message: START_FAILED.to_string(),
                }
            }
        };
        drop(guard);

        self.hub.broadcast(lobby_id, &event, None);
        Some(event)
    }
}
