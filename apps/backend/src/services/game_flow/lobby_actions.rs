use tracing::{debug, info, warn};

use super::dispatch::snapshot;
use super::round_lifecycle::END_ROUND_FAILED;
use super::{Dispatch, GameFlowService};
use crate::domain::lobby::{Lobby, Stage};
use crate::domain::player::Player;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::services::registry::LobbyGuard;
use crate::ws::protocol::ServerEvent;

const CREATE_ATTEMPTS: usize = 8;

pub(super) const LOBBY_NOT_FOUND: &str = "Lobby not found";
const LOBBY_FULL: &str = "Lobby is full";
const GAME_ALREADY_STARTED: &str = "Game already started";
pub(super) const START_FAILED: &str = "Could not start the game, try again later";

impl GameFlowService {
    /// Opens a lobby hosted by `host` and subscribes the caller to it.
    pub fn create_lobby(&self, host: Player) -> Result<Dispatch, AppError> {
        for _ in 0..CREATE_ATTEMPTS {
            let id = self.registry.generate_id();
            let lobby = Lobby::new(
                id.clone(),
                host.clone(),
                self.config.max_players,
                self.config.rounds,
            );
            let snap = snapshot(&lobby);
            match self.registry.create(lobby) {
                Ok(()) => {
                    info!(lobby_id = %id, player_id = %host.player_id, "Lobby created");
                    return Ok(Dispatch::for_lobby(id.clone())
                        .subscribing(id)
                        .to_actor(ServerEvent::LobbyCreated(snap)));
                }
                Err(DomainError::Conflict(ConflictKind::LobbyIdTaken, _)) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(AppError::internal("could not allocate a lobby id"))
    }

    /// Seats `player` in a waiting lobby. A player already seated is simply
    /// re-subscribed.
    pub async fn join_lobby(&self, lobby_id: &str, player: Player) -> Result<Dispatch, AppError> {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            debug!(lobby_id, "Join for unknown lobby");
            return Ok(Dispatch::empty()
                .to_actor(ServerEvent::LobbyNotFound(LOBBY_NOT_FOUND.to_string())));
        };

        let player_id = player.player_id.clone();
        if guard.contains(&player_id) {
            debug!(lobby_id, player_id = %player_id, "Player rejoined");
            return Ok(Dispatch::for_lobby(lobby_id)
                .subscribing(lobby_id)
                .to_actor(ServerEvent::JoinedLobby(snapshot(guard.lobby()))));
        }

        let mut lobby = guard.lobby().clone();
        match lobby.add_player(player) {
            Ok(()) => {}
            Err(DomainError::Conflict(kind, detail)) => {
                let message = match kind {
                    ConflictKind::GameInProgress => GAME_ALREADY_STARTED,
                    _ => LOBBY_FULL,
                };
                debug!(lobby_id, player_id = %player_id, %detail, "Join refused");
                return Ok(Dispatch::for_lobby(lobby_id).to_actor(ServerEvent::FullLobby {
                    message: message.to_string(),
                    lobby: snapshot(guard.lobby()),
                }));
            }
            Err(err) => return Err(err.into()),
        }

        let snap = snapshot(&lobby);
        guard.commit(lobby);
        info!(lobby_id, player_id = %player_id, players = snap.current_players, "Player joined");
        Ok(Dispatch::for_lobby(lobby_id)
            .subscribing(lobby_id)
            .to_actor(ServerEvent::JoinedLobby(snap.clone()))
            .to_others(ServerEvent::UpdatedLobby(snap)))
    }

    pub async fn get_lobby(&self, lobby_id: &str) -> Dispatch {
        match self.registry.get(lobby_id).await {
            Some(lobby) => Dispatch::for_lobby(lobby_id)
                .to_actor(ServerEvent::LobbyDetails(snapshot(&lobby))),
            None => Dispatch::empty()
                .to_actor(ServerEvent::LobbyNotFound(LOBBY_NOT_FOUND.to_string())),
        }
    }

    /// Removes `player_id` from one lobby at their request.
    pub async fn leave_lobby(&self, lobby_id: &str, player_id: &str) -> Dispatch {
        let dispatch = Dispatch::for_lobby(lobby_id).unsubscribing(lobby_id);
        let Some(guard) = self.registry.lock(lobby_id).await else {
            return dispatch;
        };
        self.depart(guard, player_id)
            .await
            .into_iter()
            .fold(dispatch, Dispatch::to_others)
    }

    /// Removes a vanished player from every lobby that seats them.
    /// Returns how many lobbies were affected.
    pub async fn disconnect(&self, player_id: &str) -> usize {
        let mut affected = 0;
        for lobby_id in self.registry.lobby_ids() {
            let Some(guard) = self.registry.lock(&lobby_id).await else {
                continue;
            };
            if !guard.contains(player_id) {
                continue;
            }
            affected += 1;
            for event in self.depart(guard, player_id).await {
                self.hub.broadcast(&lobby_id, &event, None);
            }
        }
        if affected > 0 {
            info!(player_id, lobbies = affected, "Disconnected player removed");
        }
        affected
    }

    /// Host-only deal of the first round.
    pub async fn start_game(&self, lobby_id: &str, actor: &str) -> Dispatch {
        let Some(mut guard) = self.registry.lock(lobby_id).await else {
            return Dispatch::empty().to_actor(ServerEvent::ErrorStartGame {
                message: LOBBY_NOT_FOUND.to_string(),
            });
        };
        if guard.host != actor || !matches!(guard.stage, Stage::Waiting) {
            debug!(lobby_id, actor, phase = guard.stage.name(), "Start ignored");
            return Dispatch::empty();
        }

        let mut lobby = guard.lobby().clone();
        if let Err(err) = self.deck.start_round(&mut lobby).await {
            warn!(lobby_id, error = %err, "Failed to deal first round");
            return Dispatch::for_lobby(lobby_id).to_actor(ServerEvent::ErrorStartGame {
                message: START_FAILED.to_string(),
            });
        }

        let snap = snapshot(&lobby);
        guard.commit(lobby);
        info!(lobby_id, players = snap.current_players, "Game started");
        Dispatch::for_lobby(lobby_id).to_room(ServerEvent::GameStarted(snap))
    }

    /// Removes a player under an already held lock and returns what the rest
    /// of the room should hear. Deletes the lobby when it empties.
    async fn depart(&self, mut guard: LobbyGuard<'_>, player_id: &str) -> Vec<ServerEvent> {
        let mut lobby = guard.lobby().clone();
        let held_turn = lobby
            .table()
            .is_some_and(|t| t.current_turn == player_id);
        if lobby.remove_player(player_id).is_none() {
            return Vec::new();
        }

        if lobby.players.is_empty() {
            self.deck.release(&lobby).await;
            let lobby_id = lobby.id;
            guard.delete();
            self.hub.close_room(&lobby_id);
            info!(lobby_id = %lobby_id, "Last player left, lobby deleted");
            return Vec::new();
        }

        let mut events = vec![ServerEvent::UpdatedLobby(snapshot(&lobby))];

        // The leaver's turn went to the latch holder: the final lap is done.
        let lap_done = held_turn
            && matches!(lobby.stage, Stage::Playing(_))
            && lobby.table().is_some_and(|t| {
                t.player_started_last_turn.as_deref() == Some(t.current_turn.as_str())
            });
        if lap_done {
            let working = lobby.clone();
            match self.finish_round(&mut guard, working).await {
                Ok(event) => {
                    events.push(event);
                    return events;
                }
                Err(err) => {
                    warn!(lobby_id = %lobby.id, error = %err, "Round end after departure failed");
                    if let Some(table) = lobby.table_mut() {
                        table.round_end_due = true;
                    }
                    events.push(ServerEvent::ErrorEndGame {
                        message: END_ROUND_FAILED.to_string(),
                    });
                }
            }
        }

        guard.commit(lobby);
        info!(player_id, "Player left lobby");
        events
    }
}
