//! Game flow service: every client action as one locked read-modify-write
//! on a lobby.
//!
//! Each operation locks its lobby, applies the domain transform to a working
//! copy and commits it only when the whole action succeeded. The result is a
//! [`Dispatch`] describing what the acting connection and its room should be
//! sent. Rule violations come back as an empty dispatch.

mod dispatch;
mod lobby_actions;
mod player_actions;
mod round_lifecycle;

#[cfg(test)]
mod tests_flow;

use std::sync::Arc;

pub use dispatch::{Audience, Delivery, Dispatch};

use crate::config::GameConfig;
use crate::services::deck_coordinator::DeckCoordinator;
use crate::services::registry::LobbyRegistry;
use crate::ws::hub::LobbyHub;

#[derive(Clone)]
pub struct GameFlowService {
    registry: Arc<LobbyRegistry>,
    deck: DeckCoordinator,
    hub: Arc<LobbyHub>,
    config: GameConfig,
}

impl GameFlowService {
    pub fn new(
        registry: Arc<LobbyRegistry>,
        deck: DeckCoordinator,
        hub: Arc<LobbyHub>,
        config: GameConfig,
    ) -> Self {
        Self {
            registry,
            deck,
            hub,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<LobbyRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &Arc<LobbyHub> {
        &self.hub
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}
