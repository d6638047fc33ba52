use std::sync::Arc;

use crate::config::{DeckConfig, DeckProviderKind, GameConfig};
use crate::error::AppError;
use crate::services::deck_coordinator::DeckCoordinator;
use crate::services::deck_provider::{DeckProvider, HttpDeckProvider, LocalDeckProvider};
use crate::services::game_flow::GameFlowService;
use crate::services::registry::LobbyRegistry;
use crate::ws::hub::LobbyHub;

/// Application state shared by every worker.
#[derive(Clone)]
pub struct AppState {
    flow: GameFlowService,
}

impl AppState {
    pub fn new(flow: GameFlowService) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &GameFlowService {
        &self.flow
    }

    pub fn registry(&self) -> &Arc<LobbyRegistry> {
        self.flow.registry()
    }

    pub fn hub(&self) -> &Arc<LobbyHub> {
        self.flow.hub()
    }
}

/// Builder for creating AppState instances (used in both tests and main)
pub struct StateBuilder {
    game: GameConfig,
    deck: DeckConfig,
    provider: Option<Arc<dyn DeckProvider>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            game: GameConfig::default(),
            deck: DeckConfig::default(),
            provider: None,
        }
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    pub fn with_deck(mut self, deck: DeckConfig) -> Self {
        self.deck = deck;
        self
    }

    /// Uses `provider` instead of the one `DeckConfig` would select.
    pub fn with_provider(mut self, provider: Arc<dyn DeckProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<AppState, AppError> {
        let provider: Arc<dyn DeckProvider> = match self.provider {
            Some(provider) => provider,
            None => match self.deck.provider {
                DeckProviderKind::Http => {
                    Arc::new(HttpDeckProvider::new(self.deck.api_url, self.deck.timeout)?)
                }
                DeckProviderKind::Local => Arc::new(LocalDeckProvider::new()),
            },
        };
        let flow = GameFlowService::new(
            Arc::new(LobbyRegistry::new()),
            DeckCoordinator::new(provider),
            Arc::new(LobbyHub::new()),
            self.game,
        );
        Ok(AppState::new(flow))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
