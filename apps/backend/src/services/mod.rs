pub mod deck_coordinator;
pub mod deck_provider;
pub mod game_flow;
pub mod registry;

pub use deck_coordinator::DeckCoordinator;
pub use deck_provider::{DeckProvider, HttpDeckProvider, LocalDeckProvider};
pub use game_flow::GameFlowService;
pub use registry::LobbyRegistry;
