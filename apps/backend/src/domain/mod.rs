//! Domain layer: pure game logic types and helpers.

pub mod cards;
pub mod deck;
pub mod lobby;
pub mod player;
pub mod rules;
pub mod scoring;
pub mod snapshot;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
pub(crate) mod test_state_helpers;
#[cfg(test)]
mod tests_props_rules;
#[cfg(test)]
mod tests_scoring;

// Re-exports for ergonomics
pub use cards::{Card, CardRef, Rank};
pub use deck::{Deck, Drawn};
pub use lobby::{Lobby, LobbyStatus, PendingDraw, Stage, Table};
pub use player::{Board, Player};
pub use rules::{TurnAdvance, TurnPhase};
pub use scoring::ScoreboardEntry;
pub use snapshot::LobbySnapshot;
