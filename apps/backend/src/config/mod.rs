//! Settings read from the process environment.

pub mod game;
pub mod server;

pub use game::{DeckConfig, DeckProviderKind, GameConfig};
pub use server::ServerConfig;
