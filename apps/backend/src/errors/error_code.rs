//! Error codes for the lobby server.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP problem bodies and websocket `error` frames.

use core::fmt;

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Malformed or unparseable payload
    BadRequest,
    /// Payload parsed but a field is out of range
    ValidationError,
    /// Invalid lobby id format
    InvalidLobbyId,
    /// Invalid nickname
    InvalidNickname,
    /// Invalid player id
    InvalidPlayerId,
    /// Invalid card code
    InvalidCard,

    // Resource Not Found
    /// Lobby not found
    LobbyNotFound,
    /// General not found error
    NotFound,

    // Game rule conflicts
    /// Lobby already has max players
    LobbyFull,
    /// Game already started; lobby closed to new players
    GameInProgress,
    /// Lobby id already registered
    LobbyIdConflict,
    /// Action arrived out of turn
    OutOfTurn,
    /// Action not allowed in the current phase
    PhaseMismatch,
    /// A draw is already pending for this lobby
    DrawPending,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // Upstream
    /// Deck provider unreachable or returned an error
    DeckUnavailable,
    /// Deck provider timed out
    DeckTimeout,

    // System Errors
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidLobbyId => "INVALID_LOBBY_ID",
            Self::InvalidNickname => "INVALID_NICKNAME",
            Self::InvalidPlayerId => "INVALID_PLAYER_ID",
            Self::InvalidCard => "INVALID_CARD",

            Self::LobbyNotFound => "LOBBY_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::LobbyFull => "LOBBY_FULL",
            Self::GameInProgress => "GAME_IN_PROGRESS",
            Self::LobbyIdConflict => "LOBBY_ID_CONFLICT",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::DrawPending => "DRAW_PENDING",
            Self::Conflict => "CONFLICT",

            Self::DeckUnavailable => "DECK_UNAVAILABLE",
            Self::DeckTimeout => "DECK_TIMEOUT",

            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
