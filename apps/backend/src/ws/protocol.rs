//! Websocket frames: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cards::{Card, CardRef};
use crate::domain::rules::NICKNAME_LEN;
use crate::domain::snapshot::LobbySnapshot;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::errors::ErrorCode;
use crate::utils::lobby_code::is_lobby_code;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPayload {
    pub player_id: String,
    pub nickname: String,
    pub image: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub player_id: String,
    pub nickname: String,
    pub image: String,
    pub lobby_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub lobby_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipPayload {
    pub player_id: String,
    /// Card code.
    pub card: String,
    pub lobby_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePayload {
    pub player_id: String,
    pub drawn_card: CardRef,
    pub card_to_replace: CardRef,
    pub lobby_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardPayload {
    pub lobby_id: String,
    pub player_id: String,
    pub card: CardRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    CreateLobby(PlayerPayload),
    JoinLobby(JoinPayload),
    GetLobby(String),
    LeaveLobby(LeavePayload),
    StartGame(String),
    FlipCard(FlipPayload),
    ReplaceCard(ReplacePayload),
    DrawCardFromDeck(String),
    DiscardCard(DiscardPayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateLobby(_) => "create-lobby",
            ClientEvent::JoinLobby(_) => "join-lobby",
            ClientEvent::GetLobby(_) => "get-lobby",
            ClientEvent::LeaveLobby(_) => "leave-lobby",
            ClientEvent::StartGame(_) => "start-game",
            ClientEvent::FlipCard(_) => "flip-card",
            ClientEvent::ReplaceCard(_) => "replace-card",
            ClientEvent::DrawCardFromDeck(_) => "draw-card-from-deck",
            ClientEvent::DiscardCard(_) => "discard-card",
        }
    }
}

/// Trims and upper-cases a client lobby id, rejecting malformed ones.
pub fn normalize_lobby_id(raw: &str) -> Result<String, DomainError> {
    let id = raw.trim().to_ascii_uppercase();
    if is_lobby_code(&id) {
        Ok(id)
    } else {
        Err(DomainError::validation(
            ValidationKind::InvalidLobbyId,
            format!("{raw:?} is not a lobby id"),
        ))
    }
}

pub fn validate_player_id(raw: &str) -> Result<(), DomainError> {
    Uuid::parse_str(raw).map(|_| ()).map_err(|_| {
        DomainError::validation(
            ValidationKind::InvalidPlayerId,
            format!("{raw:?} is not a uuid"),
        )
    })
}

fn validate_profile(nickname: &str, image: &str) -> Result<(), DomainError> {
    let len = nickname.trim().chars().count();
    if !NICKNAME_LEN.contains(&len) {
        return Err(DomainError::validation(
            ValidationKind::InvalidNickname,
            format!(
                "nickname must be {} to {} characters",
                NICKNAME_LEN.start(),
                NICKNAME_LEN.end()
            ),
        ));
    }
    if image.trim().is_empty() {
        return Err(DomainError::validation(
            ValidationKind::Other("image".into()),
            "image is required",
        ));
    }
    Ok(())
}

impl PlayerPayload {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_player_id(&self.player_id)?;
        validate_profile(&self.nickname, &self.image)
    }
}

impl JoinPayload {
    pub fn validate(&self) -> Result<String, DomainError> {
        validate_player_id(&self.player_id)?;
        validate_profile(&self.nickname, &self.image)?;
        normalize_lobby_id(&self.lobby_id)
    }

    pub fn profile(&self) -> PlayerPayload {
        PlayerPayload {
            player_id: self.player_id.clone(),
            nickname: self.nickname.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    LobbyCreated(LobbySnapshot),
    JoinedLobby(LobbySnapshot),
    LobbyDetails(LobbySnapshot),
    UpdatedLobby(LobbySnapshot),
    UpdatedGame(LobbySnapshot),
    FullLobby {
        message: String,
        lobby: LobbySnapshot,
    },
    LobbyNotFound(String),
    GameStarted(LobbySnapshot),
    FinishRound(LobbySnapshot),
    ProceedToNextRound(LobbySnapshot),
    EndGame(LobbySnapshot),
    ErrorStartGame {
        message: String,
    },
    ErrorEndGame {
        message: String,
    },
    DrawCardFromDeck(DrawAck),
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::LobbyCreated(_) => "lobby-created",
            ServerEvent::JoinedLobby(_) => "joined-lobby",
            ServerEvent::LobbyDetails(_) => "lobby-details",
            ServerEvent::UpdatedLobby(_) => "updated-lobby",
            ServerEvent::UpdatedGame(_) => "updated-game",
            ServerEvent::FullLobby { .. } => "full-lobby",
            ServerEvent::LobbyNotFound(_) => "lobby-not-found",
            ServerEvent::GameStarted(_) => "game-started",
            ServerEvent::FinishRound(_) => "finish-round",
            ServerEvent::ProceedToNextRound(_) => "proceed-to-next-round",
            ServerEvent::EndGame(_) => "end-game",
            ServerEvent::ErrorStartGame { .. } => "error-start-game",
            ServerEvent::ErrorEndGame { .. } => "error-end-game",
            ServerEvent::DrawCardFromDeck(_) => "draw-card-from-deck",
            ServerEvent::Error { .. } => "error",
        }
    }
}
