// Error mapping tests: pure domain errors to AppError codes and statuses.
use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_to_422() {
    let de = DomainError::validation(ValidationKind::Other("too short".into()), "bad field");
    let app: AppError = de.into();
    assert_eq!(app.code(), ErrorCode::ValidationError);
    assert_eq!(app.status().as_u16(), 422);

    let lobby = DomainError::validation(ValidationKind::InvalidLobbyId, "len 3");
    let app: AppError = lobby.into();
    assert_eq!(app.code(), ErrorCode::InvalidLobbyId);
}

#[test]
fn maps_conflicts() {
    let full = DomainError::conflict(ConflictKind::LobbyFull, "lobby is full");
    let app: AppError = full.into();
    assert_eq!(app.code().as_str(), "LOBBY_FULL");
    assert_eq!(app.status().as_u16(), 409);

    let started = DomainError::conflict(ConflictKind::GameInProgress, "started");
    let app: AppError = started.into();
    assert_eq!(app.code().as_str(), "GAME_IN_PROGRESS");

    let other = DomainError::conflict(ConflictKind::Other("x".to_string()), "generic conflict");
    let app: AppError = other.into();
    assert_eq!(app.code().as_str(), "CONFLICT");
    assert_eq!(app.status().as_u16(), 409);
}

#[test]
fn maps_not_found() {
    let nf = DomainError::not_found(NotFoundKind::Lobby, "no lobby");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "LOBBY_NOT_FOUND");
    assert_eq!(app.status().as_u16(), 404);

    let nf = DomainError::not_found(NotFoundKind::Other("seat".into()), "no seat");
    let app: AppError = nf.into();
    assert_eq!(app.code().as_str(), "NOT_FOUND");
}

#[test]
fn maps_infra() {
    let t = DomainError::infra(InfraErrorKind::DeckTimeout, "timeout");
    let app: AppError = t.into();
    assert_eq!(app.code().as_str(), "DECK_TIMEOUT");
    assert_eq!(app.status().as_u16(), 504);
    assert!(matches!(app, AppError::Upstream { .. }));

    let down = DomainError::infra(InfraErrorKind::DeckUnavailable, "down");
    let app: AppError = down.into();
    assert_eq!(app.code().as_str(), "DECK_UNAVAILABLE");
    assert_eq!(app.status().as_u16(), 502);

    let other = DomainError::infra(InfraErrorKind::Other("unknown".to_string()), "other");
    let app: AppError = other.into();
    assert_eq!(app.code(), ErrorCode::Internal);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn upstream_flag_only_for_infra() {
    assert!(DomainError::infra(InfraErrorKind::DeckUnavailable, "x").is_upstream());
    assert!(!DomainError::not_found(NotFoundKind::Lobby, "x").is_upstream());
}
