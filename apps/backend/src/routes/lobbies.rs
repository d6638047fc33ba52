use actix_web::{web, HttpResponse};

use crate::domain::snapshot::LobbySnapshot;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::state::app_state::AppState;
use crate::ws::protocol::normalize_lobby_id;

fn missing_lobby(lobby_id: &str) -> AppError {
    DomainError::not_found(NotFoundKind::Lobby, format!("lobby {lobby_id} not found")).into()
}

/// Current state of one lobby, as websocket clients see it.
async fn get_lobby(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let lobby_id = normalize_lobby_id(&raw).map_err(|_| missing_lobby(&raw))?;
    let lobby = app_state
        .registry()
        .get(&lobby_id)
        .await
        .ok_or_else(|| missing_lobby(&lobby_id))?;
    Ok(HttpResponse::Ok().json(LobbySnapshot::from(&lobby)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{lobby_id}", web::get().to(get_lobby));
}
