use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::player::Player;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::errors::ErrorCode;
use crate::services::game_flow::{Audience, Dispatch, GameFlowService};
use crate::state::app_state::AppState;
use crate::ws::hub::{LobbyHub, RoomFrame};
use crate::ws::protocol::{normalize_lobby_id, ClientEvent, DrawAck, PlayerPayload, ServerEvent};
use crate::AppError;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), app_state.flow().clone());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    /// Bound by the first create or join; later frames must match it.
    player_id: Option<String>,
    flow: GameFlowService,
    hub: Arc<LobbyHub>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<SpawnHandle>,
}

impl WsSession {
    fn new(conn_id: Uuid, flow: GameFlowService) -> Self {
        let hub = flow.hub().clone();
        Self {
            conn_id,
            player_id: None,
            flow,
            hub,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerEvent) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, err: DomainError) {
        let err = AppError::from(err);
        Self::send_json(ctx, &ServerEvent::error(err.code(), err.detail()));
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    player_id = ?actor.player_id,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    /// Binds the connection on first use. False when `player_id` is not the
    /// player this connection speaks for.
    fn bind(&mut self, player_id: &str) -> bool {
        match &self.player_id {
            Some(bound) => bound == player_id,
            None => {
                self.player_id = Some(player_id.to_string());
                debug!(conn_id = %self.conn_id, player_id, "[WS SESSION] bound to player");
                true
            }
        }
    }

    /// The bound player, if `claimed` (when given) matches it.
    fn actor(&self, claimed: Option<&str>) -> Option<String> {
        let bound = self.player_id.as_deref()?;
        match claimed {
            Some(id) if id != bound => {
                debug!(
                    conn_id = %self.conn_id,
                    bound,
                    claimed = id,
                    "[WS SESSION] frame for another player ignored"
                );
                None
            }
            _ => Some(bound.to_string()),
        }
    }

    /// Runs a service call to completion before the next frame is handled,
    /// so one connection's actions apply in the order they were sent.
    fn run<F>(&mut self, ctx: &mut ws::WebsocketContext<Self>, fut: F)
    where
        F: Future<Output = Dispatch> + 'static,
    {
        ctx.wait(
            fut.into_actor(self)
                .map(|dispatch, actor, ctx| actor.deliver(dispatch, ctx)),
        );
    }

    fn deliver(&mut self, dispatch: Dispatch, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(lobby_id) = &dispatch.subscribe {
            self.hub
                .subscribe(lobby_id, self.conn_id, ctx.address().recipient());
        }
        for delivery in &dispatch.deliveries {
            let room = dispatch.lobby_id.as_deref();
            match (delivery.audience, room) {
                (Audience::Actor, _) => Self::send_json(ctx, &delivery.event),
                (Audience::Room, Some(lobby_id)) => {
                    Self::send_json(ctx, &delivery.event);
                    self.hub
                        .broadcast(lobby_id, &delivery.event, Some(self.conn_id));
                }
                (Audience::Others, Some(lobby_id)) => {
                    self.hub
                        .broadcast(lobby_id, &delivery.event, Some(self.conn_id));
                }
                (_, None) => Self::send_json(ctx, &delivery.event),
            }
        }
        if let Some(lobby_id) = &dispatch.unsubscribe {
            self.hub.unsubscribe(lobby_id, self.conn_id);
        }
    }

    fn handle_event(&mut self, event: ClientEvent, ctx: &mut ws::WebsocketContext<Self>) {
        let flow = self.flow.clone();
        match event {
            ClientEvent::CreateLobby(payload) => {
                if let Err(err) = payload.validate() {
                    Self::send_error(ctx, err);
                    return;
                }
                if !self.bind(&payload.player_id) {
                    return;
                }
                match flow.create_lobby(player_from(&payload)) {
                    Ok(dispatch) => self.deliver(dispatch, ctx),
                    Err(err) => {
                        warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] create failed");
                        Self::send_json(ctx, &ServerEvent::error(err.code(), err.detail()));
                    }
                }
            }
            ClientEvent::JoinLobby(payload) => {
                let lobby_id = match payload.validate() {
                    Ok(id) => id,
                    Err(DomainError::Validation(ValidationKind::InvalidLobbyId, _)) => {
                        Self::send_json(ctx, &ServerEvent::LobbyNotFound("Lobby not found".into()));
                        return;
                    }
                    Err(err) => {
                        Self::send_error(ctx, err);
                        return;
                    }
                };
                if !self.bind(&payload.player_id) {
                    return;
                }
                let player = player_from(&payload.profile());
                self.run(ctx, async move {
                    flow.join_lobby(&lobby_id, player).await.unwrap_or_else(|err| {
                        Dispatch::empty().to_actor(ServerEvent::error(err.code(), err.detail()))
                    })
                });
            }
            ClientEvent::GetLobby(raw) => match normalize_lobby_id(&raw) {
                Ok(lobby_id) => self.run(ctx, async move { flow.get_lobby(&lobby_id).await }),
                Err(_) => {
                    Self::send_json(ctx, &ServerEvent::LobbyNotFound("Lobby not found".into()))
                }
            },
            ClientEvent::LeaveLobby(payload) => {
                let (Ok(lobby_id), Some(actor)) =
                    (normalize_lobby_id(&payload.lobby_id), self.actor(None))
                else {
                    return;
                };
                self.run(ctx, async move { flow.leave_lobby(&lobby_id, &actor).await });
            }
            ClientEvent::StartGame(raw) => {
                let (Ok(lobby_id), Some(actor)) = (normalize_lobby_id(&raw), self.actor(None))
                else {
                    return;
                };
                self.run(ctx, async move { flow.start_game(&lobby_id, &actor).await });
            }
            ClientEvent::FlipCard(payload) => {
                let (Ok(lobby_id), Some(actor)) = (
                    normalize_lobby_id(&payload.lobby_id),
                    self.actor(Some(&payload.player_id)),
                ) else {
                    return;
                };
                self.run(ctx, async move {
                    flow.flip_card(&lobby_id, &actor, &payload.card).await
                });
            }
            ClientEvent::ReplaceCard(payload) => {
                let (Ok(lobby_id), Some(actor)) = (
                    normalize_lobby_id(&payload.lobby_id),
                    self.actor(Some(&payload.player_id)),
                ) else {
                    return;
                };
                self.run(ctx, async move {
                    flow.replace_card(
                        &lobby_id,
                        &actor,
                        &payload.drawn_card.code,
                        &payload.card_to_replace.code,
                    )
                    .await
                });
            }
            ClientEvent::DrawCardFromDeck(raw) => {
                let (Ok(lobby_id), Some(actor)) = (normalize_lobby_id(&raw), self.actor(None))
                else {
                    Self::send_json(
                        ctx,
                        &ServerEvent::DrawCardFromDeck(DrawAck {
                            success: false,
                            card: None,
                            message: Some("Join a lobby first".into()),
                        }),
                    );
                    return;
                };
                self.run(ctx, async move { flow.draw_card(&lobby_id, &actor).await });
            }
            ClientEvent::DiscardCard(payload) => {
                let (Ok(lobby_id), Some(actor)) = (
                    normalize_lobby_id(&payload.lobby_id),
                    self.actor(Some(&payload.player_id)),
                ) else {
                    return;
                };
                self.run(ctx, async move {
                    flow.discard_card(&lobby_id, &actor, &payload.card.code).await
                });
            }
        }
    }
}

fn player_from(profile: &PlayerPayload) -> Player {
    Player::new(
        profile.player_id.clone(),
        profile.nickname.trim().to_string(),
        profile.image.clone(),
        false,
    )
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        if let Some(handle) = self.heartbeat_handle.take() {
            ctx.cancel_future(handle);
        }
        self.hub.unsubscribe_all(self.conn_id);
        if let Some(player_id) = self.player_id.clone() {
            let flow = self.flow.clone();
            actix_web::rt::spawn(async move {
                flow.disconnect(&player_id).await;
            });
        }
        info!(
            conn_id = %self.conn_id,
            player_id = ?self.player_id,
            "[WS SESSION] stopped"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        debug!(conn_id = %self.conn_id, event = event.name(), "[WS SESSION] frame");
                        self.handle_event(event, ctx);
                    }
                    Err(err) => {
                        debug!(conn_id = %self.conn_id, error = %err, "[WS SESSION] malformed frame");
                        Self::send_json(
                            ctx,
                            &ServerEvent::error(ErrorCode::BadRequest, "Malformed frame"),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_json(
                    ctx,
                    &ServerEvent::error(ErrorCode::BadRequest, "Binary frames are not supported"),
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<RoomFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: RoomFrame, ctx: &mut Self::Context) -> Self::Result {
        debug!(conn_id = %self.conn_id, lobby_id = %msg.lobby_id, "[WS SESSION] room frame");
        ctx.text(msg.text.to_string());
    }
}
