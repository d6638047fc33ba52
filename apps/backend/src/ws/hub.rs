//! Room fan-out for websocket sessions.
//!
//! Each lobby id maps to the connections subscribed to it. Broadcasts are
//! serialized once and delivered as shared text to every recipient.

use std::sync::Arc;

use actix::prelude::*;
use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ws::protocol::ServerEvent;

#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct RoomFrame {
    pub lobby_id: String,
    pub text: Arc<str>,
}

#[derive(Default)]
pub struct LobbyHub {
    rooms: DashMap<String, DashMap<Uuid, Recipient<RoomFrame>>>,
}

impl LobbyHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, lobby_id: &str, conn_id: Uuid, recipient: Recipient<RoomFrame>) {
        self.rooms
            .entry(lobby_id.to_string())
            .or_default()
            .insert(conn_id, recipient);
        debug!(lobby_id, conn_id = %conn_id, "Subscribed to lobby room");
    }

    pub fn unsubscribe(&self, lobby_id: &str, conn_id: Uuid) {
        if let Some(room) = self.rooms.get(lobby_id) {
            room.remove(&conn_id);
        }
        self.rooms.remove_if(lobby_id, |_, room| room.is_empty());
    }

    /// Drops a connection from every room it joined.
    pub fn unsubscribe_all(&self, conn_id: Uuid) {
        let joined: Vec<String> = self
            .rooms
            .iter()
            .filter(|room| room.value().contains_key(&conn_id))
            .map(|room| room.key().clone())
            .collect();
        for lobby_id in joined {
            self.unsubscribe(&lobby_id, conn_id);
        }
    }

    /// Drops a whole room, e.g. once its lobby is deleted.
    pub fn close_room(&self, lobby_id: &str) {
        self.rooms.remove(lobby_id);
    }

    pub fn subscribers(&self, lobby_id: &str) -> usize {
        self.rooms.get(lobby_id).map_or(0, |room| room.len())
    }

    /// Sends `event` to every subscriber of `lobby_id` except `exclude`.
    /// Returns how many recipients were addressed.
    pub fn broadcast(&self, lobby_id: &str, event: &ServerEvent, exclude: Option<Uuid>) -> usize {
        let text: Arc<str> = match serde_json::to_string(event) {
            Ok(text) => text.into(),
            Err(err) => {
                warn!(lobby_id, error = %err, "failed to serialize room event");
                return 0;
            }
        };

        let Some(room) = self.rooms.get(lobby_id) else {
            return 0;
        };
        let mut sent = 0;
        for entry in room.iter() {
            if Some(*entry.key()) == exclude {
                continue;
            }
            entry.value().do_send(RoomFrame {
                lobby_id: lobby_id.to_string(),
                text: text.clone(),
            });
            sent += 1;
        }
        debug!(lobby_id, event = event.name(), recipients = sent, "Room broadcast");
        sent
    }
}
