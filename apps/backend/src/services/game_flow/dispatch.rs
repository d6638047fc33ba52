use crate::domain::lobby::Lobby;
use crate::domain::snapshot::LobbySnapshot;
use crate::ws::protocol::ServerEvent;

/// Who receives a delivery, relative to the acting connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Actor,
    /// Everyone subscribed to the lobby, actor included.
    Room,
    /// The room minus the actor.
    Others,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: ServerEvent,
}

/// Outcome of one client action: room membership changes for the acting
/// connection and the events to fan out, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    pub lobby_id: Option<String>,
    pub subscribe: Option<String>,
    pub unsubscribe: Option<String>,
    pub deliveries: Vec<Delivery>,
}

impl Dispatch {
    /// A no-op: nothing changed and nobody is told.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_lobby(lobby_id: impl Into<String>) -> Self {
        Self {
            lobby_id: Some(lobby_id.into()),
            ..Self::default()
        }
    }

    pub fn subscribing(mut self, lobby_id: impl Into<String>) -> Self {
        self.subscribe = Some(lobby_id.into());
        self
    }

    pub fn unsubscribing(mut self, lobby_id: impl Into<String>) -> Self {
        self.unsubscribe = Some(lobby_id.into());
        self
    }

    pub fn to(mut self, audience: Audience, event: ServerEvent) -> Self {
        self.deliveries.push(Delivery { audience, event });
        self
    }

    pub fn to_actor(self, event: ServerEvent) -> Self {
        self.to(Audience::Actor, event)
    }

    pub fn to_room(self, event: ServerEvent) -> Self {
        self.to(Audience::Room, event)
    }

    pub fn to_others(self, event: ServerEvent) -> Self {
        self.to(Audience::Others, event)
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty() && self.subscribe.is_none() && self.unsubscribe.is_none()
    }

    /// Event names in delivery order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.deliveries.iter().map(|d| d.event.name()).collect()
    }

    /// First event addressed to `audience`.
    pub fn first_for(&self, audience: Audience) -> Option<&ServerEvent> {
        self.deliveries
            .iter()
            .find(|d| d.audience == audience)
            .map(|d| &d.event)
    }
}

pub fn snapshot(lobby: &Lobby) -> LobbySnapshot {
    LobbySnapshot::from(lobby)
}
