//! In-memory lobby registry with one async lock per lobby.
//!
//! The map itself is a `DashMap`, so lookups never contend across lobbies.
//! Each entry is an `Arc<Mutex<LobbySlot>>`; holding a `LobbyGuard` gives
//! exclusive access to one lobby for a whole read-modify-write, provider
//! calls included. Deleting closes the slot under its lock before the map
//! entry is dropped, so queued waiters see the lobby as gone.

use std::ops::Deref;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::lobby::Lobby;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::utils::lobby_code::generate_lobby_code;

pub struct LobbySlot {
    lobby: Lobby,
    closed: bool,
}

type SharedSlot = Arc<Mutex<LobbySlot>>;

#[derive(Default)]
pub struct LobbyRegistry {
    slots: DashMap<String, SharedSlot>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh id not currently registered.
    pub fn generate_id(&self) -> String {
        loop {
            let id = generate_lobby_code();
            if !self.slots.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn create(&self, lobby: Lobby) -> Result<(), DomainError> {
        match self.slots.entry(lobby.id.clone()) {
            Entry::Occupied(_) => Err(DomainError::conflict(
                ConflictKind::LobbyIdTaken,
                format!("lobby {} already exists", lobby.id),
            )),
            Entry::Vacant(v) => {
                debug!(lobby_id = %lobby.id, "Lobby registered");
                v.insert(Arc::new(Mutex::new(LobbySlot {
                    lobby,
                    closed: false,
                })));
                Ok(())
            }
        }
    }

    /// Exclusive access to a lobby; `None` if it does not exist or was
    /// deleted while waiting.
    pub async fn lock(&self, id: &str) -> Option<LobbyGuard<'_>> {
        let slot = self.slots.get(id).map(|e| e.value().clone())?;
        let guard = slot.clone().lock_owned().await;
        if guard.closed {
            return None;
        }
        Some(LobbyGuard {
            registry: self,
            id: id.to_string(),
            slot,
            guard,
        })
    }

    pub async fn get(&self, id: &str) -> Option<Lobby> {
        self.lock(id).await.map(|g| g.lobby().clone())
    }

    /// Replaces a lobby's state. Returns false if the lobby is gone.
    pub async fn set(&self, id: &str, lobby: Lobby) -> bool {
        match self.lock(id).await {
            Some(mut guard) => {
                guard.commit(lobby);
                true
            }
            None => false,
        }
    }

    pub async fn delete(&self, id: &str) -> bool {
        match self.lock(id).await {
            Some(guard) => {
                guard.delete();
                true
            }
            None => false,
        }
    }

    pub fn lobby_ids(&self) -> Vec<String> {
        self.slots.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

pub struct LobbyGuard<'a> {
    registry: &'a LobbyRegistry,
    id: String,
    slot: SharedSlot,
    guard: OwnedMutexGuard<LobbySlot>,
}

impl LobbyGuard<'_> {
    pub fn lobby(&self) -> &Lobby {
        &self.guard.lobby
    }

    /// Stores the working copy as the lobby's new state.
    pub fn commit(&mut self, lobby: Lobby) {
        self.guard.lobby = lobby;
    }

    /// Closes the slot and removes it from the registry.
    pub fn delete(mut self) {
        self.guard.closed = true;
        let slot = self.slot.clone();
        self.registry
            .slots
            .remove_if(&self.id, |_, current| Arc::ptr_eq(current, &slot));
        debug!(lobby_id = %self.id, "Lobby deleted");
    }
}

impl Deref for LobbyGuard<'_> {
    type Target = Lobby;

    fn deref(&self) -> &Lobby {
        self.lobby()
    }
}
