//! Lobby id generation.
//!
//! Lobby ids are 12-character strings over Crockford's Base32 alphabet,
//! drawn from the thread-local OS-seeded RNG.

use rand::Rng;

use crate::domain::rules::LOBBY_ID_LEN;

const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ"; // no I, L, O, U

pub fn generate_lobby_code() -> String {
    let mut rng = rand::rng();
    (0..LOBBY_ID_LEN)
        .map(|_| char::from(CROCKFORD[rng.random_range(0..CROCKFORD.len())]))
        .collect()
}

/// Shape check for client-supplied ids; case-sensitive.
pub fn is_lobby_code(candidate: &str) -> bool {
    candidate.len() == LOBBY_ID_LEN && candidate.bytes().all(|b| CROCKFORD.contains(&b))
}
