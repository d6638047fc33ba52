use uuid::Uuid;

/// A fresh player id in the uuid form the websocket layer accepts.
pub fn unique_player_id() -> String {
    Uuid::new_v4().to_string()
}

/// A nickname within the accepted 3..=12 characters: up to six characters
/// of `prefix` followed by six random hex digits.
pub fn unique_nickname(prefix: &str) -> String {
    let head: String = prefix.chars().take(6).collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{head}{}", &suffix[..6])
}
