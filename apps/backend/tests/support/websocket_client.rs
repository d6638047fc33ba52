// Websocket client speaking the lobby protocol

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use golf_test_support::unique_helpers::{unique_nickname, unique_player_id};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub player_id: String,
    pub nickname: String,
}

impl WebSocketClient {
    /// Connects with a fresh player identity, retrying until the server is up.
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => {
                    return Ok(Self {
                        stream,
                        player_id: unique_player_id(),
                        nickname: unique_nickname("golf"),
                    })
                }
                Err(err) => {
                    if start.elapsed() >= Duration::from_secs(1) {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::text(text.to_string())).await?;
        Ok(())
    }

    pub async fn emit(&mut self, event: &str, data: Value) -> Result<(), Box<dyn std::error::Error>> {
        let frame = json!({ "event": event, "data": data });
        self.send_raw(&frame.to_string()).await
    }

    pub fn profile(&self) -> Value {
        json!({
            "playerId": self.player_id,
            "nickname": self.nickname,
            "image": "avatar.png",
        })
    }

    pub async fn create_lobby(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        self.emit("create-lobby", self.profile()).await?;
        self.expect("lobby-created").await
    }

    pub async fn join_lobby(&mut self, lobby_id: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let mut data = self.profile();
        data["lobbyId"] = json!(lobby_id);
        self.emit("join-lobby", data).await?;
        self.next_frame().await
    }

    /// Next JSON frame, failing on timeout or a non-text frame.
    pub async fn next_frame(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| "timeout waiting for frame")?
                .ok_or("stream ended")??;
            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return Err(format!("unexpected frame: {other:?}").into()),
            }
        }
    }

    /// Next frame, asserting its event name. Returns the `data` payload.
    pub async fn expect(&mut self, event: &str) -> Result<Value, Box<dyn std::error::Error>> {
        let frame = self.next_frame().await?;
        if frame["event"] != event {
            return Err(format!("expected {event}, got {frame}").into());
        }
        Ok(frame["data"].clone())
    }

    /// Asserts nothing arrives within `wait`.
    pub async fn expect_silence(&mut self, wait: Duration) -> Result<(), Box<dyn std::error::Error>> {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Err(_) => Ok(()),
            Ok(frame) => Err(format!("expected silence, got {frame:?}").into()),
        }
    }

    pub async fn close(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Codes of `player_id`'s board in `lobby`.
pub fn board_codes(lobby: &Value, player_id: &str) -> Vec<String> {
    lobby["players"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|p| p["playerId"] == player_id)
        .and_then(|p| p["cards"].as_array())
        .map(|cards| {
            cards
                .iter()
                .filter_map(|c| c["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
