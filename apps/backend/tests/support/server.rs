// Real HTTP server for websocket tests

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use golf_backend::config::GameConfig;
use golf_backend::middleware::request_trace::RequestTrace;
use golf_backend::routes;
use golf_backend::services::LocalDeckProvider;
use golf_backend::state::{build_state, AppState};

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    pub state: AppState,
    handle: actix_web::dev::ServerHandle,
    join: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
        let _ = self.join.await;
    }
}

/// Default game settings with a seeded local deck and a short round delay.
pub async fn start_test_server() -> Result<TestServer, Box<dyn std::error::Error>> {
    start_test_server_with(GameConfig {
        round_delay: Duration::from_millis(50),
        ..GameConfig::default()
    })
    .await
}

pub async fn start_test_server_with(
    game: GameConfig,
) -> Result<TestServer, Box<dyn std::error::Error>> {
    let state = build_state()
        .with_game(game)
        .with_provider(Arc::new(LocalDeckProvider::with_seed(42)))
        .build()?;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let data = web::Data::new(state.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let handle = server.handle();
    let join = tokio::spawn(server);

    Ok(TestServer {
        addr,
        state,
        handle,
        join,
    })
}

/// Polls until the registry holds `expected` lobbies.
pub async fn wait_for_lobbies(
    state: &AppState,
    expected: usize,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = tokio::time::Instant::now();
    loop {
        if state.registry().len() == expected {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(format!(
                "timeout waiting for {expected} lobbies (got {})",
                state.registry().len()
            )
            .into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
