use actix_web::{web, App, HttpServer};
use golf_backend::config::{DeckConfig, GameConfig, ServerConfig};
use golf_backend::middleware::cors::cors_middleware;
use golf_backend::middleware::request_trace::RequestTrace;
use golf_backend::routes;
use golf_backend::state::build_state;

mod telemetry;

fn or_exit<T>(what: &str, res: Result<T, golf_backend::AppError>) -> T {
    res.unwrap_or_else(|e| {
        eprintln!("❌ Invalid {what} configuration: {e}");
        std::process::exit(1);
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Configuration comes from the process environment only:
    // - Docker: docker-compose env_file or docker run --env-file
    // - Local dev: source an env file manually (set -a; . ./.env; set +a)
    let server = or_exit("server", ServerConfig::from_env());
    let game = or_exit("game", GameConfig::from_env());
    let deck = or_exit("deck", DeckConfig::from_env());

    let (host, port) = server.bind_addr();
    println!("🚀 Starting Golf lobby server on http://{host}:{port}");
    tracing::info!(
        max_players = game.max_players,
        rounds = game.rounds,
        round_delay_ms = game.round_delay.as_millis() as u64,
        deck_provider = ?deck.provider,
        "Game settings loaded"
    );

    let app_state = match build_state().with_game(game).with_deck(deck).build() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
