use actix_web::web;

pub mod health;
pub mod lobbies;

/// Registers every route. `main.rs` and the integration tests share this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root));

    // Health check routes: /health
    cfg.configure(health::configure_routes);

    // Lobby lookups: /api/lobbies/**
    cfg.service(web::scope("/api/lobbies").configure(lobbies::configure_routes));

    // Realtime: /ws
    cfg.route("/ws", web::get().to(crate::ws::session::upgrade));
}
