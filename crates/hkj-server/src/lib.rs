//! HTTP and WebSocket front for the hanamikoji server.
//!
//! A thin actix-web shell around the room registry: `/health` for
//! liveness, `/ws` for the duplex game channel. All game semantics live
//! behind the registry in [`hkj_gameroom`].
//!
//! ## Submodules
//!
//! - [`registry`] — Room registry ("Okiya"): create, join, rehydrate, sweep
//! - [`session`] — Per-connection WebSocket bridge

pub mod registry;
pub mod session;

pub use registry::Okiya;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;

fn environment() -> String {
    std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
}

fn cors_origins() -> Vec<String> {
    std::env::var("CORS_ORIGINS")
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "environment": environment(),
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default(),
        "corsOrigins": cors_origins(),
    }))
}

pub async fn run() -> Result<(), std::io::Error> {
    let store = hkj_store::SnapshotStore::from_env();
    if store.is_none() {
        log::info!("REDIS_URL unset, room snapshots disabled");
    }
    let okiya = web::Data::new(Okiya::new(store));
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3001);
    log::info!("starting server on port {}", port);
    HttpServer::new(move || {
        let origins = cors_origins();
        let cors = if origins.is_empty() {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            origins
                .iter()
                .fold(
                    Cors::default().allow_any_method().allow_any_header(),
                    |cors, origin| cors.allowed_origin(origin),
                )
        };
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(cors)
            .app_data(okiya.clone())
            .route("/health", web::get().to(health))
            .route("/ws", web::get().to(session::connect))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn cors_origins_split_and_trim() {
        std::env::set_var("CORS_ORIGINS", "http://a.example, http://b.example ,");
        let origins = cors_origins();
        assert_eq!(origins, vec!["http://a.example", "http://b.example"]);
        std::env::remove_var("CORS_ORIGINS");
    }
}
