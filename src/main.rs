// src/main.rs
mod classify;
mod config;
mod enrich;
mod handlers;
mod models;
mod steam;
mod storage;
mod utils;

use actix_cors::Cors;
use actix_web::{ web, App, HttpServer };
use env_logger::Env;
use governor::RateLimiter;
use storage::memory::ServerCache;
use handlers::servers::RequestCounter;
use crate::config::Config;
use crate::steam::SteamClient;
use crate::utils::{IpRateLimiter, TrustedProxies};
use log::{ info, warn, error };

fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Load configuration
    let config = Config::from_env();

    if config.steam_api_key.is_none() {
        warn!("STEAM_API_KEY is not set; master server requests will fail and fall back to cached or mock data");
    }

    let steam = match SteamClient::new(&config) {
        Ok(client) => web::Data::new(client),
        Err(e) => {
            error!("Failed to build master server client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let cache = web::Data::new(ServerCache::default());
    let counter = web::Data::new(RequestCounter::default());

    let server_list_rate_limiter: web::Data<IpRateLimiter> =
        web::Data::new(RateLimiter::keyed(config.server_list_quota()));

    let proxies = web::Data::new(TrustedProxies::new(config.trusted_proxies.clone()));
    if config.trusted_proxies.is_empty() {
        info!("No trusted proxies configured; clients are identified by peer address");
    }

    let allowed_origins = config.allowed_origins.clone();
    let bind = config.bind();

    info!("Allowing cross-origin requests from {:?}", allowed_origins);
    info!("Starting server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .app_data(cache.clone())
            .app_data(steam.clone())
            .app_data(counter.clone())
            .app_data(server_list_rate_limiter.clone())
            .app_data(proxies.clone())
            .configure(handlers::routes)
    })
        .bind(&bind)?
        .run().await
}
