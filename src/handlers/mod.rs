pub mod index;
pub mod servers;

use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(index::health))
        .route("/api/servers", web::get().to(servers::get_servers));
}
