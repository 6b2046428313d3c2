use actix_web::web;

use crate::handlers::{assets::serve_upload, home::home, pricing::pricing, system::health_check};

mod assets;
mod generation;
mod users;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(health_check)
        .service(serve_upload);

    cfg.service(
        web::scope("/api")
            .service(pricing)
            .configure(generation::config_routes)
            .configure(assets::config_routes)
            .configure(users::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
