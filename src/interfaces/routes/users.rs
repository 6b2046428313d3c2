use actix_web::web;

use crate::handlers::{
    dashboard::dashboard_stats,
    users::{get_synced_user, get_user_credits, sync_user, update_user_credits},
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_synced_user)
        .service(sync_user)
        .service(get_user_credits)
        .service(update_user_credits)
        .service(dashboard_stats);
}
