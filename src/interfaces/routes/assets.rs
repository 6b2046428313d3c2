use actix_web::web;

use crate::handlers::assets::{delete_saved_asset, download_asset, list_saved_assets, save_asset};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(save_asset)
        .service(list_saved_assets)
        .service(delete_saved_asset)
        .service(download_asset);
}
