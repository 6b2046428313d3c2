use actix_web::{get, HttpResponse, Responder};

use crate::pricing::price_list;

/// Public price list: per-generation credit costs and purchasable packages.
#[get("/pricing")]
pub async fn pricing() -> impl Responder {
    HttpResponse::Ok().json(price_list())
}
