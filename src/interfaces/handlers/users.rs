use actix_web::{get, post, web, HttpResponse, Responder};

use crate::{
    entities::user::{UpdateCreditsRequest, UserIdQuery},
    use_cases::extractors::AuthUser,
    AppState,
};

#[get("/sync-user")]
pub async fn get_synced_user(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    match state.user_handler.get_or_create_user(&user.0).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/sync-user")]
pub async fn sync_user(state: web::Data<AppState>, user: AuthUser) -> impl Responder {
    match state.user_handler.sync_user(&user.0).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[get("/user-credits")]
pub async fn get_user_credits(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<UserIdQuery>,
) -> impl Responder {
    match state.user_handler.get_credits(&user.0, query.into_inner().user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/user-credits")]
pub async fn update_user_credits(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<UpdateCreditsRequest>,
) -> impl Responder {
    match state.user_handler.update_credits(&user.0, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}
