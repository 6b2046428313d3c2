use actix_web::{get, web, HttpResponse, Responder};

use crate::{entities::user::UserIdQuery, use_cases::extractors::AuthUser, AppState};

#[get("/dashboard-stats")]
pub async fn dashboard_stats(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<UserIdQuery>,
) -> impl Responder {
    match state.dashboard_handler.get_stats(&user.0, query.into_inner().user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}
