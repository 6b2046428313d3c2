use actix_web::{
    delete, get,
    http::header::{CacheControl, CacheDirective, ContentDisposition, DispositionParam, DispositionType},
    post, web, HttpResponse, Responder,
};

use crate::{
    entities::{
        saved_asset::{DeleteSavedAssetRequest, DownloadAssetQuery, SaveAssetRequest},
        user::UserIdQuery,
    },
    use_cases::extractors::AuthUser,
    AppState,
};

#[post("/save-asset")]
pub async fn save_asset(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<SaveAssetRequest>,
) -> impl Responder {
    match state.asset_handler.save_asset(&user.0, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[get("/saved-assets")]
pub async fn list_saved_assets(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<UserIdQuery>,
) -> impl Responder {
    match state.asset_handler.list_saved_assets(&user.0, query.into_inner().user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[delete("/saved-assets")]
pub async fn delete_saved_asset(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<DeleteSavedAssetRequest>,
) -> impl Responder {
    match state.asset_handler.delete_saved_asset(&user.0, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[get("/download-asset")]
pub async fn download_asset(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<DownloadAssetQuery>,
) -> impl Responder {
    match state.asset_handler.download_asset(&user.0, query.into_inner()).await {
        Ok(download) => HttpResponse::Ok()
            .content_type(download.content_type)
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(download.file_name)],
            })
            .insert_header(CacheControl(vec![CacheDirective::NoCache]))
            .body(download.bytes),
        Err(e) => e.to_http_response(),
    }
}

/// Serves files written by the local store.
#[get("/uploads/{asset_type}/{file_name}")]
pub async fn serve_upload(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (folder, file_name) = path.into_inner();
    match state.asset_handler.read_upload(&folder, &file_name).await {
        Ok((bytes, content_type)) => HttpResponse::Ok()
            .content_type(content_type)
            .insert_header(CacheControl(vec![CacheDirective::Public, CacheDirective::MaxAge(3600)]))
            .body(bytes),
        Err(e) => e.to_http_response(),
    }
}
