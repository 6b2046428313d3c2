use actix_multipart::form::MultipartForm;
use actix_web::{post, web, HttpResponse, Responder};

use crate::{
    entities::generation::{
        GenerateAudioBody, ImageEditUpload, ImageGenerationUpload, MergeAudioVideoUpload, VideoGenerationUpload,
    },
    use_cases::extractors::AuthUser,
    AppState,
};

#[post("/generate")]
pub async fn generate_image(
    state: web::Data<AppState>,
    user: AuthUser,
    form: MultipartForm<ImageGenerationUpload>,
) -> impl Responder {
    match state.generation_handler.generate_image(&user.0, form.into_inner().into()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/edit")]
pub async fn edit_image(
    state: web::Data<AppState>,
    user: AuthUser,
    form: MultipartForm<ImageEditUpload>,
) -> impl Responder {
    match state.generation_handler.edit_image(&user.0, form.into_inner().into()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/generate-video")]
pub async fn generate_video(
    state: web::Data<AppState>,
    user: AuthUser,
    form: MultipartForm<VideoGenerationUpload>,
) -> impl Responder {
    match state.generation_handler.generate_video(&user.0, form.into_inner().into()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/generate-audio")]
pub async fn generate_audio(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<GenerateAudioBody>,
) -> impl Responder {
    match state.generation_handler.generate_audio(&user.0, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}

#[post("/merge-audio-video")]
pub async fn merge_audio_video(
    state: web::Data<AppState>,
    user: AuthUser,
    form: MultipartForm<MergeAudioVideoUpload>,
) -> impl Responder {
    match state.generation_handler.merge_audio_video(&user.0, form.into_inner().into()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.to_http_response(),
    }
}
