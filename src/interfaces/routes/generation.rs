use actix_web::web;

use crate::handlers::generation::{edit_image, generate_audio, generate_image, generate_video, merge_audio_video};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_image)
        .service(edit_image)
        .service(generate_video)
        .service(generate_audio)
        .service(merge_audio_video);
}
