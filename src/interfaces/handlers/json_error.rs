use actix_web::{http::StatusCode, HttpResponse};

/// JSON error body in the shape every endpoint uses.
pub fn json_error(status: StatusCode, error: &str, details: Option<&str>) -> HttpResponse {
    let body = match details {
        Some(details) => serde_json::json!({
            "error": error,
            "details": details
        }),
        None => serde_json::json!({ "error": error }),
    };
    HttpResponse::build(status).json(body)
}
