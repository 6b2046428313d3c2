use std::borrow::Cow;
use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use jsonwebtoken::errors::{ErrorKind, Error as JwtError};
use derive_more::Display;
use validator::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    ValidationError(Vec<FieldError>),
    NotFound(String),
    Conflict(String),
    /// A saved copy already exists; the existing record is echoed back.
    AlreadySaved(serde_json::Value),
    StillGenerating,
    InsufficientCredits { required: i32, available: i32 },
    UnauthorizedAccess,
    ForbiddenAccess(String),
    NotConfigured(String),
    Upstream { source: ProviderError, fallback: &'static str },
    InternalError { error: String, details: Option<String> },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::ValidationError(errors) => {
                let mut messages: Vec<&str> = Vec::new();
                for e in errors {
                    if !messages.contains(&e.message.as_str()) {
                        messages.push(&e.message);
                    }
                }
                write!(f, "{}", messages.join("; "))
            }
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::AlreadySaved(_) => write!(f, "Asset is already saved"),
            AppError::StillGenerating => {
                write!(f, "Asset is still being generated, please try again in a moment")
            }
            AppError::InsufficientCredits { required, available } => write!(
                f,
                "Insufficient credits: {} required, {} available",
                required, available
            ),
            AppError::UnauthorizedAccess => write!(f, "Unauthorized"),
            AppError::ForbiddenAccess(msg) => write!(f, "{}", msg),
            AppError::NotConfigured(msg) => write!(f, "{}", msg),
            AppError::Upstream { source, fallback } => write!(f, "{}", source.user_message(fallback)),
            AppError::InternalError { error, .. } => write!(f, "{}", error),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::AlreadySaved(existing) => {
                serde_json::json!({
                    "error": self.to_string(),
                    "savedAsset": existing
                })
            }
            AppError::InternalError { error, details: Some(details) } => {
                serde_json::json!({
                    "error": error,
                    "details": details
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AlreadySaved(_) => StatusCode::CONFLICT,
            AppError::StillGenerating => StatusCode::ACCEPTED,
            AppError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenAccess(_) => StatusCode::FORBIDDEN,
            AppError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { source, .. } => source.kind.status_code(),
            AppError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn internal(error: impl Into<String>) -> Self {
        AppError::InternalError { error: error.into(), details: None }
    }

    /// Wraps a provider failure for one endpoint. Kinds outside `surfaced`
    /// are reported as that endpoint's generic failure.
    pub fn upstream(source: ProviderError, fallback: &'static str, surfaced: &[ProviderErrorKind]) -> Self {
        AppError::Upstream { source: source.narrowed(surfaced), fallback }
    }

    /// Replaces the headline of an internal error with an operation-level
    /// message, keeping the underlying cause as `details`.
    pub fn in_context(self, message: &str) -> Self {
        match self {
            AppError::InternalError { error, details } => AppError::InternalError {
                error: message.to_string(),
                details: Some(details.unwrap_or(error)),
            },
            other => other,
        }
    }

    /// Logs the failure and renders it as the endpoint's JSON error.
    pub fn to_http_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::InternalError { error, details } => {
                tracing::error!(status = status.as_u16(), %error, details = ?details, "Request failed");
            }
            AppError::Upstream { source, .. } => {
                tracing::error!(status = status.as_u16(), provider = %source.provider, kind = %source.kind, message = %source.message, "Provider call failed");
            }
            _ if status.is_server_error() => tracing::error!(status = status.as_u16(), error = %self, "Request failed"),
            _ => tracing::debug!(status = status.as_u16(), error = %self, "Request rejected"),
        }
        self.error_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23505")) => {
                AppError::Conflict("Database conflict occurred".into())
            }
            sqlx::Error::Database(e) if e.code() == Some(Cow::Borrowed("23503")) => {
                AppError::Conflict("Foreign key violation".into())
            }
            _ => AppError::InternalError {
                error: "Database error".into(),
                details: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();

        // missing fields are reported ahead of malformed ones
        field_errors.sort_by(|a, b| {
            (a.code != "required", &a.field).cmp(&(b.code != "required", &b.field))
        });

        AppError::ValidationError(field_errors)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("Asset not found: {}", path)),
            StorageError::InvalidSource(msg) => AppError::BadRequest(msg),
            other => AppError::InternalError {
                error: "Storage error".into(),
                details: Some(other.to_string()),
            },
        }
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("Unauthorized")]
    MissingCredentials,

    #[display("Invalid token")]
    InvalidToken,

    #[display("Token expired")]
    TokenExpired,

    #[display("Forbidden: {_0}")]
    Forbidden(String),
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_message = match self {
            AuthError::TokenExpired => "Token has expired".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({"error": error_message}))
    }
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(msg) => AppError::ForbiddenAccess(msg),
            _ => AppError::UnauthorizedAccess,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Provider {
    #[display("OpenAI")]
    OpenAi,
    #[display("Replicate")]
    Replicate,
    #[display("ElevenLabs")]
    ElevenLabs,
}

impl Provider {
    fn credential_name(&self) -> &'static str {
        match self {
            Provider::Replicate => "API token",
            _ => "API key",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProviderErrorKind {
    #[display("connectivity")]
    Connectivity,
    #[display("auth")]
    Auth,
    #[display("quota")]
    Quota,
    #[display("invalid_image")]
    InvalidImage,
    #[display("timeout")]
    Timeout,
    #[display("upstream")]
    Upstream,
}

impl ProviderErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProviderErrorKind::Connectivity => StatusCode::SERVICE_UNAVAILABLE,
            ProviderErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ProviderErrorKind::Quota => StatusCode::TOO_MANY_REQUESTS,
            ProviderErrorKind::InvalidImage => StatusCode::BAD_REQUEST,
            ProviderErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            ProviderErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fallback classification for errors that only carry free text.
    pub fn from_message(message: &str) -> Self {
        const CONNECTIVITY: [&str; 4] = ["socket hang up", "Connection error", "ECONNRESET", "ETIMEDOUT"];
        const AUTH: [&str; 3] = ["API key", "API token", "invalid_api_key"];

        if CONNECTIVITY.iter().any(|p| message.contains(p)) {
            ProviderErrorKind::Connectivity
        } else if AUTH.iter().any(|p| message.contains(p)) {
            ProviderErrorKind::Auth
        } else if message.contains("quota") || message.contains("billing") {
            ProviderErrorKind::Quota
        } else if message.contains("mask") || message.contains("dimensions") {
            ProviderErrorKind::InvalidImage
        } else if message.contains("timeout") {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Upstream
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderErrorKind::Auth,
            429 => ProviderErrorKind::Quota,
            408 | 504 => ProviderErrorKind::Timeout,
            502 | 503 => ProviderErrorKind::Connectivity,
            _ => Self::from_message(body),
        }
    }
}

/// Failure reported by an external generation provider.
#[derive(Debug, Clone, Display)]
#[display("{provider} {kind} error: {message}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        ProviderError { provider, kind, message: message.into() }
    }

    pub fn from_message(provider: Provider, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = ProviderErrorKind::from_message(&message);
        ProviderError { provider, kind, message }
    }

    pub fn from_status(provider: Provider, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let kind = ProviderErrorKind::from_status(status, &body);
        ProviderError {
            provider,
            kind,
            message: format!("{} API error: {} {}", provider, status, body),
        }
    }

    pub fn from_transport(provider: Provider, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            ProviderErrorKind::Connectivity
        } else if let Some(status) = err.status() {
            ProviderErrorKind::from_status(status.as_u16(), &err.to_string())
        } else {
            ProviderErrorKind::from_message(&err.to_string())
        };
        ProviderError { provider, kind, message: err.to_string() }
    }

    /// Demotes kinds the calling endpoint does not report to `Upstream`.
    pub fn narrowed(self, surfaced: &[ProviderErrorKind]) -> Self {
        if self.kind == ProviderErrorKind::Upstream || surfaced.contains(&self.kind) {
            return self;
        }
        ProviderError { kind: ProviderErrorKind::Upstream, ..self }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ProviderErrorKind::Connectivity
    }

    pub fn user_message(&self, fallback: &str) -> String {
        let p = self.provider;
        match self.kind {
            ProviderErrorKind::Connectivity => format!(
                "Unable to connect to {} API. Please check your internet connection and try again.",
                p
            ),
            ProviderErrorKind::Auth => format!(
                "Invalid {} {}. Please check your configuration.",
                p,
                p.credential_name()
            ),
            ProviderErrorKind::Quota => {
                format!("{} API quota exceeded. Please check your billing settings.", p)
            }
            ProviderErrorKind::InvalidImage => {
                "Invalid mask or image dimensions. Please ensure the mask matches the image size.".into()
            }
            ProviderErrorKind::Timeout => {
                "Video generation timed out. Please try again with a shorter duration.".into()
            }
            ProviderErrorKind::Upstream => fallback.to_string(),
        }
    }
}

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Object not found: {_0}")]
    NotFound(String),

    #[display("I/O error: {_0}")]
    Io(String),

    #[display("Invalid asset source: {_0}")]
    InvalidSource(String),

    #[display("Failed to fetch asset: {_0}")]
    Fetch(String),

    #[display("Storage backend error: {_0}")]
    Backend(String),
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            _ => StorageError::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_classification_follows_precedence() {
        use ProviderErrorKind::*;

        assert_eq!(ProviderErrorKind::from_message("read ECONNRESET"), Connectivity);
        assert_eq!(ProviderErrorKind::from_message("socket hang up"), Connectivity);
        assert_eq!(ProviderErrorKind::from_message("Incorrect API key provided"), Auth);
        assert_eq!(ProviderErrorKind::from_message("code: invalid_api_key"), Auth);
        assert_eq!(ProviderErrorKind::from_message("You exceeded your current quota"), Quota);
        assert_eq!(ProviderErrorKind::from_message("mask size does not match"), InvalidImage);
        assert_eq!(ProviderErrorKind::from_message("prediction timeout"), Timeout);
        assert_eq!(ProviderErrorKind::from_message("something else"), Upstream);
        // connectivity wins over anything that follows it
        assert_eq!(ProviderErrorKind::from_message("Connection error during quota check"), Connectivity);
    }

    #[test]
    fn status_classification_prefers_status_over_body() {
        use ProviderErrorKind::*;

        assert_eq!(ProviderErrorKind::from_status(401, "quota"), Auth);
        assert_eq!(ProviderErrorKind::from_status(429, ""), Quota);
        assert_eq!(ProviderErrorKind::from_status(503, ""), Connectivity);
        assert_eq!(ProviderErrorKind::from_status(504, ""), Timeout);
        assert_eq!(ProviderErrorKind::from_status(400, "bad request"), Upstream);
        assert_eq!(ProviderErrorKind::from_status(400, "image dimensions mismatch"), InvalidImage);
    }

    #[test]
    fn user_messages_name_the_provider() {
        let err = ProviderError::new(Provider::Replicate, ProviderErrorKind::Auth, "401");
        assert_eq!(
            err.user_message("unused"),
            "Invalid Replicate API token. Please check your configuration."
        );

        let err = ProviderError::new(Provider::OpenAi, ProviderErrorKind::Connectivity, "x");
        assert_eq!(
            err.user_message("unused"),
            "Unable to connect to OpenAI API. Please check your internet connection and try again."
        );

        let err = ProviderError::new(Provider::ElevenLabs, ProviderErrorKind::Upstream, "boom");
        assert_eq!(
            err.user_message("Failed to generate audio. Please try again later."),
            "Failed to generate audio. Please try again later."
        );
    }

    #[test]
    fn upstream_errors_map_to_kind_status() {
        let err = AppError::upstream(
            ProviderError::new(Provider::OpenAi, ProviderErrorKind::Quota, "quota"),
            "Failed to generate image. Please try again later.",
            &[ProviderErrorKind::Quota],
        );
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            err.to_string(),
            "OpenAI API quota exceeded. Please check your billing settings."
        );
    }

    #[test]
    fn kinds_outside_the_endpoint_fall_back_to_its_generic_failure() {
        let timeout = ProviderError::from_status(Provider::OpenAi, 500, "upstream request timeout");
        assert_eq!(timeout.kind, ProviderErrorKind::Timeout);

        let err = AppError::upstream(
            timeout.clone(),
            "Failed to generate image. Please try again later.",
            &[ProviderErrorKind::Connectivity, ProviderErrorKind::Auth, ProviderErrorKind::Quota],
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to generate image. Please try again later.");

        let err = AppError::upstream(timeout, "unused", &[ProviderErrorKind::Timeout]);
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn validation_errors_report_missing_fields_first() {
        let mut errors = ValidationErrors::new();
        let mut range = validator::ValidationError::new("range");
        range.message = Some(Cow::Borrowed("Credits must be a positive number"));
        errors.add("credits", range);
        let mut required = validator::ValidationError::new("required");
        required.message = Some(Cow::Borrowed("Missing required fields: credits, action"));
        errors.add("action", required.clone());
        errors.add("userId", required);

        let err = AppError::from(errors);

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Missing required fields: credits, action; Credits must be a positive number"
        );
    }

    #[test]
    fn in_context_keeps_cause_as_details() {
        let err = AppError::internal("connection refused").in_context("Failed to save asset");
        match err {
            AppError::InternalError { error, details } => {
                assert_eq!(error, "Failed to save asset");
                assert_eq!(details.as_deref(), Some("connection refused"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = AppError::NotFound("Saved asset not found".into()).in_context("ignored");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
