use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{Algorithm, DecodingKey};
use std::{env, fmt, str::FromStr, time::Duration};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// HS256 shared secret used to verify identity-provider session tokens.
    #[serde(default)]
    pub identity_jwt_secret: Option<String>,

    /// RS256 PEM public key used to verify identity-provider session tokens.
    /// Takes precedence over the shared secret when both are set.
    #[serde(default)]
    pub identity_jwt_public_key: Option<String>,

    #[serde(default)]
    pub identity_issuer: Option<String>,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default)]
    pub replicate_api_token: Option<String>,

    #[serde(default = "default_replicate_base_url")]
    pub replicate_base_url: String,

    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,

    #[serde(default = "default_elevenlabs_base_url")]
    pub elevenlabs_base_url: String,

    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    #[serde(default)]
    pub aws_region: Option<String>,

    #[serde(default)]
    pub aws_bucket_name: Option<String>,

    #[serde(default = "default_local_upload_dir")]
    pub local_upload_dir: String,

    #[serde(default = "default_retry_max_retries")]
    pub retry_max_retries: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_asset_fetch_timeout_secs")]
    pub asset_fetch_timeout_secs: u64,

    #[serde(default = "default_video_timeout_secs")]
    pub video_timeout_secs: u64,

    #[serde(default = "default_user_credits")]
    pub default_user_credits: i32,

    #[serde(default)]
    pub enforce_credit_balance: bool,

    #[serde(default)]
    pub purge_deleted_assets: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Adlume-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_connections() -> u32 {
    20
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_replicate_base_url() -> String {
    "https://api.replicate.com".to_string()
}
fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}
fn default_local_upload_dir() -> String {
    "public/uploads".to_string()
}
fn default_retry_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    1000
}
fn default_asset_fetch_timeout_secs() -> u64 {
    30
}
fn default_video_timeout_secs() -> u64 {
    600
}
fn default_user_credits() -> i32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            database_url: String::new(),
            database_max_connections: default_max_connections(),
            cors_allowed_origins: default_cors_origins(),
            log_format: LogFormat::default(),
            identity_jwt_secret: None,
            identity_jwt_public_key: None,
            identity_issuer: None,
            openai_api_key: None,
            openai_base_url: default_openai_base_url(),
            replicate_api_token: None,
            replicate_base_url: default_replicate_base_url(),
            elevenlabs_api_key: None,
            elevenlabs_base_url: default_elevenlabs_base_url(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: None,
            aws_bucket_name: None,
            local_upload_dir: default_local_upload_dir(),
            retry_max_retries: default_retry_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            asset_fetch_timeout_secs: default_asset_fetch_timeout_secs(),
            video_timeout_secs: default_video_timeout_secs(),
            default_user_credits: default_user_credits(),
            enforce_credit_balance: false,
            purge_deleted_assets: false,
        }
    }
}

/// Object storage credentials, only produced when every field is present.
#[derive(Clone)]
pub struct S3Settings {
    pub access_key_id: Zeroizing<String>,
    pub secret_access_key: Zeroizing<String>,
    pub region: String,
    pub bucket: String,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins"),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Conventional unprefixed names are honoured as a fallback
        config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;
        config.openai_api_key = config.openai_api_key.or_else(|| non_empty_env("OPENAI_API_KEY"));
        config.replicate_api_token = config.replicate_api_token.or_else(|| non_empty_env("REPLICATE_API_TOKEN"));
        config.elevenlabs_api_key = config.elevenlabs_api_key.or_else(|| non_empty_env("ELEVENLABS_API_KEY"));
        config.aws_access_key_id = config.aws_access_key_id.or_else(|| non_empty_env("AWS_ACCESS_KEY_ID"));
        config.aws_secret_access_key = config.aws_secret_access_key.or_else(|| non_empty_env("AWS_SECRET_ACCESS_KEY"));
        config.aws_region = config.aws_region.or_else(|| non_empty_env("AWS_REGION"));
        config.aws_bucket_name = config.aws_bucket_name.or_else(|| non_empty_env("AWS_BUCKET_NAME"));

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.identity_jwt_public_key.is_none() && self.identity_jwt_secret.is_none() {
            errors.push("IDENTITY_JWT_PUBLIC_KEY or IDENTITY_JWT_SECRET must be set");
        }
        if self.identity_jwt_public_key.is_none()
            && self.identity_jwt_secret.as_ref().is_some_and(|s| s.len() < 32)
        {
            errors.push("IDENTITY_JWT_SECRET must be at least 32 characters");
        }
        if self.default_user_credits < 0 {
            errors.push("DEFAULT_USER_CREDITS cannot be negative");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns object storage settings only when access key, secret key,
    /// region and bucket are all present.
    pub fn s3_settings(&self) -> Option<S3Settings> {
        let present = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        Some(S3Settings {
            access_key_id: Zeroizing::new(present(&self.aws_access_key_id)?),
            secret_access_key: Zeroizing::new(present(&self.aws_secret_access_key)?),
            region: present(&self.aws_region)?,
            bucket: present(&self.aws_bucket_name)?,
        })
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn asset_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_fetch_timeout_secs)
    }

    pub fn video_timeout(&self) -> Duration {
        Duration::from_secs(self.video_timeout_secs)
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &'static str;
}

impl Redact for str {
    fn redact(&self) -> &'static str {
        if self.is_empty() { "[MISSING]" } else { "[REDACTED]" }
    }
}

impl Redact for String {
    fn redact(&self) -> &'static str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &'static str {
        match self {
            Some(value) => value.redact(),
            None => "[MISSING]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("log_format", &self.log_format)
            .field("identity_jwt_secret", &self.identity_jwt_secret.redact())
            .field("identity_jwt_public_key", &self.identity_jwt_public_key.redact())
            .field("identity_issuer", &self.identity_issuer)
            .field("openai_api_key", &self.openai_api_key.redact())
            .field("replicate_api_token", &self.replicate_api_token.redact())
            .field("elevenlabs_api_key", &self.elevenlabs_api_key.redact())
            .field("aws_access_key_id", &self.aws_access_key_id.redact())
            .field("aws_secret_access_key", &self.aws_secret_access_key.redact())
            .field("aws_region", &self.aws_region)
            .field("aws_bucket_name", &self.aws_bucket_name)
            .field("local_upload_dir", &self.local_upload_dir)
            .field("retry_max_retries", &self.retry_max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("default_user_credits", &self.default_user_credits)
            .field("enforce_credit_balance", &self.enforce_credit_balance)
            .field("purge_deleted_assets", &self.purge_deleted_assets)
            .finish()
    }
}

/// Key material for verifying identity-provider session tokens.
#[derive(Clone)]
pub struct IdentityKeys {
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub issuer: Option<String>,
}

impl TryFrom<&AppConfig> for IdentityKeys {
    type Error = ConfigError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        let issuer = config.identity_issuer.clone();

        if let Some(pem) = &config.identity_jwt_public_key {
            let pem = Zeroizing::new(pem.replace("\\n", "\n"));
            let decoding = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| ConfigError::Message(format!("Invalid IDENTITY_JWT_PUBLIC_KEY: {e}")))?;
            return Ok(IdentityKeys { decoding, algorithm: Algorithm::RS256, issuer });
        }

        let secret = config
            .identity_jwt_secret
            .as_ref()
            .map(|s| Zeroizing::new(s.clone()))
            .ok_or_else(|| ConfigError::Message("No identity verification key configured".into()))?;

        Ok(IdentityKeys {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            issuer,
        })
    }
}

impl fmt::Debug for IdentityKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKeys")
            .field("decoding", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .finish()
    }
}
