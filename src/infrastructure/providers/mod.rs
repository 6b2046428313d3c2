//! Adapters for the external generation APIs.

pub mod elevenlabs;
pub mod openai;
pub mod replicate;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

use crate::entities::generation::{ImageEditRequest, ImageGenerationRequest, SpeechRequest, VideoGenerationRequest};
use crate::errors::{Provider, ProviderError};
use crate::settings::AppConfig;

/// Image generation and masked editing. Both return base64 image data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<String, ProviderError>;
    async fn edit(&self, request: &ImageEditRequest) -> Result<String, ProviderError>;
}

/// Text or image to video. Returns the URL of the rendered video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate(&self, request: &VideoGenerationRequest) -> Result<String, ProviderError>;
}

/// Text to speech. Returns MPEG audio.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Bytes, ProviderError>;
}

/// Provider clients built at startup. A missing credential leaves the slot
/// empty and the matching endpoints fail closed.
#[derive(Clone, Default)]
pub struct Providers {
    pub images: Option<Arc<dyn ImageGenerator>>,
    pub video: Option<Arc<dyn VideoGenerator>>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Providers {
    pub fn from_config(config: &AppConfig) -> Self {
        let images = config.openai_api_key.as_ref().map(|key| {
            Arc::new(openai::OpenAiClient::new(key, &config.openai_base_url)) as Arc<dyn ImageGenerator>
        });
        let video = config.replicate_api_token.as_ref().map(|token| {
            Arc::new(replicate::ReplicateClient::new(
                token,
                &config.replicate_base_url,
                config.video_timeout(),
            )) as Arc<dyn VideoGenerator>
        });
        let speech = config.elevenlabs_api_key.as_ref().map(|key| {
            Arc::new(elevenlabs::ElevenLabsClient::new(key, &config.elevenlabs_base_url)) as Arc<dyn SpeechSynthesizer>
        });

        let providers = Providers { images, video, speech };
        providers.log_configuration();
        providers
    }

    fn log_configuration(&self) {
        for (provider, configured) in self.configured() {
            if configured {
                info!(%provider, "Provider configured");
            } else {
                warn!(%provider, "Provider credential missing, endpoints will fail closed");
            }
        }
    }

    pub fn configured(&self) -> [(Provider, bool); 3] {
        [
            (Provider::OpenAi, self.images.is_some()),
            (Provider::Replicate, self.video.is_some()),
            (Provider::ElevenLabs, self.speech.is_some()),
        ]
    }
}

/// Turns a non-success response into a classified provider error, using
/// the provider's error message when the body carries one.
pub(crate) async fn error_from_response(provider: Provider, response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body).unwrap_or(body);
    ProviderError::from_status(provider, status, message)
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.pointer("/error/message"),
        value.pointer("/detail/message"),
        value.get("detail"),
        value.get("error"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
}
