use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use zeroize::Zeroizing;

use super::{error_from_response, SpeechSynthesizer};
use crate::entities::generation::SpeechRequest;
use crate::errors::{Provider, ProviderError};

pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: Zeroizing<String>,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: Zeroizing::new(api_key.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Bytes, ProviderError> {
        let transport = |e: reqwest::Error| ProviderError::from_transport(Provider::ElevenLabs, &e);

        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, request.voice_id))
            .header(ACCEPT, "audio/mpeg")
            .header("xi-api-key", self.api_key.as_str())
            .json(&serde_json::json!({
                "text": request.text,
                "model_id": request.model,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.8,
                    "style": 0.0,
                    "use_speaker_boost": true,
                },
            }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(Provider::ElevenLabs, response).await);
        }

        response.bytes().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderErrorKind;
    use actix_web::{post, web, App, HttpRequest, HttpResponse, HttpServer};
    use std::net::TcpListener;

    #[post("/v1/text-to-speech/{voice}")]
    async fn tts(req: HttpRequest, voice: web::Path<String>, body: web::Json<serde_json::Value>) -> HttpResponse {
        if req.headers().get("xi-api-key").and_then(|v| v.to_str().ok()) != Some("xi-good") {
            return HttpResponse::Unauthorized()
                .json(serde_json::json!({ "detail": { "status": "invalid_api_key", "message": "Invalid API key" } }));
        }
        let echo = format!(
            "{}|{}|{}",
            voice.into_inner(),
            body["model_id"].as_str().unwrap_or_default(),
            body["voice_settings"]["similarity_boost"]
        );
        HttpResponse::Ok().content_type("audio/mpeg").body(echo)
    }

    fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let server = HttpServer::new(|| App::new().service(tts)).listen(listener).unwrap().workers(1).run();
        actix_rt::spawn(server);
        address
    }

    fn request() -> SpeechRequest {
        SpeechRequest {
            text: "Fresh kicks".into(),
            voice_id: "AZnzlk1XvdvUeBnXmlld",
            model: "eleven_multilingual_v2".into(),
        }
    }

    #[actix_rt::test]
    async fn synthesis_posts_to_the_voice() {
        let client = ElevenLabsClient::new("xi-good", &spawn_server());

        let audio = client.synthesize(&request()).await.unwrap();

        assert_eq!(&audio[..], b"AZnzlk1XvdvUeBnXmlld|eleven_multilingual_v2|0.8");
    }

    #[actix_rt::test]
    async fn rejected_key_is_an_auth_error() {
        let client = ElevenLabsClient::new("xi-bad", &spawn_server());

        let err = client.synthesize(&request()).await.unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Auth);
        assert!(err.message.contains("Invalid API key"));
    }
}
