use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{error_from_response, ImageGenerator};
use crate::entities::generation::{ImageEditRequest, ImageGenerationRequest, UploadedFile};
use crate::errors::{Provider, ProviderError, ProviderErrorKind};

const MODEL: &str = "gpt-image-1";

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Zeroizing<String>,
    base_url: String,
}

#[derive(Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    output_format: &'a str,
    background: &'a str,
    n: u8,
    output_compression: u8,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: Zeroizing::new(api_key.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn transport(e: reqwest::Error) -> ProviderError {
        ProviderError::from_transport(Provider::OpenAi, &e)
    }

    async fn read_image(response: reqwest::Response) -> Result<String, ProviderError> {
        if !response.status().is_success() {
            return Err(error_from_response(Provider::OpenAi, response).await);
        }

        let body: ImagesResponse = response.json().await.map_err(Self::transport)?;
        body.data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| {
                ProviderError::new(
                    Provider::OpenAi,
                    ProviderErrorKind::Upstream,
                    "No image data received from OpenAI",
                )
            })
    }

    fn file_part(file: &UploadedFile, fallback_name: &str) -> Result<Part, ProviderError> {
        let name = if file.file_name.is_empty() { fallback_name.to_string() } else { file.file_name.clone() };
        Part::bytes(file.bytes.to_vec())
            .file_name(name)
            .mime_str(&file.mime_type("image/png"))
            .map_err(Self::transport)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, request: &ImageGenerationRequest) -> Result<String, ProviderError> {
        let body = GenerationBody {
            model: MODEL,
            prompt: &request.prompt,
            size: &request.size,
            output_format: &request.format,
            background: &request.background,
            n: 1,
            output_compression: 100,
            quality: &request.quality,
        };

        let response = self
            .http
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::read_image(response).await
    }

    async fn edit(&self, request: &ImageEditRequest) -> Result<String, ProviderError> {
        let mut form = Form::new()
            .text("model", MODEL)
            .text("prompt", request.prompt.clone())
            .text("n", "1")
            .text("quality", "high")
            .part("image", Self::file_part(&request.image, "image.png")?);

        if let Some(size) = &request.size {
            form = form.text("size", size.clone());
        }
        if let Some(background) = &request.background {
            form = form.text("background", background.clone());
        }
        if let Some(mask) = &request.mask {
            form = form.part("mask", Self::file_part(mask, "mask.png")?);
        }

        let response = self
            .http
            .post(format!("{}/v1/images/edits", self.base_url))
            .bearer_auth(self.api_key.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::read_image(response).await
    }
}
