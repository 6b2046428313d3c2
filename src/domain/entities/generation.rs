use actix_multipart::form::{bytes::Bytes as MpBytes, text::Text, MultipartForm};
use bytes::Bytes;
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::not_blank;

pub const DEFAULT_VOICE: &str = "Rachel";
pub const DEFAULT_SPEECH_MODEL: &str = "eleven_multilingual_v2";

const VOICES: [(&str, &str); 9] = [
    ("Rachel", "21m00Tcm4TlvDq8ikWAM"),
    ("Drew", "29vD33N1CtxCmqQRPOHJ"),
    ("Clyde", "2EiwWnXFnvU5JabPnv8n"),
    ("Paul", "5Q0t7uMcjvnagumLfvZi"),
    ("Domi", "AZnzlk1XvdvUeBnXmlld"),
    ("Dave", "CYw3kZ02Hs0563khs1Fj"),
    ("Fin", "D38z5RcWu1voky8WS1ja"),
    ("Sarah", "EXAVITQu4vr4xnSDxMaL"),
    ("Antoni", "ErXwobaYiN019PkySvjV"),
];

/// Maps a voice name to its speech-provider id, falling back to Rachel.
pub fn voice_id(name: Option<&str>) -> &'static str {
    let lookup = |n: &str| VOICES.iter().find(|(voice, _)| *voice == n).map(|(_, id)| *id);
    name.and_then(lookup)
        .or_else(|| lookup(DEFAULT_VOICE))
        .unwrap_or("21m00Tcm4TlvDq8ikWAM")
}

/// A file received in a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Declared MIME type, or one sniffed from the content.
    pub fn mime_type(&self, fallback: &str) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .or_else(|| infer::get(&self.bytes).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub size: String,
    pub format: String,
    pub background: String,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageEditRequest {
    pub prompt: String,
    pub image: UploadedFile,
    pub mask: Option<UploadedFile>,
    pub size: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoGenerationRequest {
    pub prompt: String,
    pub duration: u32,
    /// Output resolution such as `720p`.
    pub quality: String,
    pub aspect_ratio: String,
    pub motion_mode: String,
    pub style: Option<String>,
    pub effect: Option<String>,
    /// Reference image as a data URL or remote URL.
    pub image: Option<String>,
}

impl VideoGenerationRequest {
    pub const DEFAULT_DURATION: u32 = 5;
    pub const DEFAULT_QUALITY: &'static str = "720p";
    pub const DEFAULT_MOTION_MODE: &'static str = "normal";
    pub const DEFAULT_ASPECT_RATIO: &'static str = "16:9";

    pub fn duration_key(&self) -> String {
        format!("{}s", self.duration)
    }

    /// Input document sent to the video model.
    pub fn model_input(&self) -> serde_json::Value {
        let mut input = serde_json::json!({
            "prompt": self.prompt,
            "quality": self.quality,
            "duration": self.duration,
            "aspect_ratio": self.aspect_ratio,
            "motion_mode": self.motion_mode,
        });
        if let Some(style) = &self.style {
            input["style"] = serde_json::Value::String(style.clone());
        }
        if let Some(effect) = &self.effect {
            input["effect"] = serde_json::Value::String(effect.clone());
        }
        if let Some(image) = &self.image {
            input["image"] = serde_json::Value::String(image.clone());
        }
        input
    }
}

/// Optional style or effect, dropped when empty or "None".
pub fn meaningful_option(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty() && v != "None")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: &'static str,
    pub model: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateAudioBody {
    #[validate(
        required(message = "Text is required"),
        custom(function = "not_blank", message = "Text is required")
    )]
    pub text: Option<String>,
    pub voice: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageResponse {
    pub url: String,
    pub generated_asset_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EditedImageResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideoResponse {
    pub video_url: String,
    pub generated_asset_id: Uuid,
    pub duration: u32,
    pub quality: String,
    pub aspect_ratio: String,
    pub motion_mode: String,
    pub style: Option<String>,
    pub effect: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAudioResponse {
    pub audio_data: String,
    /// Rough spoken length in seconds.
    pub duration: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedVideoResponse {
    pub video_data: String,
    pub message: String,
}

/// Fields of an image generation form as received.
#[derive(Debug, Default)]
pub struct ImageGenerationForm {
    pub prompt: Option<String>,
    pub size: Option<String>,
    pub format: Option<String>,
    pub background: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImageEditForm {
    pub prompt: Option<String>,
    pub image: Option<UploadedFile>,
    pub mask: Option<UploadedFile>,
    pub size: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Default)]
pub struct VideoGenerationForm {
    pub prompt: Option<String>,
    pub duration: Option<String>,
    pub quality: Option<String>,
    pub aspect_ratio: Option<String>,
    pub motion_mode: Option<String>,
    pub style: Option<String>,
    pub effect: Option<String>,
    /// Uploaded reference image; wins over `image_data`.
    pub product_image: Option<UploadedFile>,
    pub image_data: Option<String>,
}

#[derive(Debug, Default)]
pub struct MergeAudioVideoForm {
    pub video: Option<UploadedFile>,
    pub audio: Option<UploadedFile>,
}

impl From<MpBytes> for UploadedFile {
    fn from(part: MpBytes) -> Self {
        UploadedFile {
            file_name: part.file_name.unwrap_or_default(),
            content_type: part.content_type.map(|m| m.essence_str().to_string()),
            bytes: part.data,
        }
    }
}

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(Text::into_inner)
}

#[derive(Debug, MultipartForm)]
pub struct ImageGenerationUpload {
    pub prompt: Option<Text<String>>,
    pub size: Option<Text<String>>,
    pub format: Option<Text<String>>,
    pub background: Option<Text<String>>,
    pub quality: Option<Text<String>>,
}

impl From<ImageGenerationUpload> for ImageGenerationForm {
    fn from(upload: ImageGenerationUpload) -> Self {
        ImageGenerationForm {
            prompt: text(upload.prompt),
            size: text(upload.size),
            format: text(upload.format),
            background: text(upload.background),
            quality: text(upload.quality),
        }
    }
}

#[derive(Debug, MultipartForm)]
pub struct ImageEditUpload {
    pub prompt: Option<Text<String>>,
    #[multipart(limit = "50MB")]
    pub image: Option<MpBytes>,
    #[multipart(limit = "50MB")]
    pub mask: Option<MpBytes>,
    pub size: Option<Text<String>>,
    pub background: Option<Text<String>>,
}

impl From<ImageEditUpload> for ImageEditForm {
    fn from(upload: ImageEditUpload) -> Self {
        ImageEditForm {
            prompt: text(upload.prompt),
            image: upload.image.map(UploadedFile::from),
            mask: upload.mask.map(UploadedFile::from),
            size: text(upload.size),
            background: text(upload.background),
        }
    }
}

#[derive(Debug, MultipartForm)]
pub struct VideoGenerationUpload {
    pub prompt: Option<Text<String>>,
    pub duration: Option<Text<String>>,
    pub quality: Option<Text<String>>,
    #[multipart(rename = "aspectRatio")]
    pub aspect_ratio: Option<Text<String>>,
    #[multipart(rename = "motionMode")]
    pub motion_mode: Option<Text<String>>,
    pub style: Option<Text<String>>,
    pub effect: Option<Text<String>>,
    #[multipart(rename = "productImage", limit = "50MB")]
    pub product_image: Option<MpBytes>,
    #[multipart(rename = "imageData", limit = "50MB")]
    pub image_data: Option<Text<String>>,
}

impl From<VideoGenerationUpload> for VideoGenerationForm {
    fn from(upload: VideoGenerationUpload) -> Self {
        VideoGenerationForm {
            prompt: text(upload.prompt),
            duration: text(upload.duration),
            quality: text(upload.quality),
            aspect_ratio: text(upload.aspect_ratio),
            motion_mode: text(upload.motion_mode),
            style: text(upload.style),
            effect: text(upload.effect),
            product_image: upload.product_image.map(UploadedFile::from),
            image_data: text(upload.image_data),
        }
    }
}

#[derive(Debug, MultipartForm)]
pub struct MergeAudioVideoUpload {
    #[multipart(limit = "50MB")]
    pub video: Option<MpBytes>,
    #[multipart(limit = "50MB")]
    pub audio: Option<MpBytes>,
}

impl From<MergeAudioVideoUpload> for MergeAudioVideoForm {
    fn from(upload: MergeAudioVideoUpload) -> Self {
        MergeAudioVideoForm {
            video: upload.video.map(UploadedFile::from),
            audio: upload.audio.map(UploadedFile::from),
        }
    }
}

/// About fifteen characters are spoken per second.
pub fn estimate_speech_seconds(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(15)
}
