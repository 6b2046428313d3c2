use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{error, info, instrument};
use validator::Validate;

use crate::{
    entities::{
        generated_asset::{AssetType, NewGeneratedAsset, RecordedGeneration},
        generation::{
            estimate_speech_seconds, meaningful_option, voice_id, EditedImageResponse, GenerateAudioBody,
            GeneratedAudioResponse, GeneratedImageResponse, GeneratedVideoResponse, ImageEditForm,
            ImageEditRequest, ImageGenerationForm, ImageGenerationRequest, MergeAudioVideoForm,
            MergedVideoResponse, SpeechRequest, VideoGenerationForm, VideoGenerationRequest, DEFAULT_SPEECH_MODEL,
        },
        user::{Identity, NewUser},
    },
    errors::{AppError, ProviderErrorKind},
    infrastructure::{providers::Providers, retry::RetryPolicy, storage::data_url::to_data_url},
    pricing::{image_credits, video_credits},
    shared_repos::SharedRepositories,
    use_cases::present,
};

const IMAGE_FAILURE: &str = "Failed to generate image. Please try again later.";
const EDIT_FAILURE: &str = "Failed to edit image. Please try again later.";
const VIDEO_FAILURE: &str = "Failed to generate video. Please try again later.";
const AUDIO_FAILURE: &str = "Failed to generate audio. Please try again later.";

use ProviderErrorKind::{Auth, Connectivity, InvalidImage, Quota, Timeout};

/// Provider failure kinds each endpoint reports; anything else becomes its generic failure.
const IMAGE_KINDS: &[ProviderErrorKind] = &[Connectivity, Auth, Quota];
const EDIT_KINDS: &[ProviderErrorKind] = &[Connectivity, Auth, Quota, InvalidImage];
const VIDEO_KINDS: &[ProviderErrorKind] = &[Connectivity, Auth, Quota, Timeout];
const AUDIO_KINDS: &[ProviderErrorKind] = &[Connectivity, Auth, Quota];

const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
const DEFAULT_IMAGE_FORMAT: &str = "png";
const DEFAULT_IMAGE_BACKGROUND: &str = "auto";
const DEFAULT_IMAGE_QUALITY: &str = "high";

pub struct GenerationHandler {
    pub repos: SharedRepositories,
    pub providers: Providers,
    pub retry: RetryPolicy,
    pub default_credits: i32,
    pub enforce_credit_balance: bool,
}

impl GenerationHandler {
    pub fn new(
        repos: SharedRepositories,
        providers: Providers,
        retry: RetryPolicy,
        default_credits: i32,
        enforce_credit_balance: bool,
    ) -> Self {
        GenerationHandler { repos, providers, retry, default_credits, enforce_credit_balance }
    }

    #[instrument(skip(self, form), fields(user_id = %identity.id))]
    pub async fn generate_image(
        &self,
        identity: &Identity,
        form: ImageGenerationForm,
    ) -> Result<GeneratedImageResponse, AppError> {
        let prompt = present(form.prompt).ok_or_else(|| AppError::BadRequest("Prompt is required".into()))?;

        let images = self.providers.images.as_ref()
            .ok_or_else(|| not_configured("OpenAI API key"))?;

        let request = ImageGenerationRequest {
            prompt,
            size: present(form.size).unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            format: present(form.format).unwrap_or_else(|| DEFAULT_IMAGE_FORMAT.to_string()),
            background: present(form.background).unwrap_or_else(|| DEFAULT_IMAGE_BACKGROUND.to_string()),
            quality: present(form.quality).unwrap_or_else(|| DEFAULT_IMAGE_QUALITY.to_string()),
        };

        let cost = image_credits(&request.quality, &request.size)
            .ok_or_else(|| AppError::BadRequest("Invalid quality or size configuration".into()))?;
        self.check_balance(identity, cost).await?;

        let images = images.as_ref();
        let req = &request;
        let b64 = self.retry
            .run("openai.images.generate", move || images.generate(req))
            .await
            .map_err(|e| {
                error!(error = %e, kind = ?e.kind, "Image generation failed");
                AppError::upstream(e, IMAGE_FAILURE, IMAGE_KINDS)
            })?;

        let url = format!("data:image/{};base64,{}", request.format, b64);
        let recorded = self.record(identity, AssetType::Image, &request.prompt, url.clone(), cost).await?;

        Ok(GeneratedImageResponse { url, generated_asset_id: recorded.asset.id })
    }

    /// Masked or unmasked edit of an uploaded image. Edits are not charged.
    #[instrument(skip(self, form), fields(user_id = %identity.id))]
    pub async fn edit_image(&self, identity: &Identity, form: ImageEditForm) -> Result<EditedImageResponse, AppError> {
        let prompt = present(form.prompt).ok_or_else(|| AppError::BadRequest("Prompt is required".into()))?;
        let image = form.image
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("Image is required".into()))?;

        let images = self.providers.images.as_ref()
            .ok_or_else(|| not_configured("OpenAI API key"))?;

        let request = ImageEditRequest {
            prompt,
            image,
            mask: form.mask.filter(|m| !m.bytes.is_empty()),
            size: present(form.size),
            background: present(form.background),
        };

        let images = images.as_ref();
        let req = &request;
        let b64 = self.retry
            .run("openai.images.edit", move || images.edit(req))
            .await
            .map_err(|e| {
                error!(error = %e, kind = ?e.kind, "Image edit failed");
                AppError::upstream(e, EDIT_FAILURE, EDIT_KINDS)
            })?;

        Ok(EditedImageResponse { url: format!("data:image/png;base64,{}", b64) })
    }

    #[instrument(skip(self, form), fields(user_id = %identity.id))]
    pub async fn generate_video(
        &self,
        identity: &Identity,
        form: VideoGenerationForm,
    ) -> Result<GeneratedVideoResponse, AppError> {
        let prompt = present(form.prompt).ok_or_else(|| AppError::BadRequest("Prompt is required".into()))?;

        let video = self.providers.video.as_ref()
            .ok_or_else(|| not_configured("Replicate API token"))?;

        let duration = match present(form.duration) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| invalid_video_options())?,
            None => VideoGenerationRequest::DEFAULT_DURATION,
        };

        let image = match form.product_image.filter(|f| !f.bytes.is_empty()) {
            Some(file) => Some(to_data_url(&file.mime_type("image/png"), &file.bytes)),
            None => present(form.image_data),
        };

        let request = VideoGenerationRequest {
            prompt,
            duration,
            quality: present(form.quality).unwrap_or_else(|| VideoGenerationRequest::DEFAULT_QUALITY.to_string()),
            aspect_ratio: present(form.aspect_ratio)
                .unwrap_or_else(|| VideoGenerationRequest::DEFAULT_ASPECT_RATIO.to_string()),
            motion_mode: present(form.motion_mode)
                .unwrap_or_else(|| VideoGenerationRequest::DEFAULT_MOTION_MODE.to_string()),
            style: meaningful_option(form.style),
            effect: meaningful_option(form.effect),
            image,
        };

        let cost = video_credits(&request.duration_key(), &request.quality, &request.motion_mode)
            .ok_or_else(invalid_video_options)?;
        self.check_balance(identity, cost).await?;

        info!(
            duration = request.duration,
            quality = %request.quality,
            motion = %request.motion_mode,
            has_image = request.image.is_some(),
            "Generating video"
        );

        let video_url = video.generate(&request).await.map_err(|e| {
            error!(error = %e, kind = ?e.kind, "Video generation failed");
            AppError::upstream(e, VIDEO_FAILURE, VIDEO_KINDS)
        })?;

        let recorded = self.record(identity, AssetType::Video, &request.prompt, video_url.clone(), cost).await?;

        Ok(GeneratedVideoResponse {
            video_url,
            generated_asset_id: recorded.asset.id,
            duration: request.duration,
            quality: request.quality,
            aspect_ratio: request.aspect_ratio,
            motion_mode: request.motion_mode,
            style: request.style,
            effect: request.effect,
        })
    }

    #[instrument(skip(self, body), fields(user_id = %identity.id))]
    pub async fn generate_audio(
        &self,
        identity: &Identity,
        body: GenerateAudioBody,
    ) -> Result<GeneratedAudioResponse, AppError> {
        body.validate()?;
        let text = body.text.unwrap_or_default();

        let speech = self.providers.speech.as_ref()
            .ok_or_else(|| not_configured("ElevenLabs API key"))?;

        let request = SpeechRequest {
            voice_id: voice_id(body.voice.as_deref()),
            model: present(body.model).unwrap_or_else(|| DEFAULT_SPEECH_MODEL.to_string()),
            text,
        };

        let audio = speech.synthesize(&request).await.map_err(|e| {
            error!(error = %e, kind = ?e.kind, "Speech synthesis failed");
            AppError::upstream(e, AUDIO_FAILURE, AUDIO_KINDS)
        })?;

        Ok(GeneratedAudioResponse {
            audio_data: format!("data:audio/mpeg;base64,{}", STANDARD.encode(&audio)),
            duration: estimate_speech_seconds(&request.text),
        })
    }

    /// Placeholder for muxing: hands the uploaded video back unchanged.
    #[instrument(skip(self, form), fields(user_id = %identity.id))]
    pub async fn merge_audio_video(
        &self,
        identity: &Identity,
        form: MergeAudioVideoForm,
    ) -> Result<MergedVideoResponse, AppError> {
        let (video, _audio) = match (form.video, form.audio) {
            (Some(video), Some(audio)) if !video.bytes.is_empty() && !audio.bytes.is_empty() => (video, audio),
            _ => return Err(AppError::BadRequest("Both video and audio files are required".into())),
        };

        Ok(MergedVideoResponse {
            video_data: to_data_url("video/mp4", &video.bytes),
            message: "Video processing completed. In production, audio would be merged with video.".into(),
        })
    }

    async fn check_balance(&self, identity: &Identity, cost: i32) -> Result<(), AppError> {
        if !self.enforce_credit_balance {
            return Ok(());
        }

        let available = self.repos.user_repo
            .get_user_by_id(&identity.id)
            .await?
            .map(|user| user.credits)
            .unwrap_or(self.default_credits);

        if available < cost {
            return Err(AppError::InsufficientCredits { required: cost, available });
        }
        Ok(())
    }

    async fn record(
        &self,
        identity: &Identity,
        asset_type: AssetType,
        prompt: &str,
        url: String,
        cost: i32,
    ) -> Result<RecordedGeneration, AppError> {
        let asset = NewGeneratedAsset::completed(&identity.id, asset_type, prompt, url, cost);
        let recorded = self.repos.generated_asset_repo
            .record_generation(
                &NewUser::from_identity(identity, self.default_credits),
                &asset,
                self.enforce_credit_balance,
            )
            .await?;

        info!(
            asset_id = %recorded.asset.id,
            credits_used = cost,
            remaining = recorded.remaining_credits,
            "Recorded generation"
        );
        Ok(recorded)
    }
}

fn not_configured(credential: &str) -> AppError {
    error!("{} is not configured", credential);
    AppError::NotConfigured(format!("{} is not configured", credential))
}

fn invalid_video_options() -> AppError {
    AppError::BadRequest("Invalid duration, quality or motion configuration".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    use bytes::Bytes;
    use chrono::Utc;

    use crate::{
        entities::{
            generated_asset::{AssetStatus, GeneratedAsset},
            generation::UploadedFile,
            user::User,
        },
        errors::{Provider, ProviderError, ProviderErrorKind},
        infrastructure::providers::{MockImageGenerator, MockSpeechSynthesizer, MockVideoGenerator},
        repositories::{
            generated_asset::MockGeneratedAssetRepository,
            promo_code::MockPromoCodeRepository,
            saved_asset::MockSavedAssetRepository,
            user::MockUserRepository,
        },
    };

    fn identity() -> Identity {
        Identity { id: "user_1".into(), name: None, email: None }
    }

    fn repos(users: MockUserRepository, assets: MockGeneratedAssetRepository) -> SharedRepositories {
        SharedRepositories {
            user_repo: Arc::new(users),
            generated_asset_repo: Arc::new(assets),
            saved_asset_repo: Arc::new(MockSavedAssetRepository::new()),
            promo_code_repo: Arc::new(MockPromoCodeRepository::new()),
        }
    }

    fn recording(expected_cost: i32) -> MockGeneratedAssetRepository {
        let mut assets = MockGeneratedAssetRepository::new();
        assets.expect_record_generation()
            .withf(move |user, asset, _| {
                user.credits == 10 && user.name == "User" && asset.credits_used == expected_cost
            })
            .times(1)
            .returning(|_, asset, _| {
                Ok(RecordedGeneration {
                    asset: GeneratedAsset {
                        id: uuid::Uuid::new_v4(),
                        user_id: asset.user_id.clone(),
                        asset_type: asset.asset_type,
                        prompt: asset.prompt.clone(),
                        status: AssetStatus::Completed,
                        url: asset.url.clone(),
                        credits_used: asset.credits_used,
                        created_at: Utc::now(),
                    },
                    remaining_credits: (10 - asset.credits_used).max(0),
                })
            });
        assets
    }

    fn handler(repos: SharedRepositories, providers: Providers) -> GenerationHandler {
        GenerationHandler::new(repos, providers, RetryPolicy::new(3, Duration::from_millis(10)), 10, false)
    }

    fn image_form(quality: &str, size: &str) -> ImageGenerationForm {
        ImageGenerationForm {
            prompt: Some("a bottle on a beach".into()),
            size: Some(size.into()),
            format: Some("webp".into()),
            background: None,
            quality: Some(quality.into()),
        }
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected_first() {
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), Providers::default())
            .generate_image(&identity(), ImageGenerationForm::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Prompt is required");
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_closed() {
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), Providers::default())
            .generate_image(&identity(), image_form("high", "1024x1024"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotConfigured(_)));
        assert_eq!(err.to_string(), "OpenAI API key is not configured");
    }

    #[tokio::test]
    async fn unknown_price_is_rejected_before_provider_call() {
        let mut images = MockImageGenerator::new();
        images.expect_generate().never();
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_image(&identity(), image_form("ultra", "1024x1024"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid quality or size configuration");
    }

    #[tokio::test]
    async fn image_is_priced_and_recorded() {
        let mut images = MockImageGenerator::new();
        images.expect_generate()
            .withf(|r| r.format == "webp" && r.background == "auto")
            .times(1)
            .returning(|_| Ok("QUJD".into()));
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let response = handler(repos(MockUserRepository::new(), recording(25)), providers)
            .generate_image(&identity(), image_form("high", "1024x1024"))
            .await
            .unwrap();

        assert_eq!(response.url, "data:image/webp;base64,QUJD");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_image_failures_are_retried() {
        let mut images = MockImageGenerator::new();
        let mut calls = 0;
        images.expect_generate().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ProviderError::from_message(Provider::OpenAi, "Connection error."))
            } else {
                Ok("QUJD".into())
            }
        });
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let response = handler(repos(MockUserRepository::new(), recording(25)), providers)
            .generate_image(&identity(), image_form("high", "1024x1024"))
            .await
            .unwrap();

        assert!(response.url.ends_with("QUJD"));
    }

    #[tokio::test]
    async fn quota_error_maps_to_429_message() {
        let mut images = MockImageGenerator::new();
        images.expect_generate()
            .times(1)
            .returning(|_| Err(ProviderError::new(Provider::OpenAi, ProviderErrorKind::Quota, "billing hard limit")));
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_image(&identity(), image_form("low", "1024x1024"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "OpenAI API quota exceeded. Please check your billing settings.");
    }

    #[tokio::test]
    async fn short_balance_is_rejected_when_enforced() {
        let mut users = MockUserRepository::new();
        users.expect_get_user_by_id().returning(|_| {
            Ok(Some(User {
                id: "user_1".into(),
                name: None,
                email: None,
                credits: 5,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
        let mut images = MockImageGenerator::new();
        images.expect_generate().never();
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let mut handler = handler(repos(users, MockGeneratedAssetRepository::new()), providers);
        handler.enforce_credit_balance = true;

        let err = handler
            .generate_image(&identity(), image_form("high", "1024x1024"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientCredits { required: 25, available: 5 }));
    }

    #[tokio::test]
    async fn edit_requires_image() {
        let mut images = MockImageGenerator::new();
        images.expect_edit().never();
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let form = ImageEditForm { prompt: Some("make it blue".into()), ..ImageEditForm::default() };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .edit_image(&identity(), form)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Image is required");
    }

    #[tokio::test]
    async fn edit_returns_png_data_url_without_charging() {
        let mut images = MockImageGenerator::new();
        images.expect_edit()
            .withf(|r| r.mask.is_none() && r.size.is_none())
            .returning(|_| Ok("RURJVA==".into()));
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let form = ImageEditForm {
            prompt: Some("make it blue".into()),
            image: Some(UploadedFile {
                file_name: "in.png".into(),
                content_type: Some("image/png".into()),
                bytes: Bytes::from_static(b"png"),
            }),
            ..ImageEditForm::default()
        };
        let response = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .edit_image(&identity(), form)
            .await
            .unwrap();

        assert_eq!(response.url, "data:image/png;base64,RURJVA==");
    }

    #[tokio::test]
    async fn video_uses_defaults_and_product_image() {
        let mut video = MockVideoGenerator::new();
        video.expect_generate()
            .withf(|r| {
                r.duration == 5
                    && r.quality == "720p"
                    && r.motion_mode == "normal"
                    && r.aspect_ratio == "16:9"
                    && r.style.is_none()
                    && r.image.as_deref() == Some("data:image/jpeg;base64,AAEC")
            })
            .times(1)
            .returning(|_| Ok("https://replicate.delivery/out.mp4".into()));
        let providers = Providers { video: Some(Arc::new(video)), ..Providers::default() };

        let form = VideoGenerationForm {
            prompt: Some("sneaker spin".into()),
            style: Some("None".into()),
            product_image: Some(UploadedFile {
                file_name: "p.jpg".into(),
                content_type: Some("image/jpeg".into()),
                bytes: Bytes::from_static(&[0, 1, 2]),
            }),
            image_data: Some("data:image/png;base64,IGNORED".into()),
            ..VideoGenerationForm::default()
        };
        let response = handler(repos(MockUserRepository::new(), recording(52)), providers)
            .generate_video(&identity(), form)
            .await
            .unwrap();

        assert_eq!(response.video_url, "https://replicate.delivery/out.mp4");
        assert_eq!(response.duration, 5);
        assert_eq!(response.quality, "720p");
    }

    #[tokio::test]
    async fn unpriced_video_combination_fails_closed() {
        let mut video = MockVideoGenerator::new();
        video.expect_generate().never();
        let providers = Providers { video: Some(Arc::new(video)), ..Providers::default() };

        let form = VideoGenerationForm {
            prompt: Some("sneaker spin".into()),
            duration: Some("8".into()),
            quality: Some("1080p".into()),
            ..VideoGenerationForm::default()
        };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_video(&identity(), form)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid duration, quality or motion configuration");
    }

    #[tokio::test]
    async fn video_timeout_maps_to_408() {
        let mut video = MockVideoGenerator::new();
        video.expect_generate().times(1).returning(|_| {
            Err(ProviderError::new(Provider::Replicate, ProviderErrorKind::Timeout, "Prediction p1 timeout after 600s"))
        });
        let providers = Providers { video: Some(Arc::new(video)), ..Providers::default() };

        let form = VideoGenerationForm { prompt: Some("x".into()), ..VideoGenerationForm::default() };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_video(&identity(), form)
            .await
            .unwrap_err();

        assert_eq!(actix_web::ResponseError::status_code(&err).as_u16(), 408);
    }

    #[tokio::test]
    async fn image_generation_timeout_is_a_generic_failure() {
        let mut images = MockImageGenerator::new();
        images.expect_generate().times(1).returning(|_| {
            Err(ProviderError::from_status(Provider::OpenAi, 500, "upstream request timeout"))
        });
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_image(&identity(), image_form("low", "1024x1024"))
            .await
            .unwrap_err();

        assert_eq!(actix_web::ResponseError::status_code(&err).as_u16(), 500);
        assert_eq!(err.to_string(), IMAGE_FAILURE);
    }

    #[tokio::test]
    async fn audio_failure_mentioning_mask_is_a_generic_failure() {
        let mut speech = MockSpeechSynthesizer::new();
        speech.expect_synthesize().times(1).returning(|_| {
            Err(ProviderError::from_status(Provider::ElevenLabs, 400, "voice mask parameter invalid"))
        });
        let providers = Providers { speech: Some(Arc::new(speech)), ..Providers::default() };

        let body = GenerateAudioBody { text: Some("Hello".into()), voice: None, model: None };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_audio(&identity(), body)
            .await
            .unwrap_err();

        assert_eq!(actix_web::ResponseError::status_code(&err).as_u16(), 500);
        assert_eq!(err.to_string(), AUDIO_FAILURE);
    }

    #[tokio::test]
    async fn edit_mask_mismatch_is_a_client_error() {
        let mut images = MockImageGenerator::new();
        images.expect_edit().times(1).returning(|_| {
            Err(ProviderError::from_status(Provider::OpenAi, 400, "Invalid mask image dimensions"))
        });
        let providers = Providers { images: Some(Arc::new(images)), ..Providers::default() };

        let form = ImageEditForm {
            prompt: Some("make it blue".into()),
            image: Some(UploadedFile {
                file_name: "in.png".into(),
                content_type: Some("image/png".into()),
                bytes: Bytes::from_static(b"png"),
            }),
            ..ImageEditForm::default()
        };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .edit_image(&identity(), form)
            .await
            .unwrap_err();

        assert_eq!(actix_web::ResponseError::status_code(&err).as_u16(), 400);
        assert_eq!(
            err.to_string(),
            "Invalid mask or image dimensions. Please ensure the mask matches the image size."
        );
    }

    #[tokio::test]
    async fn audio_needs_text() {
        let body = GenerateAudioBody { text: Some("   ".into()), voice: None, model: None };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), Providers::default())
            .generate_audio(&identity(), body)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Text is required");
    }

    #[tokio::test]
    async fn audio_resolves_voice_and_estimates_duration() {
        let mut speech = MockSpeechSynthesizer::new();
        speech.expect_synthesize()
            .withf(|r| r.voice_id == "AZnzlk1XvdvUeBnXmlld" && r.model == DEFAULT_SPEECH_MODEL)
            .returning(|_| Ok(Bytes::from_static(b"ID3")));
        let providers = Providers { speech: Some(Arc::new(speech)), ..Providers::default() };

        let body = GenerateAudioBody {
            text: Some("Fresh coffee, every single morning.".into()),
            voice: Some("Domi".into()),
            model: None,
        };
        let response = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), providers)
            .generate_audio(&identity(), body)
            .await
            .unwrap();

        assert_eq!(response.audio_data, "data:audio/mpeg;base64,SUQz");
        assert_eq!(response.duration, 3);
    }

    #[tokio::test]
    async fn merge_needs_both_files() {
        let form = MergeAudioVideoForm {
            video: Some(UploadedFile { file_name: "v.mp4".into(), content_type: None, bytes: Bytes::from_static(b"v") }),
            audio: None,
        };
        let err = handler(repos(MockUserRepository::new(), MockGeneratedAssetRepository::new()), Providers::default())
            .merge_audio_video(&identity(), form)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Both video and audio files are required");
    }
}
