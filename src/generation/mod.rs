pub mod image;
pub mod video;

use schemars::JsonSchema;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::fal::types::ImageSize;
use crate::fal::FalClient;

// ---------------------------------------------------------------------------
// Fixed generation parameters
// ---------------------------------------------------------------------------

pub const DEFAULT_IMAGE_MODEL: &str = "fal-ai/hidream-i1-fast";
pub const DEFAULT_VIDEO_MODEL: &str = "fal-ai/minimax/hailuo-2.3-fast/standard/image-to-video";

pub const IMAGE_INFERENCE_STEPS: u32 = 16;
pub const IMAGE_OUTPUT_FORMAT: &str = "jpeg";

pub const DEFAULT_MOTION_PROMPT: &str = "Smooth motion, cinematic movement, dynamic scene";
pub const VIDEO_DURATION_SECS: &str = "6";
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Output shape selector. Serialized as the ratio string the UI sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub fn dimensions(self) -> ImageSize {
        match self {
            AspectRatio::Square => ImageSize { width: 1024, height: 1024 },
            AspectRatio::Wide => ImageSize { width: 1024, height: 576 },
            AspectRatio::Tall => ImageSize { width: 576, height: 1024 },
        }
    }
}

// ---------------------------------------------------------------------------
// Request / result shapes: camelCase on the wire
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "integral_seed"
    )]
    pub seed: Option<i64>,
}

impl ImageParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Validate before any upstream call.
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if self.prompt.trim().is_empty() {
            return Err(AppError::Validation("prompt must not be empty".into()));
        }
        Ok(())
    }

    pub fn image_size(&self) -> ImageSize {
        self.aspect_ratio.unwrap_or_default().dimensions()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl VideoParams {
    pub fn new(image_url: impl Into<String>, prompt: Option<String>) -> Self {
        Self {
            image_url: image_url.into(),
            prompt,
        }
    }

    /// Validate the source URL and fill in the default motion prompt.
    pub fn normalize(&mut self) -> Result<(), AppError> {
        if let Err(e) = url::Url::parse(&self.image_url) {
            return Err(AppError::Validation(format!(
                "invalid image URL \"{}\": {e}",
                self.image_url
            )));
        }
        let prompt = self
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_MOTION_PROMPT)
            .to_string();
        self.prompt = Some(prompt);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub video_url: String,
    pub content_type: String,
    pub request_id: String,
}

/// Accept any integral JSON number as a seed, including float spellings like `7.0`.
pub(crate) fn integral_seed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(seed) = n.as_i64() {
        return Ok(Some(seed));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(Some(f as i64)),
        _ => Err(D::Error::custom(format!("seed must be an integer, got {n}"))),
    }
}

/// Decode a raw JSON request body, reporting shape errors as validation failures.
pub fn parse_request<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Validation(format!("invalid request: {e}")))
}

// ---------------------------------------------------------------------------
// Generator: owns the fal client and the configured model ids
// ---------------------------------------------------------------------------

pub struct Generator {
    fal: FalClient,
    image_model: String,
    video_model: String,
}

impl Generator {
    pub fn new(fal: FalClient, image_model: String, video_model: String) -> Self {
        Self {
            fal,
            image_model,
            video_model,
        }
    }

    pub async fn generate_image(&self, mut params: ImageParams) -> Result<ImageResult, AppError> {
        params.normalize()?;
        image::run_image(&self.fal, &self.image_model, &params).await
    }

    pub async fn generate_video(&self, mut params: VideoParams) -> Result<VideoResult, AppError> {
        params.normalize()?;
        video::run_video(&self.fal, &self.video_model, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_maps_to_fixed_sizes() {
        let cases = [
            (None, (1024, 1024)),
            (Some(AspectRatio::Square), (1024, 1024)),
            (Some(AspectRatio::Wide), (1024, 576)),
            (Some(AspectRatio::Tall), (576, 1024)),
        ];
        for (ratio, (w, h)) in cases {
            let params = ImageParams {
                aspect_ratio: ratio,
                ..ImageParams::new("a cat")
            };
            assert_eq!(params.image_size(), ImageSize { width: w, height: h }, "{ratio:?}");
        }
    }

    #[test]
    fn image_params_deserialize_from_ui_format() {
        let json = serde_json::json!({
            "prompt": "a cat",
            "negativePrompt": "blurry",
            "aspectRatio": "16:9",
            "seed": 42
        });
        let params: ImageParams = parse_request(json).unwrap();
        assert_eq!(params.prompt, "a cat");
        assert_eq!(params.negative_prompt.as_deref(), Some("blurry"));
        assert_eq!(params.aspect_ratio, Some(AspectRatio::Wide));
        assert_eq!(params.seed, Some(42));
    }

    #[test]
    fn image_params_reject_unknown_ratio() {
        let json = serde_json::json!({"prompt": "a cat", "aspectRatio": "4:3"});
        let err = parse_request::<ImageParams>(json).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn image_params_reject_fractional_seed() {
        let json = serde_json::json!({"prompt": "a cat", "seed": 1.5});
        assert!(matches!(
            parse_request::<ImageParams>(json),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn image_params_accept_integral_float_seed() {
        let json = serde_json::json!({"prompt": "a cat", "seed": 7.0});
        let params: ImageParams = parse_request(json).unwrap();
        assert_eq!(params.seed, Some(7));

        let json = serde_json::json!({"prompt": "a cat", "seed": null});
        assert_eq!(parse_request::<ImageParams>(json).unwrap().seed, None);
    }

    #[test]
    fn image_params_reject_non_numeric_or_huge_seed() {
        for seed in [serde_json::json!("7"), serde_json::json!(u64::MAX), serde_json::json!(1e300)] {
            let json = serde_json::json!({"prompt": "a cat", "seed": seed});
            assert!(
                matches!(parse_request::<ImageParams>(json), Err(AppError::Validation(_))),
                "{seed}"
            );
        }
    }

    #[test]
    fn image_params_reject_missing_prompt() {
        let json = serde_json::json!({"aspectRatio": "1:1"});
        assert!(parse_request::<ImageParams>(json).is_err());
    }

    #[test]
    fn empty_prompt_fails_normalize() {
        let mut params = ImageParams::new("   ");
        assert!(matches!(params.normalize(), Err(AppError::Validation(_))));
        let mut params = ImageParams::new("a cat");
        assert!(params.normalize().is_ok());
    }

    #[test]
    fn video_params_require_well_formed_url() {
        let mut params = VideoParams::new("not a url", None);
        assert!(matches!(params.normalize(), Err(AppError::Validation(_))));
    }

    #[test]
    fn video_params_default_motion_prompt() {
        let mut params = VideoParams::new("https://example.com/cat.jpg", Some("  ".into()));
        params.normalize().unwrap();
        assert_eq!(params.prompt.as_deref(), Some(DEFAULT_MOTION_PROMPT));

        let mut params = VideoParams::new("https://example.com/cat.jpg", Some(" slow pan ".into()));
        params.normalize().unwrap();
        assert_eq!(params.prompt.as_deref(), Some("slow pan"));
    }

    #[test]
    fn results_serialize_camel_case() {
        let image = ImageResult {
            image_url: "https://cdn/img.jpg".into(),
            width: 1024,
            height: 576,
            request_id: "req-1".into(),
        };
        let v = serde_json::to_value(&image).unwrap();
        assert_eq!(v["imageUrl"], "https://cdn/img.jpg");
        assert_eq!(v["requestId"], "req-1");

        let video = VideoResult {
            video_url: "https://cdn/v.mp4".into(),
            content_type: DEFAULT_VIDEO_CONTENT_TYPE.into(),
            request_id: "req-2".into(),
        };
        let v = serde_json::to_value(&video).unwrap();
        assert_eq!(v["videoUrl"], "https://cdn/v.mp4");
        assert_eq!(v["contentType"], "video/mp4");
    }
}
