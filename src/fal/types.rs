use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Queue protocol
// POST {queueUrl}/{model}          → request id + status/response URLs
// GET  {status_url}?logs=1         → IN_QUEUE | IN_PROGRESS | COMPLETED
// GET  {response_url}              → model output
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct QueueSubmitResponse {
    pub request_id: String,
    pub status_url: Option<String>,
    pub response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueueStatus {
    pub status: Option<String>,
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub logs: Option<Vec<QueueLog>>,
}

#[derive(Debug, Deserialize)]
pub struct QueueLog {
    pub message: Option<String>,
}

/// A completed queue request: the upstream request id and the model output.
#[derive(Debug)]
pub struct Completed<T> {
    pub request_id: String,
    pub data: T,
}

// ---------------------------------------------------------------------------
// Text-to-image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct TextToImageInput {
    pub prompt: String,
    pub negative_prompt: String,
    pub image_size: ImageSize,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    pub num_images: u32,
    pub enable_safety_checker: bool,
    pub output_format: String, // always "jpeg"
}

// Outputs are decoded leniently: a field of the wrong shape reads as absent,
// so callers see "no usable URL" instead of a serde error.

#[derive(Debug, Default, Deserialize)]
pub struct TextToImageOutput {
    #[serde(default, deserialize_with = "lenient")]
    pub images: Option<Vec<Option<GeneratedImage>>>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedImage {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub content_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Image-to-video
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ImageToVideoInput {
    pub image_url: String,
    pub prompt: String,
    pub prompt_optimizer: bool,
    /// Seconds, sent as a string.
    pub duration: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageToVideoOutput {
    #[serde(default, deserialize_with = "lenient")]
    pub video: Option<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedVideo {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content_type: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode a model output, falling back to an empty output when the payload
/// is not an object at all.
pub fn decode_output<T: DeserializeOwned + Default>(data: serde_json::Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn first_image_url(data: serde_json::Value) -> Option<String> {
        let output: TextToImageOutput = decode_output(data);
        output.images?.into_iter().next()??.url
    }

    #[test]
    fn well_formed_image_output_decodes() {
        let output: TextToImageOutput =
            decode_output(json!({"images": [{"url": "https://cdn/x.jpg", "width": 512, "height": 256}]}));
        let image = output.images.unwrap().remove(0).unwrap();
        assert_eq!(image.url.as_deref(), Some("https://cdn/x.jpg"));
        assert_eq!((image.width, image.height), (Some(512), Some(256)));
    }

    #[test]
    fn misshapen_image_outputs_have_no_url() {
        for data in [
            json!({"images": [null]}),
            json!({"images": {"url": "x"}}),
            json!({"images": [{"url": 7}]}),
            json!({"images": "x"}),
            json!("not an object"),
            json!([]),
        ] {
            assert_eq!(first_image_url(data.clone()), None, "{data}");
        }
    }

    #[test]
    fn bad_dimensions_do_not_hide_the_url() {
        let url = first_image_url(json!({"images": [{"url": "https://cdn/x.jpg", "width": "wide"}]}));
        assert_eq!(url.as_deref(), Some("https://cdn/x.jpg"));
    }

    #[test]
    fn misshapen_video_outputs_have_no_video() {
        for data in [json!({"video": [1]}), json!({"video": null}), json!(42)] {
            let output: ImageToVideoOutput = decode_output(data.clone());
            assert!(output.video.is_none(), "{data}");
        }
        let output: ImageToVideoOutput = decode_output(json!({"video": {"url": false}}));
        assert!(output.video.unwrap().url.is_none());
    }
}
