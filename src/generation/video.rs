use reqwest::StatusCode;
use tracing::{error, info};

use super::{VideoParams, VideoResult, DEFAULT_MOTION_PROMPT, DEFAULT_VIDEO_CONTENT_TYPE, VIDEO_DURATION_SECS};
use crate::error::AppError;
use crate::fal::types::ImageToVideoInput;
use crate::fal::{ApiError, FalClient};

/// Execute video generation: call fal image-to-video and normalize the video object.
/// Video generation can take minutes; the call stays pending until fal completes.
pub async fn run_video(
    fal: &FalClient,
    model: &str,
    params: &VideoParams,
) -> Result<VideoResult, AppError> {
    match execute(fal, model, params).await {
        Ok(result) => {
            info!(request_id = %result.request_id, "video generated");
            Ok(result)
        }
        Err(e) => {
            error!(model = %model, "video generation failed: {e}");
            Err(e)
        }
    }
}

async fn execute(
    fal: &FalClient,
    model: &str,
    params: &VideoParams,
) -> Result<VideoResult, AppError> {
    let input = ImageToVideoInput {
        image_url: params.image_url.clone(),
        prompt: params
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_MOTION_PROMPT.to_string()),
        prompt_optimizer: true,
        duration: VIDEO_DURATION_SECS.to_string(),
    };

    let resp = fal
        .image_to_video(model, &input)
        .await
        .map_err(translate_rejection)?;

    let video = resp
        .data
        .video
        .ok_or(AppError::InvalidResponse("video"))?;
    let url = video
        .url
        .filter(|u| !u.is_empty())
        .ok_or(AppError::InvalidResponse("video"))?;

    Ok(VideoResult {
        video_url: url,
        content_type: video
            .content_type
            .unwrap_or_else(|| DEFAULT_VIDEO_CONTENT_TYPE.to_string()),
        request_id: resp.request_id,
    })
}

/// fal reports input validation failures as 422 with a `detail` payload;
/// turn those into a readable message and pass everything else through.
fn translate_rejection(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.status == StatusCode::UNPROCESSABLE_ENTITY => {
            let message = match api.detail() {
                Some(detail) => format!("API validation error: {detail}"),
                None => "API validation error: Invalid request parameters".to_string(),
            };
            AppError::Upstream(message)
        }
        _ => AppError::upstream(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejection_includes_detail() {
        let err: anyhow::Error = ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: serde_json::json!({"detail": [{"loc": ["body", "image_url"], "msg": "unreachable"}]}),
        }
        .into();
        let app = translate_rejection(err);
        assert_eq!(
            app.to_string(),
            r#"API validation error: [{"loc":["body","image_url"],"msg":"unreachable"}]"#
        );
    }

    #[test]
    fn validation_rejection_without_detail() {
        let err: anyhow::Error = ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: serde_json::json!({}),
        }
        .into();
        assert_eq!(
            translate_rejection(err).to_string(),
            "API validation error: Invalid request parameters"
        );
    }

    #[test]
    fn other_rejections_pass_through() {
        let err: anyhow::Error = ApiError {
            status: StatusCode::UNAUTHORIZED,
            body: serde_json::json!({"detail": "bad key"}),
        }
        .into();
        let app = translate_rejection(err);
        assert!(matches!(app, AppError::Upstream(_)));
        assert!(app.to_string().starts_with("fal API error 401"));
    }

    #[test]
    fn transport_errors_pass_through() {
        let err = anyhow::anyhow!("connection reset").context("fal submit request failed");
        assert_eq!(
            translate_rejection(err).to_string(),
            "fal submit request failed: connection reset"
        );
    }
}
