use tracing::{error, info};

use super::{ImageParams, ImageResult, IMAGE_INFERENCE_STEPS, IMAGE_OUTPUT_FORMAT};
use crate::error::AppError;
use crate::fal::types::TextToImageInput;
use crate::fal::FalClient;

/// Execute image generation: call fal text-to-image, normalize the first image.
pub async fn run_image(
    fal: &FalClient,
    model: &str,
    params: &ImageParams,
) -> Result<ImageResult, AppError> {
    match execute(fal, model, params).await {
        Ok(result) => {
            info!(
                request_id = %result.request_id,
                width = result.width,
                height = result.height,
                "image generated"
            );
            Ok(result)
        }
        Err(e) => {
            error!(model = %model, "image generation failed: {e}");
            Err(e)
        }
    }
}

async fn execute(
    fal: &FalClient,
    model: &str,
    params: &ImageParams,
) -> Result<ImageResult, AppError> {
    let size = params.image_size();

    let input = TextToImageInput {
        prompt: params.prompt.clone(),
        negative_prompt: params.negative_prompt.clone().unwrap_or_default(),
        image_size: size,
        num_inference_steps: IMAGE_INFERENCE_STEPS,
        seed: params.seed,
        num_images: 1,
        enable_safety_checker: true,
        output_format: IMAGE_OUTPUT_FORMAT.to_string(),
    };

    let resp = fal
        .text_to_image(model, &input)
        .await
        .map_err(AppError::upstream)?;

    let image = resp
        .data
        .images
        .as_deref()
        .and_then(|images| images.first())
        .and_then(Option::as_ref)
        .ok_or(AppError::InvalidResponse("image"))?;
    let url = image
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(AppError::InvalidResponse("image"))?;

    Ok(ImageResult {
        image_url: url.to_string(),
        width: image.width.unwrap_or(size.width),
        height: image.height.unwrap_or(size.height),
        request_id: resp.request_id,
    })
}
