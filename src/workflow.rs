//! Two-step generation workflow: prompt → image, then image → video.
//!
//! [`Workflow`] is the pure state machine; [`Studio`] pairs it with a
//! [`GenerationApi`] backend and performs one call per user action.

use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

use crate::generation::{Generator, ImageParams, ImageResult, VideoParams, VideoResult};

const IMAGE_FAILED_FALLBACK: &str = "Failed to generate image";
const VIDEO_FAILED_FALLBACK: &str = "Failed to generate video";

/// Backend able to run the two generation steps. Implemented in-process by
/// [`Generator`] and over HTTP by [`crate::client::StudioClient`].
pub trait GenerationApi {
    fn generate_image(
        &self,
        params: ImageParams,
    ) -> impl Future<Output = anyhow::Result<ImageResult>> + Send;

    fn generate_video(
        &self,
        params: VideoParams,
    ) -> impl Future<Output = anyhow::Result<VideoResult>> + Send;
}

impl GenerationApi for Generator {
    async fn generate_image(&self, params: ImageParams) -> anyhow::Result<ImageResult> {
        Ok(Generator::generate_image(self, params).await?)
    }

    async fn generate_video(&self, params: VideoParams) -> anyhow::Result<VideoResult> {
        Ok(Generator::generate_video(self, params).await?)
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Idle,
    ImageGenerating,
    ImageSuccess(ImageResult),
    ImageError(String),
    /// Carries the source image so it stays on screen while the video renders.
    VideoGenerating(ImageResult),
    VideoSuccess(ImageResult, VideoResult),
    VideoError(ImageResult, String),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::ImageGenerating => "image-generating",
            WorkflowState::ImageSuccess(_) => "image-success",
            WorkflowState::ImageError(_) => "image-error",
            WorkflowState::VideoGenerating(_) => "video-generating",
            WorkflowState::VideoSuccess(..) => "video-success",
            WorkflowState::VideoError(..) => "video-error",
        }
    }

    /// True while a request is in flight; triggering controls stay disabled.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::ImageGenerating | WorkflowState::VideoGenerating(_)
        )
    }

    /// The image currently displayable, if any.
    pub fn image(&self) -> Option<&ImageResult> {
        match self {
            WorkflowState::ImageSuccess(image)
            | WorkflowState::VideoGenerating(image)
            | WorkflowState::VideoSuccess(image, _)
            | WorkflowState::VideoError(image, _) => Some(image),
            WorkflowState::Idle | WorkflowState::ImageGenerating | WorkflowState::ImageError(_) => None,
        }
    }

    pub fn video(&self) -> Option<&VideoResult> {
        match self {
            WorkflowState::VideoSuccess(_, video) => Some(video),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WorkflowState::ImageError(message) | WorkflowState::VideoError(_, message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Rejected before any transition; shown to the user as a warning.
    #[error("Please enter a prompt")]
    EmptyPrompt,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Workflow {
    state: WorkflowState,
    image_request: Option<ImageParams>,
    video_request: Option<VideoParams>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// idle | image-error → image-generating. Returns the request to send.
    pub fn submit_prompt(&mut self, params: ImageParams) -> Result<ImageParams, WorkflowError> {
        if params.prompt.trim().is_empty() {
            return Err(WorkflowError::EmptyPrompt);
        }
        match std::mem::take(&mut self.state) {
            WorkflowState::Idle | WorkflowState::ImageError(_) => {
                self.image_request = Some(params.clone());
                self.state = WorkflowState::ImageGenerating;
                Ok(params)
            }
            other => Err(self.reject("generate an image", other)),
        }
    }

    /// image-error → image-generating with the previous request.
    pub fn retry_image(&mut self) -> Result<ImageParams, WorkflowError> {
        match (std::mem::take(&mut self.state), self.image_request.clone()) {
            (WorkflowState::ImageError(_), Some(params)) => {
                self.state = WorkflowState::ImageGenerating;
                Ok(params)
            }
            (other, _) => Err(self.reject("retry the image", other)),
        }
    }

    /// image-generating → image-success | image-error.
    pub fn finish_image(&mut self, outcome: Result<ImageResult, String>) -> Result<(), WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::ImageGenerating => {
                self.state = match outcome {
                    Ok(image) => WorkflowState::ImageSuccess(image),
                    Err(message) => WorkflowState::ImageError(non_empty(message, IMAGE_FAILED_FALLBACK)),
                };
                Ok(())
            }
            other => Err(self.reject("record an image result", other)),
        }
    }

    /// image-success → video-generating. The only way into the video step.
    pub fn request_video(&mut self, motion: Option<String>) -> Result<VideoParams, WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::ImageSuccess(image) => {
                let params = VideoParams::new(image.image_url.clone(), motion);
                self.video_request = Some(params.clone());
                self.state = WorkflowState::VideoGenerating(image);
                Ok(params)
            }
            other => Err(self.reject("generate a video", other)),
        }
    }

    /// video-error → video-generating with the previous request.
    pub fn retry_video(&mut self) -> Result<VideoParams, WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::VideoError(image, _) => {
                let params = self
                    .video_request
                    .clone()
                    .unwrap_or_else(|| VideoParams::new(image.image_url.clone(), None));
                self.state = WorkflowState::VideoGenerating(image);
                Ok(params)
            }
            other => Err(self.reject("retry the video", other)),
        }
    }

    /// video-generating → video-success | video-error; the image is kept either way.
    pub fn finish_video(&mut self, outcome: Result<VideoResult, String>) -> Result<(), WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::VideoGenerating(image) => {
                self.state = match outcome {
                    Ok(video) => WorkflowState::VideoSuccess(image, video),
                    Err(message) => WorkflowState::VideoError(image, non_empty(message, VIDEO_FAILED_FALLBACK)),
                };
                Ok(())
            }
            other => Err(self.reject("record a video result", other)),
        }
    }

    /// Back to idle, discarding results. Not allowed while a request is in flight.
    pub fn start_new(&mut self) -> Result<(), WorkflowError> {
        if self.state.is_busy() {
            let state = self.state.name();
            return Err(WorkflowError::InvalidTransition {
                action: "start a new session",
                state,
            });
        }
        *self = Workflow::default();
        Ok(())
    }

    // Put the untouched state back and describe the refused action.
    fn reject(&mut self, action: &'static str, state: WorkflowState) -> WorkflowError {
        let name = state.name();
        self.state = state;
        WorkflowError::InvalidTransition { action, state: name }
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

// ---------------------------------------------------------------------------
// Studio: workflow driven against a backend
// ---------------------------------------------------------------------------

pub struct Studio<A> {
    api: A,
    workflow: Workflow,
}

impl<A: GenerationApi> Studio<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            workflow: Workflow::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        self.workflow.state()
    }

    pub async fn generate_image(&mut self, params: ImageParams) -> Result<&WorkflowState, WorkflowError> {
        let params = self.workflow.submit_prompt(params)?;
        self.run_image(params).await
    }

    pub async fn retry_image(&mut self) -> Result<&WorkflowState, WorkflowError> {
        let params = self.workflow.retry_image()?;
        self.run_image(params).await
    }

    pub async fn generate_video(&mut self, motion: Option<String>) -> Result<&WorkflowState, WorkflowError> {
        let params = self.workflow.request_video(motion)?;
        self.run_video(params).await
    }

    pub async fn retry_video(&mut self) -> Result<&WorkflowState, WorkflowError> {
        let params = self.workflow.retry_video()?;
        self.run_video(params).await
    }

    pub fn start_new(&mut self) -> Result<(), WorkflowError> {
        self.workflow.start_new()
    }

    async fn run_image(&mut self, params: ImageParams) -> Result<&WorkflowState, WorkflowError> {
        info!(prompt = %params.prompt, "generating image");
        let outcome = self
            .api
            .generate_image(params)
            .await
            .map_err(|e| format!("{e:#}"));
        if let Err(ref message) = outcome {
            warn!("image step failed: {message}");
        }
        self.workflow.finish_image(outcome)?;
        Ok(self.workflow.state())
    }

    async fn run_video(&mut self, params: VideoParams) -> Result<&WorkflowState, WorkflowError> {
        info!(image_url = %params.image_url, "generating video");
        let outcome = self
            .api
            .generate_video(params)
            .await
            .map_err(|e| format!("{e:#}"));
        if let Err(ref message) = outcome {
            warn!("video step failed: {message}");
        }
        self.workflow.finish_video(outcome)?;
        Ok(self.workflow.state())
    }
}
