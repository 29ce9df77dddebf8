use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData, ServerHandler,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::generation::{integral_seed, AspectRatio, Generator, ImageParams, VideoParams};
use crate::todos::SharedTodos;

// ---------------------------------------------------------------------------
// Tool parameter schemas (derive JsonSchema for rmcp auto-schema)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateImageParams {
    /// Text prompt describing the image to generate.
    pub prompt: String,
    /// What the image should avoid.
    #[serde(default)]
    pub negative_prompt: Option<String>,
    /// Aspect ratio: "1:1" (default), "16:9", or "9:16".
    #[serde(default)]
    pub aspect_ratio: Option<AspectRatio>,
    /// Integer seed for reproducible output.
    #[serde(default, deserialize_with = "integral_seed")]
    #[schemars(with = "Option<i64>")]
    pub seed: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateVideoParams {
    /// URL of the source image, typically the imageUrl from generate_image.
    pub image_url: String,
    /// Motion description. A cinematic default is used when omitted.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTodoParams {
    /// Todo text (must not be empty).
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TodoIdParams {
    /// The todo ID returned by create_todo or list_todos.
    pub id: String,
}

// ---------------------------------------------------------------------------
// MCP Server
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GenStudioMcp {
    generator: Arc<Generator>,
    todos: SharedTodos,
    tool_router: ToolRouter<Self>,
}

impl GenStudioMcp {
    pub fn new(generator: Arc<Generator>, todos: SharedTodos) -> Self {
        Self {
            generator,
            todos,
            tool_router: Self::tool_router(),
        }
    }
}

/// Render a handler outcome as tool output: JSON text on success, a tool error otherwise.
fn tool_result<T: Serialize>(outcome: Result<T, AppError>) -> Result<CallToolResult, ErrorData> {
    match outcome {
        Ok(value) => {
            let json = serde_json::to_string(&value).map_err(|e| {
                ErrorData::internal_error(format!("Failed to serialize result: {e}"), None)
            })?;
            Ok(CallToolResult::success(vec![Content::text(json)]))
        }
        Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
    }
}

#[tool_router]
impl GenStudioMcp {
    #[tool(description = "Generate an image from a text prompt. \
        Returns imageUrl, width, height and requestId. \
        Aspect ratios: 1:1 (1024x1024, default), 16:9 (1024x576), 9:16 (576x1024).")]
    async fn generate_image(
        &self,
        Parameters(params): Parameters<GenerateImageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let image_params = ImageParams {
            prompt: params.prompt,
            negative_prompt: params.negative_prompt,
            aspect_ratio: params.aspect_ratio,
            seed: params.seed,
        };
        tool_result(self.generator.generate_image(image_params).await)
    }

    #[tool(description = "Animate an image into a short video. \
        Pass the imageUrl from generate_image. Video generation can take several minutes. \
        Returns videoUrl, contentType and requestId.")]
    async fn generate_video(
        &self,
        Parameters(params): Parameters<GenerateVideoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let video_params = VideoParams::new(params.image_url, params.prompt);
        tool_result(self.generator.generate_video(video_params).await)
    }

    #[tool(description = "List all todos in creation order.")]
    async fn list_todos(&self) -> Result<CallToolResult, ErrorData> {
        tool_result(Ok::<_, AppError>(self.todos.list()))
    }

    #[tool(description = "Create a todo. Returns the new todo with its generated id.")]
    async fn create_todo(
        &self,
        Parameters(params): Parameters<CreateTodoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        tool_result(self.todos.create(&params.text))
    }

    #[tool(description = "Flip a todo's completed flag. Returns the updated todo.")]
    async fn toggle_todo(
        &self,
        Parameters(params): Parameters<TodoIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        tool_result(self.todos.toggle(&params.id))
    }

    #[tool(description = "Delete a todo by id.")]
    async fn delete_todo(
        &self,
        Parameters(params): Parameters<TodoIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        tool_result(self.todos.delete(&params.id))
    }
}

#[tool_handler]
impl ServerHandler for GenStudioMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const SERVER_INSTRUCTIONS: &str = "\
genstudio MCP server: two-step image then video generation, plus a scratch todo list.

# Workflow

1. Call generate_image with a prompt. Keep the returned imageUrl.
2. Call generate_video with that imageUrl and an optional motion prompt.
   Video generation is slow (minutes); do not call it again while one is running.
3. On failure, retry the same call manually. Nothing is retried automatically.

Todos live in memory and are lost when the server stops.
";
