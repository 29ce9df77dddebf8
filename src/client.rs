use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::generation::{ImageParams, ImageResult, VideoParams, VideoResult};
use crate::todos::{Deleted, Todo};
use crate::workflow::GenerationApi;

/// HTTP client for a running genstudio server.
pub struct StudioClient {
    base_url: String,
    http: Client,
}

impl StudioClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// POST /api/generate/image
    pub async fn generate_image(&self, params: &ImageParams) -> Result<ImageResult> {
        let resp = self
            .http
            .post(self.url("/api/generate/image"))
            .json(params)
            .send()
            .await
            .context("image generation request failed")?;
        decode(resp).await
    }

    /// POST /api/generate/video. Can take minutes.
    pub async fn generate_video(&self, params: &VideoParams) -> Result<VideoResult> {
        let resp = self
            .http
            .post(self.url("/api/generate/video"))
            .json(params)
            .send()
            .await
            .context("video generation request failed")?;
        decode(resp).await
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>> {
        let resp = self
            .http
            .get(self.url("/api/todos"))
            .send()
            .await
            .context("todo list request failed")?;
        decode(resp).await
    }

    pub async fn create_todo(&self, text: &str) -> Result<Todo> {
        let resp = self
            .http
            .post(self.url("/api/todos"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("todo create request failed")?;
        decode(resp).await
    }

    pub async fn toggle_todo(&self, id: &str) -> Result<Todo> {
        let resp = self
            .http
            .post(self.url(&format!("/api/todos/{id}/toggle")))
            .send()
            .await
            .context("todo toggle request failed")?;
        decode(resp).await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<Deleted> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/todos/{id}")))
            .send()
            .await
            .context("todo delete request failed")?;
        decode(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or surface the server's `{ "error": ... }` message.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(String::from));
        match message {
            Some(message) => bail!("{message}"),
            None => bail!("server error {status}: {body}"),
        }
    }
    resp.json::<T>()
        .await
        .context("failed to parse server response")
}

impl GenerationApi for StudioClient {
    async fn generate_image(&self, params: ImageParams) -> Result<ImageResult> {
        StudioClient::generate_image(self, &params).await
    }

    async fn generate_video(&self, params: VideoParams) -> Result<VideoResult> {
        StudioClient::generate_video(self, &params).await
    }
}
