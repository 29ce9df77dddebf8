pub mod types;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};
use types::{
    decode_output, Completed, ImageToVideoInput, ImageToVideoOutput, QueueStatus, QueueSubmitResponse,
    TextToImageInput, TextToImageOutput,
};

/// A non-2xx answer from the queue API. Kept typed so callers can
/// `downcast_ref` it out of an `anyhow::Error` and inspect the status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ApiError {
    /// The `detail` field of a structured rejection, if any.
    pub fn detail(&self) -> Option<&serde_json::Value> {
        self.body.get("detail").filter(|d| !d.is_null())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body.as_str() {
            Some(text) => write!(f, "fal API error {}: {text}", self.status),
            None => write!(f, "fal API error {}: {}", self.status, self.body),
        }
    }
}

impl std::error::Error for ApiError {}

pub struct FalClient {
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    http: Client,
}

impl FalClient {
    pub fn new(base_url: String, api_key: String, poll_interval: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval,
            http: Client::new(),
        }
    }

    pub async fn text_to_image(
        &self,
        model: &str,
        input: &TextToImageInput,
    ) -> Result<Completed<TextToImageOutput>> {
        let done = self.subscribe::<_, serde_json::Value>(model, input).await?;
        Ok(Completed {
            request_id: done.request_id,
            data: decode_output(done.data),
        })
    }

    pub async fn image_to_video(
        &self,
        model: &str,
        input: &ImageToVideoInput,
    ) -> Result<Completed<ImageToVideoOutput>> {
        let done = self.subscribe::<_, serde_json::Value>(model, input).await?;
        Ok(Completed {
            request_id: done.request_id,
            data: decode_output(done.data),
        })
    }

    /// Submit to the queue, poll until the request completes, then fetch the output.
    /// There is no deadline: the call ends only on completion or an upstream error.
    pub async fn subscribe<I, O>(&self, model: &str, input: &I) -> Result<Completed<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let submitted = self.submit(model, input).await?;
        let request_id = submitted.request_id;
        info!(request_id = %request_id, model = %model, "queued fal request");

        let status_url = submitted
            .status_url
            .unwrap_or_else(|| format!("{}/{}/requests/{}/status", self.base_url, model, request_id));
        let response_url = submitted
            .response_url
            .unwrap_or_else(|| format!("{}/{}/requests/{}", self.base_url, model, request_id));

        loop {
            let status = self.get_status(&status_url).await?;
            for log in status.logs.iter().flatten() {
                if let Some(ref message) = log.message {
                    debug!(request_id = %request_id, "fal: {message}");
                }
            }
            match status.status.as_deref() {
                Some("COMPLETED") => break,
                Some(s @ ("IN_QUEUE" | "IN_PROGRESS")) => {
                    info!(
                        request_id = %request_id,
                        status = %s,
                        queue_position = ?status.queue_position,
                        "polling fal request..."
                    );
                }
                Some(other) => {
                    warn!(request_id = %request_id, status = %other, "unexpected fal status");
                }
                None => {
                    warn!(request_id = %request_id, "poll returned no status");
                }
            }
            sleep(self.poll_interval).await;
        }

        let resp = self
            .http
            .get(&response_url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("fal result request failed")?;
        let data = check(resp)
            .await?
            .json::<O>()
            .await
            .context("failed to parse fal result")?;

        info!(request_id = %request_id, "fal request completed");
        Ok(Completed { request_id, data })
    }

    async fn submit<I: Serialize + ?Sized>(
        &self,
        model: &str,
        input: &I,
    ) -> Result<QueueSubmitResponse> {
        let url = format!("{}/{}", self.base_url, model);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(input)
            .send()
            .await
            .context("fal submit request failed")?;

        check(resp)
            .await?
            .json::<QueueSubmitResponse>()
            .await
            .context("failed to parse fal submit response")
    }

    async fn get_status(&self, status_url: &str) -> Result<QueueStatus> {
        let resp = self
            .http
            .get(status_url)
            .query(&[("logs", "1")])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("fal status request failed")?;

        check(resp)
            .await?
            .json::<QueueStatus>()
            .await
            .context("failed to parse fal status response")
    }

    fn auth_header(&self) -> String {
        format!("Key {}", self.api_key)
    }
}

/// Turn a non-2xx response into an [`ApiError`], keeping the body as JSON when it parses.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    Err(ApiError { status, body }.into())
}
