use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::fal::FalClient;
use crate::generation::{Generator, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};

// ---------------------------------------------------------------------------
// Settings: optional JSON file named by GENSTUDIO_SETTINGS, then env overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub fal_key: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_video_model")]
    pub video_model: String,
    #[serde(default = "default_queue_url")]
    pub queue_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

fn default_queue_url() -> String {
    "https://queue.fal.run".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fal_key: String::new(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            queue_url: default_queue_url(),
            poll_interval_ms: default_poll_interval_ms(),
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
        }
    }
}

impl Settings {
    /// Load from the process environment. Fails if the API key is missing.
    pub fn load() -> Result<Self> {
        let settings = Self::from_lookup(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from an arbitrary variable lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match lookup("GENSTUDIO_SETTINGS") {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read settings file {path}"))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("failed to parse settings file {path}"))?
            }
            None => Settings::default(),
        };

        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = var("FAL_KEY") {
            settings.fal_key = v;
        }
        if let Some(v) = var("FAL_IMAGE_MODEL") {
            settings.image_model = v;
        }
        if let Some(v) = var("FAL_VIDEO_MODEL") {
            settings.video_model = v;
        }
        if let Some(v) = var("FAL_QUEUE_URL") {
            settings.queue_url = v;
        }
        if let Some(v) = var("FAL_POLL_INTERVAL_MS") {
            settings.poll_interval_ms = v
                .parse()
                .with_context(|| format!("FAL_POLL_INTERVAL_MS must be an integer, got \"{v}\""))?;
        }
        if let Some(v) = var("GENSTUDIO_ADDR") {
            settings.bind_addr = v;
        }
        if let Some(v) = var("GENSTUDIO_STATIC_DIR") {
            settings.static_dir = PathBuf::from(v);
        }
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fal_key.trim().is_empty() {
            bail!("FAL_KEY must be set to a non-empty API key");
        }
        if self.image_model.trim().is_empty() || self.video_model.trim().is_empty() {
            bail!("model identifiers must not be empty");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn generator(&self) -> Generator {
        let fal = FalClient::new(self.queue_url.clone(), self.fal_key.clone(), self.poll_interval());
        Generator::new(fal, self.image_model.clone(), self.video_model.clone())
    }
}
