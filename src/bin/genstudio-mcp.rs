//! Standalone MCP server binary for genstudio.
//!
//! Exposes image/video generation and the todo list as tools to AI clients
//! over stdio JSON-RPC. Runs in-process; it does not need the HTTP server.

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;
use tracing::info;

use genstudio_lib::mcp::GenStudioMcp;
use genstudio_lib::settings::Settings;
use genstudio_lib::todos::TodoStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so stdout stays clean for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load()?;
    info!(
        image_model = %settings.image_model,
        video_model = %settings.video_model,
        "loaded settings"
    );

    let server = GenStudioMcp::new(
        Arc::new(settings.generator()),
        Arc::new(TodoStore::new()),
    );

    info!("genstudio MCP server starting on stdio");

    let service = server
        .serve(stdio())
        .await
        .context("MCP server failed to start")?;

    service.waiting().await?;

    Ok(())
}
