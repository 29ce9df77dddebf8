pub mod client;
pub mod error;
pub mod fal;
pub mod generation;
pub mod mcp;
pub mod routes;
pub mod settings;
pub mod todos;
pub mod workflow;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use generation::Generator;
use settings::Settings;
use todos::{SharedTodos, TodoStore};

// ---------------------------------------------------------------------------
// App state shared by the HTTP handlers
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub todos: SharedTodos,
}

impl AppState {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator: Arc::new(generator),
            todos: Arc::new(TodoStore::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Server setup
// ---------------------------------------------------------------------------

/// Bind `settings.bind_addr` and serve until the process stops.
pub async fn run(settings: Settings) -> Result<()> {
    info!(
        image_model = %settings.image_model,
        video_model = %settings.video_model,
        "loaded settings"
    );

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    let state = AppState::new(settings.generator());

    serve(listener, state, &settings.static_dir).await
}

/// Serve the app on an already-bound listener.
pub async fn serve(listener: TcpListener, state: AppState, static_dir: &Path) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, static_dir = %static_dir.display(), "genstudio listening");

    let app = routes::router(state, static_dir);
    axum::serve(listener, app).await.context("HTTP server failed")
}
