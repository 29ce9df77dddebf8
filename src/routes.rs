use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path as FsPath;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::generation::{parse_request, ImageParams, ImageResult, VideoParams, VideoResult};
use crate::todos::{Deleted, Todo};
use crate::AppState;

/// API routes plus the single-page bundle in `static_dir` (unknown paths get `index.html`).
pub fn router(state: AppState, static_dir: &FsPath) -> Router {
    let spa = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/test", get(test_get).post(test_post))
        .route("/api/generate/image", post(generate_image))
        .route("/api/generate/video", post(generate_video))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}/toggle", post(toggle_todo))
        .route("/api/todos/{id}", delete(delete_todo))
        .fallback_service(spa)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))?;
    parse_request(value)
}

// ---------------------------------------------------------------------------
// /api/test
// ---------------------------------------------------------------------------

async fn test_get(headers: HeaderMap, OriginalUri(uri): OriginalUri) -> Json<Value> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    Json(serde_json::json!({
        "message": "Hello from GET!",
        "method": "GET",
        "timestamp": timestamp(),
        "url": format!("http://{host}{uri}"),
    }))
}

async fn test_post(body: Bytes) -> (StatusCode, Json<Value>) {
    let received: Value = serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}));

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Hello from POST!",
            "method": "POST",
            "received": received,
            "timestamp": timestamp(),
        })),
    )
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

async fn generate_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImageResult>, AppError> {
    let params: ImageParams = parse_body(&body)?;
    Ok(Json(state.generator.generate_image(params).await?))
}

async fn generate_video(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VideoResult>, AppError> {
    let params: VideoParams = parse_body(&body)?;
    Ok(Json(state.generator.generate_video(params).await?))
}

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateTodo {
    text: String,
}

async fn list_todos(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.todos.list())
}

async fn create_todo(State(state): State<AppState>, body: Bytes) -> Result<Json<Todo>, AppError> {
    let input: CreateTodo = parse_body(&body)?;
    Ok(Json(state.todos.create(&input.text)?))
}

async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    Ok(Json(state.todos.toggle(&id)?))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    Ok(Json(state.todos.delete(&id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Uri};

    #[tokio::test]
    async fn get_echoes_method_and_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        let uri: Uri = "/api/test?x=1".parse().unwrap();

        let Json(body) = test_get(headers, OriginalUri(uri)).await;
        assert_eq!(body["method"], "GET");
        assert_eq!(body["message"], "Hello from GET!");
        assert_eq!(body["url"], "http://localhost:3000/api/test?x=1");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn post_echoes_body_with_created() {
        let (status, Json(body)) = test_post(Bytes::from_static(br#"{"a":1}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["method"], "POST");
        assert_eq!(body["received"], serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn post_with_unparseable_body_receives_empty_object() {
        let (status, Json(body)) = test_post(Bytes::from_static(b"not json")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["received"], serde_json::json!({}));
    }

    #[test]
    fn parse_body_reports_validation_errors() {
        assert!(matches!(parse_body::<CreateTodo>(b"{"), Err(AppError::Validation(_))));
        assert!(matches!(parse_body::<CreateTodo>(b"{}"), Err(AppError::Validation(_))));
        let input: CreateTodo = parse_body(br#"{"text":"Buy milk"}"#).unwrap();
        assert_eq!(input.text, "Buy milk");
    }
}
