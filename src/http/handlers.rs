use super::state::AppState;
use crate::error::SuiteError;
use crate::prompts::PromptSet;
use crate::session::SessionStats;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

const PAGE: &str = include_str!("page.html");

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub voice_id: String,
    pub prompts: PromptSet,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub saved: String,
}

#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn suite_error_response(err: SuiteError) -> Response {
    let status = if err.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    error!("Request failed: {}", err);
    error_response(status, err.to_string())
}

// Run a blocking store operation off the async workers
async fn blocking<T, F>(op: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, SuiteError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(suite_error_response(e)),
        Err(e) => {
            error!("Store task failed: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal task failure",
            ))
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Recording page
pub async fn index() -> Html<&'static str> {
    Html(PAGE)
}

/// GET /api/prompts
/// Prompts assigned to this session, in presentation order
pub async fn get_prompts(State(state): State<AppState>) -> Json<PromptsResponse> {
    Json(PromptsResponse {
        voice_id: state.studio.voice_id().to_string(),
        prompts: state.studio.prompts().clone(),
    })
}

/// POST /api/upload
/// Store one take: multipart fields `idx`, `text`, `file`
pub async fn upload_take(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut idx: Option<String> = None;
    let mut text: Option<String> = None;
    let mut audio: Option<Bytes> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };

        let name = field.name().map(str::to_string);
        let read = match name.as_deref() {
            Some("idx") => field.text().await.map(|v| idx = Some(v)),
            Some("text") => field.text().await.map(|v| text = Some(v)),
            Some("file") => field.bytes().await.map(|v| audio = Some(v)),
            _ => Ok(()),
        };
        if let Err(e) = read {
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    }

    let index: u32 = match idx.as_deref().map(|v| v.trim().parse()) {
        Some(Ok(index)) => index,
        Some(Err(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "idx must be a non-negative integer")
        }
        None => return error_response(StatusCode::BAD_REQUEST, "Missing field: idx"),
    };
    let Some(text) = text else {
        return error_response(StatusCode::BAD_REQUEST, "Missing field: text");
    };
    let Some(audio) = audio else {
        return error_response(StatusCode::BAD_REQUEST, "Missing field: file");
    };

    if state.studio.prompts().get(index).is_none() {
        warn!("Upload for index {} outside the session's prompt set", index);
    }

    let store = state.studio.store().clone();
    match blocking(move || store.put_take(index, &text, &audio)).await {
        Ok(path) => {
            let saved = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("Upload stored: {}", saved);
            (StatusCode::OK, Json(UploadResponse { ok: true, saved })).into_response()
        }
        Err(response) => response,
    }
}

/// POST /api/finalize
/// Mark the session complete (idempotent)
pub async fn finalize(State(state): State<AppState>) -> Response {
    let store = state.studio.store().clone();
    match blocking(move || store.finalize()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(FinalizeResponse {
                ok: true,
                message: "Finalized. You can now run: voice-suite dataset build".to_string(),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /api/session
/// Progress of the current session
pub async fn session_status(State(state): State<AppState>) -> Response {
    let store = state.studio.store().clone();
    let prompts = state.studio.prompts().len();
    match blocking(move || store.stats(prompts)).await {
        Ok(stats) => (StatusCode::OK, Json::<SessionStats>(stats)).into_response(),
        Err(response) => response,
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
