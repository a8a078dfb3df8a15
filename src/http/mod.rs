//! Studio HTTP API
//!
//! Serves the recording page and the endpoints it talks to:
//! - GET / - Recording page
//! - GET /api/prompts - Prompts for this session
//! - POST /api/upload - Store one take (multipart `idx`, `text`, `file`)
//! - POST /api/finalize - Mark the session finalized
//! - GET /api/session - Session progress
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, FinalizeResponse, PromptsResponse, UploadResponse};
pub use routes::create_router;
pub use state::AppState;
