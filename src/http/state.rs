use crate::studio::Studio;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The session uploads are written into
    pub studio: Arc<Studio>,

    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(studio: Studio, max_upload_bytes: usize) -> Self {
        Self {
            studio: Arc::new(studio),
            max_upload_bytes,
        }
    }
}
