pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::ModelArtifact;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// The model is loaded once at startup and only ever read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelArtifact>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(model: Arc<ModelArtifact>) -> Self {
        Self {
            model,
            started_at: Instant::now(),
        }
    }
}
