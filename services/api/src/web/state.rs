//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use course_forge_core::{ports::CourseRepository, DocumentPipeline};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Per-request generation state lives inside each pipeline call, so nothing here
/// needs a lock.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DocumentPipeline>,
    pub courses: Arc<dyn CourseRepository>,
    pub config: Arc<Config>,
}
