//! Web UI Module
//!
//! Server-rendered pages for the Q&A site: questions, answers, profiles,
//! search, sign in and the admin panel. Templates are embedded in the binary.

mod routes;
mod templates;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Create the web UI router.
/// Mount this with `.merge(web_ui::router())` in main.rs
pub fn router() -> Router<Arc<AppState>> {
    routes::create_router()
}
