//! HTTP route definitions.

mod health;
mod trackers;
mod ui;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub use self::trackers::PIXEL_GIF;

/// Build the complete router.
///
/// # Route Structure
///
/// - `GET /` - Static tracker management page
/// - `GET /health` - Health check
/// - `POST /create/{id}` - Register a tracker; the caller's IP becomes its origin IP
/// - `GET /track/{id}` - Tracking pixel; records a read unless it comes from the origin IP
/// - `GET /logs/{id}` - Recorded reads, newest first
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(health::health_check))
        .route("/create/{id}", post(trackers::create))
        .route("/track/{id}", get(trackers::track))
        .route("/logs/{id}", get(trackers::logs))
        .with_state(state)
}
