//! Tracker endpoints: creation, pixel fetch and read logs.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use mailtrack::{ReadLogEntry, ReadOutcome};

use crate::client_ip::ClientIp;
use crate::error::ApiError;
use crate::state::AppState;

/// Transparent 1x1 GIF served for every tracked fetch.
pub static PIXEL_GIF: [u8; 35] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// `POST /create/{id}`
pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ClientIp(ip): ClientIp,
) -> Result<StatusCode, ApiError> {
    let tracker = state
        .blocking(move |recorder| recorder.create_tracker(&id, &ip))
        .await?;

    tracing::info!(id = %tracker.id, origin_ip = %tracker.origin_ip, "tracker created");
    Ok(StatusCode::CREATED)
}

/// `GET /track/{id}`
pub async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ClientIp(ip): ClientIp,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .blocking({
            let id = id.clone();
            move |recorder| recorder.track_pixel(&id, &ip)
        })
        .await?;

    match outcome {
        ReadOutcome::Recorded(entry) => {
            tracing::info!(id = %id, log_id = %entry.id, ip = %entry.ip, "read recorded")
        }
        ReadOutcome::SkippedOrigin => tracing::debug!(id = %id, "origin read skipped"),
        ReadOutcome::TrackerMissing => tracing::debug!(id = %id, "tracker vanished mid-read"),
    }

    Ok((
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
        ],
        &PIXEL_GIF[..],
    ))
}

/// `GET /logs/{id}`
pub async fn logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReadLogEntry>>, ApiError> {
    let logs = state
        .blocking(move |recorder| recorder.read_logs(&id))
        .await?;
    Ok(Json(logs))
}
