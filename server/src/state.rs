//! Application state.

use axum::http::header::{HeaderName, InvalidHeaderName};
use mailtrack::{Config, Database, ReadRecorder};

use crate::error::ApiError;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Tracker store and read recording engine.
    pub recorder: ReadRecorder,

    /// Proxy header consulted for the client IP before the peer address.
    pub client_ip_header: HeaderName,
}

impl AppState {
    pub fn new(db: Database, client_ip_header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            recorder: ReadRecorder::new(db),
            client_ip_header: HeaderName::from_bytes(client_ip_header.as_bytes())?,
        })
    }

    /// Builds state from a loaded configuration and an opened database.
    pub fn from_config(db: Database, config: &Config) -> Result<Self, InvalidHeaderName> {
        Self::new(db, &config.client_ip_header)
    }

    /// Runs blocking storage work off the async runtime.
    pub async fn blocking<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(ReadRecorder) -> Result<T, mailtrack::TrackError> + Send + 'static,
        T: Send + 'static,
    {
        let recorder = self.recorder.clone();
        tokio::task::spawn_blocking(move || f(recorder))
            .await
            .map_err(|e| ApiError::Internal(format!("storage task failed: {e}")))?
            .map_err(ApiError::from)
    }
}
