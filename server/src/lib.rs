//! mailtrack server - HTTP surface for email open tracking.
//!
//! # Architecture
//!
//! - **AppState**: shared [`ReadRecorder`](mailtrack::ReadRecorder) and client IP settings
//! - **ClientIp**: extractor resolving the requester IP from a proxy header or the peer address
//! - **Routes**: tracker creation, tracking pixel, read logs, static page

mod client_ip;
mod error;
mod routes;
mod state;

pub use self::client_ip::{ClientIp, UNKNOWN_IP};
pub use self::error::ApiError;
pub use self::routes::{router, PIXEL_GIF};
pub use self::state::AppState;
