pub mod config;
pub mod db;
pub mod error;
pub mod log_id;
pub mod logging;
pub mod tracker;

pub use config::{load_config, Config, LogFormat};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, MailtrackError, Result, TrackError};
pub use log_id::{new_log_id, parse_log_id, LogIdParts};
pub use logging::init_logging;
pub use tracker::{ReadLogEntry, ReadOutcome, ReadRecorder, Tracker};
