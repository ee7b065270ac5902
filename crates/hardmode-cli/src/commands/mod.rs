pub mod alerts;
pub mod config;
pub mod daemon;
pub mod log;
pub mod onboard;
pub mod rollover;
pub mod status;

use chrono::{DateTime, Utc};
use hardmode_core::intent::NotificationSink;
use hardmode_core::storage::{Database, EngineConfig};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Notices the schedulers would deliver through a chat transport go to
/// stdout here, prefixed with the recipient.
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn send(&self, handle: &str, message: &str) {
        println!("[{handle}]\n{message}\n");
    }
}

pub fn open_database() -> Result<Database, Box<dyn std::error::Error>> {
    Ok(Database::open()?)
}

pub fn load_engine_config() -> EngineConfig {
    match EngineConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, "could not load engine config, using defaults");
            EngineConfig::default()
        }
    }
}

/// `--at` override for the tick commands, defaulting to the real clock.
pub fn parse_at(at: Option<&str>) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    match at {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
