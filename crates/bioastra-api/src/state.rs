//! Application state management

use bioastra_core::AppConfig;
use bioastra_nlp::Pipelines;
use std::time::Instant;

/// Application state shared across handlers
///
/// Pipelines are loaded before the state is built and never replaced, so
/// handlers read them without locking.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Loaded model pipelines
    pub pipelines: Pipelines,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, pipelines: Pipelines) -> Self {
        Self {
            config,
            pipelines,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
