//! Real-time relay configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds between `systemHeartbeat` broadcasts
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Default room for typing indicators when the client names none
    #[serde(default = "default_typing_room")]
    pub default_typing_room: String,
}

impl RealtimeConfig {
    /// Get the heartbeat interval as a `Duration`
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ValidationError::InvalidHeartbeatInterval);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            default_typing_room: default_typing_room(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_typing_room() -> String {
    "general".to_string()
}
