//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room a [`GameManager`](crate::GameManager)
/// spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// How long a finished room lingers so clients can fetch the final
    /// state before the room is torn down.
    pub cleanup_delay: Duration,

    /// Capacity of each room's command channel. Callers wait when it is
    /// full.
    pub channel_size: usize,

    /// Whether rooms announce `turn_timed_out` when a game's per-turn time
    /// limit runs out.
    pub turn_timers: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(5),
            channel_size: 64,
            turn_timers: true,
        }
    }
}

impl ManagerConfig {
    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    /// Clamped to at least one slot; a zero-capacity mpsc channel panics.
    pub fn with_channel_size(mut self, size: usize) -> Self {
        self.channel_size = size.max(1);
        self
    }

    pub fn with_turn_timers(mut self, enabled: bool) -> Self {
        self.turn_timers = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_config_default() {
        let config = ManagerConfig::default();
        assert_eq!(config.cleanup_delay, Duration::from_secs(5));
        assert_eq!(config.channel_size, 64);
        assert!(config.turn_timers);
    }

    #[test]
    fn test_builder_setters() {
        let config = ManagerConfig::default()
            .with_cleanup_delay(Duration::from_millis(250))
            .with_channel_size(0)
            .with_turn_timers(false);
        assert_eq!(config.cleanup_delay, Duration::from_millis(250));
        assert_eq!(config.channel_size, 1);
        assert!(!config.turn_timers);
    }
}
