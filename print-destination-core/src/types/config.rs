//! Dialog controller configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default minimum time the loading indicator stays visible.
pub const DEFAULT_MIN_LOADING_TIME_MS: u64 = 2000;

/// Default capacity of the dialog signal channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogConfig {
    /// Loading-Timer Gate duration in milliseconds
    pub min_loading_time_ms: u64,
    /// Whether the user may open printer management
    pub manage_printers_available: bool,
    /// Merge managed print options into freshly configured printers
    pub managed_print_options_enabled: bool,
    /// Capacity of the broadcast signal channel
    pub event_buffer_size: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            min_loading_time_ms: DEFAULT_MIN_LOADING_TIME_MS,
            manage_printers_available: true,
            managed_print_options_enabled: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl DialogConfig {
    #[must_use]
    pub fn min_loading_time(&self) -> Duration {
        Duration::from_millis(self.min_loading_time_ms)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.event_buffer_size == 0 {
            return Err(CoreError::ValidationError(
                "eventBufferSize must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
