//! Audio route manager configuration
//!
//! The only user-facing preference is the speakerphone mode, stored with the
//! values `"auto"`, `"true"` and `"false"`. The remaining fields tune how the
//! manager treats the platform audio service around a call.
//!
//! # Example
//!
//! ```rust
//! use rvoip_audio_route_core::{AudioRouteConfig, SpeakerphoneMode};
//!
//! let config = AudioRouteConfig::from_toml_str(r#"
//!     speakerphone_mode = "false"
//!     event_channel_capacity = 64
//! "#).unwrap();
//!
//! assert_eq!(config.speakerphone_mode, SpeakerphoneMode::ForcedFalse);
//! assert_eq!(config.event_channel_capacity, 64);
//! assert!(config.manage_audio_mode);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AudioRouteError, AudioRouteResult};
use crate::logging::LoggingConfig;
use crate::types::SpeakerphoneMode;

/// Default capacity of the [`RouteEvent`](crate::events::RouteEvent) broadcast channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the audio route manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioRouteConfig {
    /// Speakerphone preference; decides the default device and whether the
    /// proximity sensor is used
    pub speakerphone_mode: SpeakerphoneMode,
    /// Capacity of the route event broadcast channel
    pub event_channel_capacity: usize,
    /// Switch the platform to communication mode while running and restore
    /// the previous mode on stop
    pub manage_audio_mode: bool,
    /// Unmute the microphone when the manager starts
    pub unmute_microphone_on_start: bool,
    /// `[logging]` table, applied by [`setup_logging`](crate::logging::setup_logging)
    pub logging: LoggingConfig,
}

impl Default for AudioRouteConfig {
    fn default() -> Self {
        Self {
            speakerphone_mode: SpeakerphoneMode::Auto,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            manage_audio_mode: true,
            unmute_microphone_on_start: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl AudioRouteConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the speakerphone preference
    pub fn with_speakerphone_mode(mut self, mode: SpeakerphoneMode) -> Self {
        self.speakerphone_mode = mode;
        self
    }

    /// Set the route event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Enable/disable audio mode management
    pub fn with_manage_audio_mode(mut self, enabled: bool) -> Self {
        self.manage_audio_mode = enabled;
        self
    }

    /// Enable/disable unmuting the microphone on start
    pub fn with_unmute_microphone_on_start(mut self, enabled: bool) -> Self {
        self.unmute_microphone_on_start = enabled;
        self
    }

    /// Set the logging section
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> AudioRouteResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> AudioRouteResult<Self> {
        let path = path.as_ref();
        debug!("Loading audio route configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AudioRouteResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(AudioRouteError::config(
                "event_channel_capacity must be greater than zero",
            ));
        }
        self.logging.validate()
    }
}
