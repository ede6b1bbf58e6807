//! # Audio Route Core - Call Audio Output Arbitration
//!
//! This crate decides which output a live call's audio plays through:
//! loudspeaker, handset earpiece, wired headset or a Bluetooth hands-free
//! headset. It reacts to headset plug events, Bluetooth link changes, the
//! proximity sensor and explicit user choices, and keeps exactly one output
//! active at a time.
//!
//! - **engine**: the synchronous arbitration cycle and its state
//! - **manager**: lifecycle, platform settings save/restore and the control task
//! - **platform**: traits the host implements for its audio stack
//! - **mock**: in-memory collaborators for tests and demos
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rvoip_audio_route_core::mock::MockEnvironment;
//! use rvoip_audio_route_core::{AudioDevice, AudioRouteConfig, AudioRouteManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Real applications implement the platform traits instead
//!     let env = MockEnvironment::new(true);
//!     let manager = AudioRouteManager::spawn(AudioRouteConfig::default(), env.collaborators())?;
//!
//!     // Call started
//!     manager.start().await?;
//!     println!("routing to {}", manager.selected_audio_device().await?);
//!
//!     // User taps the earpiece button
//!     manager.select_audio_device(AudioDevice::Earpiece).await?;
//!
//!     // Call ended
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Device priority
//!
//! When nothing forces a choice the engine picks, in order: an active
//! Bluetooth SCO link, a wired headset, then the default device (earpiece or
//! speakerphone depending on the speakerphone mode).

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod manager;
pub mod mock;
pub mod platform;
pub mod types;

// Re-export main types
pub use config::{AudioRouteConfig, DEFAULT_EVENT_CHANNEL_CAPACITY};
pub use engine::{ArbitrationEngine, ArbitrationState, BluetoothAction};
pub use error::{AudioRouteError, AudioRouteResult};
pub use events::{EventEmitter, EventStream, RouteEvent, SelectionSink};
pub use logging::{setup_logging, LoggingConfig};
pub use manager::{AudioRouteManager, RouteNotifier};
pub use platform::{
    AudioRouteCollaborators, BluetoothController, HeadsetMonitor, HostCapabilities, PlatformAudio,
    ProximityMonitor, SavedAudioSettings,
};
pub use types::{AudioDevice, AudioMode, BluetoothStatus, DeviceSet, ManagerLifecycleState, SpeakerphoneMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        AudioDevice, AudioRouteCollaborators, AudioRouteConfig, AudioRouteError, AudioRouteManager,
        AudioRouteResult, DeviceSet, RouteEvent, RouteNotifier, SelectionSink, SpeakerphoneMode,
    };
}
