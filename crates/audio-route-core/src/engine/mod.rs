//! Device arbitration engine
//!
//! The engine owns an [`ArbitrationState`] and converges it after every
//! external event. Each operation runs one *arbitration cycle* to completion:
//!
//! ```text
//!   refresh BT ─► device set ─► reconcile user choice ─► start/stop SCO
//!                                                            │
//!          notify sink ◄── activate ◄── resolve by priority ◄┘
//! ```
//!
//! The engine is synchronous and not `Sync`; it is meant to live on one
//! control task (see [`crate::manager`]) that serializes every call.

mod activation;
mod arbitration;
mod proximity;
mod state;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::events::SelectionSink;
use crate::platform::{AudioRouteCollaborators, BluetoothController, PlatformAudio};
use crate::types::{display_set, AudioDevice, DeviceSet, SpeakerphoneMode};

pub(crate) use activation::{set_microphone_mute, set_speakerphone};
pub use arbitration::{available_devices, bluetooth_action, resolve_device, BluetoothAction};
pub use proximity::proximity_target;
pub use state::ArbitrationState;

/// Audio output arbitration engine
pub struct ArbitrationEngine {
    state: ArbitrationState,
    bluetooth: Arc<dyn BluetoothController>,
    platform: Arc<dyn PlatformAudio>,
    has_earpiece: bool,
    sink: Option<Box<dyn SelectionSink>>,
}

impl ArbitrationEngine {
    /// Create an engine in its empty state
    ///
    /// The host is asked once whether it has telephony hardware; without it
    /// the earpiece is never offered and never used as the default.
    pub fn new(speakerphone_mode: SpeakerphoneMode, collaborators: &AudioRouteCollaborators) -> Self {
        let has_earpiece = collaborators.host.has_telephony_feature();
        let default_device = substitute_default(speakerphone_mode.default_device(), has_earpiece);
        debug!(
            "Creating arbitration engine (mode: {}, default: {}, earpiece: {})",
            speakerphone_mode, default_device, has_earpiece
        );

        Self {
            state: ArbitrationState::new(speakerphone_mode, default_device),
            bluetooth: collaborators.bluetooth.clone(),
            platform: collaborators.platform.clone(),
            has_earpiece,
            sink: None,
        }
    }

    /// Install or remove the selection listener
    pub fn set_selection_sink(&mut self, sink: Option<Box<dyn SelectionSink>>) {
        self.sink = sink;
    }

    /// Current state
    pub fn state(&self) -> &ArbitrationState {
        &self.state
    }

    /// Active device
    pub fn selected_device(&self) -> AudioDevice {
        self.state.selected
    }

    /// Devices currently available
    pub fn available_devices(&self) -> &DeviceSet {
        &self.state.available
    }

    /// Whether the host has an earpiece
    pub fn has_earpiece(&self) -> bool {
        self.has_earpiece
    }

    /// Return the state to its empty form
    pub fn reset(&mut self) {
        debug!("Resetting arbitration state");
        self.state.reset();
    }

    /// Explicit user choice of output device
    ///
    /// Ignored (with a warning) unless the device is currently available.
    pub fn select_user_device(&mut self, device: AudioDevice) {
        if !self.state.available.contains(&device) {
            warn!(
                "Can not select {} from available {}",
                device,
                display_set(&self.state.available)
            );
            return;
        }
        info!("User selected audio device: {}", device);
        self.state.user_selected = device;
        self.recompute();
    }

    /// Change the default device and run a cycle
    pub fn set_default_device(&mut self, device: AudioDevice) {
        if self.update_default_device(device) {
            self.recompute();
        }
    }

    /// Change the default device without running a cycle
    ///
    /// Only `Speakerphone` and `Earpiece` are accepted; `Earpiece` becomes
    /// `Speakerphone` on hosts without one. Returns whether the request was
    /// accepted.
    pub fn update_default_device(&mut self, device: AudioDevice) -> bool {
        match device {
            AudioDevice::Speakerphone | AudioDevice::Earpiece => {
                let device = substitute_default(device, self.has_earpiece);
                debug!("Default audio device set to {}", device);
                self.state.default_device = device;
                true
            }
            AudioDevice::WiredHeadset | AudioDevice::Bluetooth | AudioDevice::None => {
                warn!("Invalid default audio device: {}", device);
                false
            }
        }
    }

    /// Wired headset plug state changed
    pub fn on_headset_plug_changed(&mut self, plugged: bool) {
        info!("Wired headset {}", if plugged { "plugged" } else { "unplugged" });
        self.state.has_wired_headset = plugged;
        self.recompute();
    }

    /// The Bluetooth collaborator reported a status change
    pub fn on_bluetooth_status_changed(&mut self) {
        debug!("Bluetooth status changed: {}", self.bluetooth.status());
        self.recompute();
    }
}

fn substitute_default(device: AudioDevice, has_earpiece: bool) -> AudioDevice {
    if device == AudioDevice::Earpiece && !has_earpiece {
        AudioDevice::Speakerphone
    } else {
        device
    }
}
