//! The live arbitration record

use crate::types::{AudioDevice, DeviceSet, SpeakerphoneMode};

/// State owned by the [`ArbitrationEngine`](super::ArbitrationEngine)
///
/// Mutated in place by every arbitration cycle. A clone of it is what the
/// manager hands out as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrationState {
    pub(crate) available: DeviceSet,
    pub(crate) selected: AudioDevice,
    pub(crate) user_selected: AudioDevice,
    pub(crate) default_device: AudioDevice,
    pub(crate) has_wired_headset: bool,
    pub(crate) speakerphone_mode: SpeakerphoneMode,
}

impl ArbitrationState {
    /// Fresh state: nothing available, nothing selected
    pub(crate) fn new(speakerphone_mode: SpeakerphoneMode, default_device: AudioDevice) -> Self {
        Self {
            available: DeviceSet::new(),
            selected: AudioDevice::None,
            user_selected: AudioDevice::None,
            default_device,
            has_wired_headset: false,
            speakerphone_mode,
        }
    }

    /// Return to the empty form, keeping the default device and mode
    pub(crate) fn reset(&mut self) {
        self.available.clear();
        self.selected = AudioDevice::None;
        self.user_selected = AudioDevice::None;
        self.has_wired_headset = false;
    }

    /// Devices available after the last cycle
    pub fn available_devices(&self) -> &DeviceSet {
        &self.available
    }

    /// Active device, [`AudioDevice::None`] before the first cycle
    pub fn selected_device(&self) -> AudioDevice {
        self.selected
    }

    /// Explicit user choice, or [`AudioDevice::None`]
    pub fn user_selected_device(&self) -> AudioDevice {
        self.user_selected
    }

    /// Device used without wired headset or connected SCO link
    pub fn default_device(&self) -> AudioDevice {
        self.default_device
    }

    /// Last known wired headset state
    pub fn has_wired_headset(&self) -> bool {
        self.has_wired_headset
    }

    /// Speakerphone preference
    pub fn speakerphone_mode(&self) -> SpeakerphoneMode {
        self.speakerphone_mode
    }
}
