//! The arbitration cycle
//!
//! The decision steps are free functions over plain values so they can be
//! checked in isolation; [`ArbitrationEngine::recompute`] strings them
//! together with the collaborator calls.

use tracing::{debug, info, warn};

use super::{activation, ArbitrationEngine};
use crate::types::{display_set, AudioDevice, BluetoothStatus, DeviceSet};

/// What to do with the Bluetooth SCO link this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BluetoothAction {
    /// Request an SCO link
    Start,
    /// Release the SCO link
    Stop,
    /// Leave it alone
    Keep,
}

/// Devices available for the given inputs
///
/// A wired headset masks both the earpiece and the loudspeaker.
pub fn available_devices(status: BluetoothStatus, has_wired_headset: bool, has_earpiece: bool) -> DeviceSet {
    let mut devices = DeviceSet::new();
    if status.offers_device() {
        devices.insert(AudioDevice::Bluetooth);
    }
    if has_wired_headset {
        devices.insert(AudioDevice::WiredHeadset);
    } else {
        devices.insert(AudioDevice::Speakerphone);
        if has_earpiece {
            devices.insert(AudioDevice::Earpiece);
        }
    }
    devices
}

/// Bring a possibly stale user choice in line with the current inputs
pub(crate) fn reconcile_user_selection(
    user_selected: AudioDevice,
    status: BluetoothStatus,
    has_wired_headset: bool,
) -> AudioDevice {
    match user_selected {
        AudioDevice::Bluetooth if status == BluetoothStatus::HeadsetUnavailable => AudioDevice::None,
        AudioDevice::Speakerphone if has_wired_headset => AudioDevice::WiredHeadset,
        AudioDevice::WiredHeadset if !has_wired_headset => AudioDevice::Speakerphone,
        other => other,
    }
}

/// Decide whether the SCO link must be started or stopped
///
/// Stop wins whenever both conditions hold.
pub fn bluetooth_action(status: BluetoothStatus, user_selected: AudioDevice) -> BluetoothAction {
    let user_allows_bluetooth = matches!(user_selected, AudioDevice::None | AudioDevice::Bluetooth);
    let start = status == BluetoothStatus::HeadsetAvailable && user_allows_bluetooth;
    let stop = status.is_sco_active() && !user_allows_bluetooth;

    if stop {
        BluetoothAction::Stop
    } else if start {
        BluetoothAction::Start
    } else {
        BluetoothAction::Keep
    }
}

/// Pick the active device by fixed priority: SCO link, wired headset, default
pub fn resolve_device(status: BluetoothStatus, has_wired_headset: bool, default_device: AudioDevice) -> AudioDevice {
    match (status, has_wired_headset) {
        (BluetoothStatus::ScoConnected, _) => AudioDevice::Bluetooth,
        (_, true) => AudioDevice::WiredHeadset,
        (_, false) => default_device,
    }
}

impl ArbitrationEngine {
    /// Run one arbitration cycle
    ///
    /// Idempotent: with no input change in between, a second call neither
    /// toggles hardware nor notifies the sink.
    pub fn recompute(&mut self) {
        if self.bluetooth.status().needs_refresh() {
            self.bluetooth.refresh();
        }

        let previous = std::mem::take(&mut self.state.available);
        let wired = self.state.has_wired_headset;
        let status = self.bluetooth.status();
        self.state.available = available_devices(status, wired, self.has_earpiece);
        debug!(
            "Arbitration cycle: bluetooth={}, wired={}, available={}, selected={}, user={}",
            status,
            wired,
            display_set(&self.state.available),
            self.state.selected,
            self.state.user_selected
        );

        let user_selected = reconcile_user_selection(self.state.user_selected, status, wired);
        if user_selected != self.state.user_selected {
            debug!(
                "User selected device reconciled: {} -> {}",
                self.state.user_selected, user_selected
            );
            self.state.user_selected = user_selected;
        }

        match bluetooth_action(status, user_selected) {
            BluetoothAction::Stop => {
                info!("Stopping Bluetooth SCO audio (user selected {})", user_selected);
                self.bluetooth.stop_sco();
                self.bluetooth.refresh();
                self.state.available = available_devices(self.bluetooth.status(), wired, self.has_earpiece);
            }
            BluetoothAction::Start => {
                info!("Starting Bluetooth SCO audio");
                if !self.bluetooth.start_sco() {
                    warn!("Bluetooth SCO start failed, dropping bluetooth from available devices");
                    self.state.available.remove(&AudioDevice::Bluetooth);
                }
            }
            BluetoothAction::Keep => {}
        }

        let device_set_changed = self.state.available != previous;
        // Re-read after any SCO request. Only calls made above may have moved
        // the status since the set was built; see `BluetoothController`.
        let resolved = resolve_device(self.bluetooth.status(), wired, self.state.default_device);

        if resolved != self.state.selected || device_set_changed {
            self.commit_selection(resolved);
        }
    }

    /// Activate `device`, record it and notify the sink
    ///
    /// # Panics
    ///
    /// If `device` is not in the available set. The cycle guarantees
    /// membership, so this only fires on a logic error.
    pub(super) fn commit_selection(&mut self, device: AudioDevice) {
        assert!(
            self.state.available.contains(&device),
            "audio device {} selected but not available in {}",
            device,
            display_set(&self.state.available)
        );

        activation::activate(self.platform.as_ref(), device);
        self.state.selected = device;
        info!(
            "Audio device selected: {} (available: {})",
            device,
            display_set(&self.state.available)
        );

        if let Some(sink) = &self.sink {
            sink.on_selection_changed(device, &self.state.available);
        }
    }
}
