//! In-memory collaborators
//!
//! Scriptable implementations of every collaborator trait, used by the test
//! suite and handy for embedders who want to drive the manager without real
//! hardware. Each mock records how often it was called.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::ArbitrationEngine;
use crate::manager::RouteNotifier;
use crate::platform::{
    AudioRouteCollaborators, BluetoothController, HeadsetMonitor, HostCapabilities, PlatformAudio,
    ProximityMonitor,
};
use crate::types::{AudioMode, BluetoothStatus, SpeakerphoneMode};

#[derive(Debug)]
struct BluetoothInner {
    status: BluetoothStatus,
    headset_connected: bool,
    sco_start_succeeds: bool,
    stop_is_asynchronous: bool,
    status_after_failed_start: Option<BluetoothStatus>,
    running: bool,
    start_sco_calls: usize,
    stop_sco_calls: usize,
    refresh_calls: usize,
}

/// Scriptable Bluetooth hands-free collaborator
///
/// `refresh` settles the unsettled states from whether a headset is
/// connected. A successful `start_sco` moves to `ScoConnecting`; the test
/// then brings the link up with [`set_status`](Self::set_status).
pub struct MockBluetooth {
    inner: Mutex<BluetoothInner>,
    notifier: Mutex<Option<RouteNotifier>>,
}

impl MockBluetooth {
    /// No adapter state yet
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BluetoothInner {
                status: BluetoothStatus::NoDevice,
                headset_connected: false,
                sco_start_succeeds: true,
                stop_is_asynchronous: false,
                status_after_failed_start: None,
                running: false,
                start_sco_calls: 0,
                stop_sco_calls: 0,
                refresh_calls: 0,
            }),
            notifier: Mutex::new(None),
        }
    }

    /// Force a status
    pub fn set_status(&self, status: BluetoothStatus) {
        self.inner.lock().status = status;
    }

    /// A headset connects and becomes available
    pub fn connect_headset(&self) {
        let mut inner = self.inner.lock();
        inner.headset_connected = true;
        inner.status = BluetoothStatus::HeadsetAvailable;
    }

    /// The headset goes away
    pub fn disconnect_headset(&self) {
        let mut inner = self.inner.lock();
        inner.headset_connected = false;
        inner.status = BluetoothStatus::HeadsetUnavailable;
    }

    /// Whether `start_sco` reports success
    pub fn set_sco_start_succeeds(&self, succeeds: bool) {
        self.inner.lock().sco_start_succeeds = succeeds;
    }

    /// Keep the link up after `stop_sco` until told otherwise
    pub fn set_stop_is_asynchronous(&self, asynchronous: bool) {
        self.inner.lock().stop_is_asynchronous = asynchronous;
    }

    /// Status to switch to when `start_sco` fails
    pub fn set_status_after_failed_start(&self, status: Option<BluetoothStatus>) {
        self.inner.lock().status_after_failed_start = status;
    }

    /// Push a status change notification to the manager
    pub fn notify_status_changed(&self) -> bool {
        match self.notifier.lock().as_ref() {
            Some(notifier) => notifier.bluetooth_status_changed(),
            None => false,
        }
    }

    /// Whether `start` was called without a matching `stop`
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// Number of `start_sco` calls
    pub fn start_sco_calls(&self) -> usize {
        self.inner.lock().start_sco_calls
    }

    /// Number of `stop_sco` calls
    pub fn stop_sco_calls(&self) -> usize {
        self.inner.lock().stop_sco_calls
    }

    /// Number of `refresh` calls
    pub fn refresh_calls(&self) -> usize {
        self.inner.lock().refresh_calls
    }
}

impl Default for MockBluetooth {
    fn default() -> Self {
        Self::new()
    }
}

impl BluetoothController for MockBluetooth {
    fn start(&self, notifier: RouteNotifier) -> bool {
        self.inner.lock().running = true;
        *self.notifier.lock() = Some(notifier);
        true
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        inner.status = BluetoothStatus::NoDevice;
        self.notifier.lock().take();
    }

    fn status(&self) -> BluetoothStatus {
        self.inner.lock().status
    }

    fn refresh(&self) {
        let mut inner = self.inner.lock();
        inner.refresh_calls += 1;
        if inner.status.needs_refresh() {
            inner.status = if inner.headset_connected {
                BluetoothStatus::HeadsetAvailable
            } else {
                BluetoothStatus::HeadsetUnavailable
            };
        }
    }

    fn start_sco(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.start_sco_calls += 1;
        if inner.sco_start_succeeds {
            inner.status = BluetoothStatus::ScoConnecting;
            true
        } else {
            if let Some(status) = inner.status_after_failed_start {
                inner.status = status;
            }
            false
        }
    }

    fn stop_sco(&self) {
        let mut inner = self.inner.lock();
        inner.stop_sco_calls += 1;
        if !inner.stop_is_asynchronous {
            inner.status = BluetoothStatus::ScoDisconnecting;
        }
    }
}

/// Wired headset jack
pub struct MockHeadset {
    plugged: Mutex<bool>,
    notifier: Mutex<Option<RouteNotifier>>,
}

impl MockHeadset {
    /// Unplugged, unregistered
    pub fn new() -> Self {
        Self {
            plugged: Mutex::new(false),
            notifier: Mutex::new(None),
        }
    }

    /// Plug or unplug; notifies the manager when registered
    pub fn set_plugged(&self, plugged: bool) -> bool {
        *self.plugged.lock() = plugged;
        match self.notifier.lock().as_ref() {
            Some(notifier) => notifier.headset_plug_changed(plugged),
            None => false,
        }
    }

    /// Whether a notifier is registered
    pub fn is_registered(&self) -> bool {
        self.notifier.lock().is_some()
    }
}

impl Default for MockHeadset {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadsetMonitor for MockHeadset {
    fn is_plugged(&self) -> bool {
        *self.plugged.lock()
    }

    fn register(&self, notifier: RouteNotifier) {
        *self.notifier.lock() = Some(notifier);
    }

    fn unregister(&self) {
        self.notifier.lock().take();
    }
}

/// Proximity sensor
pub struct MockProximity {
    notifier: Mutex<Option<RouteNotifier>>,
}

impl MockProximity {
    /// Stopped sensor
    pub fn new() -> Self {
        Self {
            notifier: Mutex::new(None),
        }
    }

    /// Report a reading; `false` when the sensor is not started
    pub fn report(&self, is_near: bool) -> bool {
        match self.notifier.lock().as_ref() {
            Some(notifier) => notifier.proximity_changed(is_near),
            None => false,
        }
    }

    /// Whether the sensor is started
    pub fn is_started(&self) -> bool {
        self.notifier.lock().is_some()
    }
}

impl Default for MockProximity {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityMonitor for MockProximity {
    fn start(&self, notifier: RouteNotifier) -> bool {
        *self.notifier.lock() = Some(notifier);
        true
    }

    fn stop(&self) {
        self.notifier.lock().take();
    }
}

/// Host with or without telephony hardware
pub struct MockHost {
    telephony: bool,
}

impl MockHost {
    /// Host reporting the given telephony capability
    pub fn new(telephony: bool) -> Self {
        Self { telephony }
    }
}

impl HostCapabilities for MockHost {
    fn has_telephony_feature(&self) -> bool {
        self.telephony
    }
}

#[derive(Debug)]
struct PlatformInner {
    speakerphone_on: bool,
    microphone_mute: bool,
    mode: AudioMode,
    focus_held: bool,
    speakerphone_toggles: usize,
    microphone_mute_calls: usize,
}

/// Platform audio service
pub struct MockPlatformAudio {
    inner: Mutex<PlatformInner>,
}

impl MockPlatformAudio {
    /// Speaker off, microphone unmuted, normal mode
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PlatformInner {
                speakerphone_on: false,
                microphone_mute: false,
                mode: AudioMode::Normal,
                focus_held: false,
                speakerphone_toggles: 0,
                microphone_mute_calls: 0,
            }),
        }
    }

    /// Preset the platform settings a call starts from
    pub fn preset(&self, speakerphone_on: bool, microphone_mute: bool, mode: AudioMode) {
        let mut inner = self.inner.lock();
        inner.speakerphone_on = speakerphone_on;
        inner.microphone_mute = microphone_mute;
        inner.mode = mode;
    }

    /// Number of `set_speakerphone_on` calls
    pub fn speakerphone_toggles(&self) -> usize {
        self.inner.lock().speakerphone_toggles
    }

    /// Number of `set_microphone_mute` calls
    pub fn microphone_mute_calls(&self) -> usize {
        self.inner.lock().microphone_mute_calls
    }

    /// Whether audio focus is held
    pub fn has_audio_focus(&self) -> bool {
        self.inner.lock().focus_held
    }
}

impl Default for MockPlatformAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAudio for MockPlatformAudio {
    fn is_speakerphone_on(&self) -> bool {
        self.inner.lock().speakerphone_on
    }

    fn set_speakerphone_on(&self, on: bool) {
        let mut inner = self.inner.lock();
        inner.speakerphone_toggles += 1;
        inner.speakerphone_on = on;
    }

    fn is_microphone_mute(&self) -> bool {
        self.inner.lock().microphone_mute
    }

    fn set_microphone_mute(&self, mute: bool) {
        let mut inner = self.inner.lock();
        inner.microphone_mute_calls += 1;
        inner.microphone_mute = mute;
    }

    fn mode(&self) -> AudioMode {
        self.inner.lock().mode
    }

    fn set_mode(&self, mode: AudioMode) {
        self.inner.lock().mode = mode;
    }

    fn request_audio_focus(&self) -> bool {
        self.inner.lock().focus_held = true;
        true
    }

    fn abandon_audio_focus(&self) {
        self.inner.lock().focus_held = false;
    }
}

/// A full set of mocks with typed access to each one
#[derive(Clone)]
pub struct MockEnvironment {
    /// Bluetooth collaborator
    pub bluetooth: Arc<MockBluetooth>,
    /// Headset jack
    pub headset: Arc<MockHeadset>,
    /// Proximity sensor
    pub proximity: Arc<MockProximity>,
    /// Host capabilities
    pub host: Arc<MockHost>,
    /// Platform audio service
    pub platform: Arc<MockPlatformAudio>,
}

impl MockEnvironment {
    /// Fresh mocks; `telephony` decides whether the host has an earpiece
    pub fn new(telephony: bool) -> Self {
        Self {
            bluetooth: Arc::new(MockBluetooth::new()),
            headset: Arc::new(MockHeadset::new()),
            proximity: Arc::new(MockProximity::new()),
            host: Arc::new(MockHost::new(telephony)),
            platform: Arc::new(MockPlatformAudio::new()),
        }
    }

    /// The mocks as trait objects
    pub fn collaborators(&self) -> AudioRouteCollaborators {
        AudioRouteCollaborators {
            bluetooth: self.bluetooth.clone(),
            headset: self.headset.clone(),
            proximity: self.proximity.clone(),
            host: self.host.clone(),
            platform: self.platform.clone(),
        }
    }

    /// An engine wired to these mocks
    pub fn engine(&self, mode: SpeakerphoneMode) -> ArbitrationEngine {
        ArbitrationEngine::new(mode, &self.collaborators())
    }
}
