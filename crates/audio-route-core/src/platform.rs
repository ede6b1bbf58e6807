//! Collaborator interfaces
//!
//! The arbitration engine does not talk to hardware directly. Everything it
//! reads or toggles goes through the traits in this module, which a host
//! application implements on top of its platform audio service, Bluetooth
//! stack, headset jack notifications and proximity sensor.
//!
//! All calls are synchronous and fire-and-forget from the engine's point of
//! view. Push notifications go back through the [`RouteNotifier`] handed to
//! the collaborator when it is started or registered; they are queued onto the
//! manager's control task and never touch the arbitration state directly.
//!
//! In-memory implementations live in [`crate::mock`].

use std::sync::Arc;

use crate::manager::RouteNotifier;
use crate::types::{AudioMode, BluetoothStatus};

/// Bluetooth hands-free collaborator
///
/// Owns the SCO connection state machine; the engine only reads the coarse
/// [`BluetoothStatus`] and asks for the SCO link to be started or stopped.
///
/// The engine reads [`status`](Self::status) more than once per cycle and
/// expects the answers to agree unless one of its own calls (`refresh`,
/// `start_sco`, `stop_sco`) moved the state. Transitions observed on other
/// threads must therefore be applied from the
/// [`RouteNotifier::bluetooth_status_changed`] path: record the new state,
/// notify, and let the control task pick it up on the next cycle. A status
/// that flips to `ScoConnected` in the middle of a cycle that did not offer
/// Bluetooth trips the engine's selection assertion.
pub trait BluetoothController: Send + Sync {
    /// Begin tracking headsets; `false` when there is no usable adapter
    fn start(&self, notifier: RouteNotifier) -> bool;

    /// Stop tracking and tear down any SCO link
    fn stop(&self);

    /// Current status
    fn status(&self) -> BluetoothStatus;

    /// Re-read the connected headset, updating [`status`](Self::status)
    fn refresh(&self);

    /// Request an SCO link; `false` if the request could not be issued
    fn start_sco(&self) -> bool;

    /// Release the SCO link
    fn stop_sco(&self);
}

/// Wired headset jack collaborator
pub trait HeadsetMonitor: Send + Sync {
    /// Whether a wired headset is plugged in right now
    fn is_plugged(&self) -> bool;

    /// Start delivering plug/unplug transitions to `notifier`
    fn register(&self, notifier: RouteNotifier);

    /// Stop delivering transitions
    fn unregister(&self);
}

/// Proximity sensor collaborator
pub trait ProximityMonitor: Send + Sync {
    /// Start delivering near/far transitions; `false` when no sensor exists
    fn start(&self, notifier: RouteNotifier) -> bool;

    /// Stop the sensor
    fn stop(&self);
}

/// Static capabilities of the host device
pub trait HostCapabilities: Send + Sync {
    /// Whether the host has telephony hardware, and therefore an earpiece
    fn has_telephony_feature(&self) -> bool;
}

/// Platform audio service
pub trait PlatformAudio: Send + Sync {
    /// Current state of the speakerphone flag
    fn is_speakerphone_on(&self) -> bool;

    /// Route call audio to the loudspeaker (`true`) or away from it
    fn set_speakerphone_on(&self, on: bool);

    /// Current microphone mute state
    fn is_microphone_mute(&self) -> bool;

    /// Mute or unmute the microphone
    fn set_microphone_mute(&self, mute: bool);

    /// Current audio mode
    fn mode(&self) -> AudioMode;

    /// Change the audio mode
    fn set_mode(&self, mode: AudioMode);

    /// Request call audio focus; the result is only logged
    fn request_audio_focus(&self) -> bool;

    /// Give up call audio focus
    fn abandon_audio_focus(&self);
}

/// The full set of collaborators a manager drives
#[derive(Clone)]
pub struct AudioRouteCollaborators {
    /// Bluetooth hands-free collaborator
    pub bluetooth: Arc<dyn BluetoothController>,
    /// Wired headset jack
    pub headset: Arc<dyn HeadsetMonitor>,
    /// Proximity sensor
    pub proximity: Arc<dyn ProximityMonitor>,
    /// Host capabilities
    pub host: Arc<dyn HostCapabilities>,
    /// Platform audio service
    pub platform: Arc<dyn PlatformAudio>,
}

/// Platform audio settings captured at start and restored at stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedAudioSettings {
    /// Speakerphone flag before start
    pub speakerphone_on: bool,
    /// Microphone mute before start
    pub microphone_mute: bool,
    /// Audio mode before start
    pub mode: AudioMode,
}

impl SavedAudioSettings {
    /// Capture the current platform settings
    pub fn capture(platform: &dyn PlatformAudio) -> Self {
        Self {
            speakerphone_on: platform.is_speakerphone_on(),
            microphone_mute: platform.is_microphone_mute(),
            mode: platform.mode(),
        }
    }
}
