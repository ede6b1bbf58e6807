//! Core value types shared by the arbitration engine and the manager
//!
//! Everything in this module is a small `Copy` value. The engine keeps the
//! available outputs in a [`DeviceSet`], an ordered set so that log lines and
//! listener notifications always list devices in the same order.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AudioRouteError;

/// A routable audio output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AudioDevice {
    /// Loudspeaker
    Speakerphone,
    /// Wired headset plugged into the jack
    WiredHeadset,
    /// Handset earpiece (telephony-capable hosts only)
    Earpiece,
    /// Bluetooth hands-free headset over an SCO link
    Bluetooth,
    /// No device chosen yet
    None,
}

impl AudioDevice {
    /// Whether this is a concrete output rather than [`AudioDevice::None`]
    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speakerphone => write!(f, "speakerphone"),
            Self::WiredHeadset => write!(f, "wired-headset"),
            Self::Earpiece => write!(f, "earpiece"),
            Self::Bluetooth => write!(f, "bluetooth"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Set of currently available audio outputs
pub type DeviceSet = BTreeSet<AudioDevice>;

/// Format a device set for log output, e.g. `[speakerphone, earpiece]`
pub(crate) fn display_set(devices: &DeviceSet) -> String {
    let names: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
    format!("[{}]", names.join(", "))
}

/// Coarse state reported by the Bluetooth hands-free collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BluetoothStatus {
    /// No Bluetooth adapter, or tracking has not started
    NoDevice,
    /// A headset is known but cannot carry call audio right now
    HeadsetUnavailable,
    /// A headset is connected and an SCO link can be requested
    HeadsetAvailable,
    /// SCO link requested, not yet established
    ScoConnecting,
    /// SCO link is carrying audio
    ScoConnected,
    /// SCO link is being torn down
    ScoDisconnecting,
}

impl BluetoothStatus {
    /// States in which the headset may have changed without a push notification
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            Self::HeadsetAvailable | Self::HeadsetUnavailable | Self::ScoDisconnecting
        )
    }

    /// Whether a Bluetooth output should be offered in this state
    pub fn offers_device(&self) -> bool {
        matches!(
            self,
            Self::ScoConnected | Self::ScoConnecting | Self::HeadsetAvailable
        )
    }

    /// Whether an SCO link is up or on its way up
    pub fn is_sco_active(&self) -> bool {
        matches!(self, Self::ScoConnected | Self::ScoConnecting)
    }
}

impl fmt::Display for BluetoothStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no-device"),
            Self::HeadsetUnavailable => write!(f, "headset-unavailable"),
            Self::HeadsetAvailable => write!(f, "headset-available"),
            Self::ScoConnecting => write!(f, "sco-connecting"),
            Self::ScoConnected => write!(f, "sco-connected"),
            Self::ScoDisconnecting => write!(f, "sco-disconnecting"),
        }
    }
}

/// Lifecycle of the audio route manager
///
/// Only `Uninitialized -> Running` (start) and `Running -> Uninitialized`
/// (stop) are legal. `Preinitialized` is never entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerLifecycleState {
    /// Not started, or stopped
    Uninitialized,
    /// Reserved
    Preinitialized,
    /// Started; arbitration cycles run
    Running,
}

impl fmt::Display for ManagerLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Preinitialized => write!(f, "preinitialized"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// User speakerphone preference
///
/// Serialized with the stored preference values `"auto"`, `"true"` and
/// `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpeakerphoneMode {
    /// Speakerphone by default; the proximity sensor may switch to earpiece
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Speakerphone by default, proximity sensor ignored
    #[serde(rename = "true")]
    ForcedTrue,
    /// Earpiece by default, proximity sensor ignored
    #[serde(rename = "false")]
    ForcedFalse,
}

impl SpeakerphoneMode {
    /// Default output implied by this preference, before the telephony check
    pub fn default_device(&self) -> AudioDevice {
        match self {
            Self::ForcedFalse => AudioDevice::Earpiece,
            Self::Auto | Self::ForcedTrue => AudioDevice::Speakerphone,
        }
    }

    /// Whether proximity readings may override the selection
    pub fn uses_proximity(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl fmt::Display for SpeakerphoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::ForcedTrue => write!(f, "true"),
            Self::ForcedFalse => write!(f, "false"),
        }
    }
}

impl FromStr for SpeakerphoneMode {
    type Err = AudioRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "true" => Ok(Self::ForcedTrue),
            "false" => Ok(Self::ForcedFalse),
            other => Err(AudioRouteError::config(format!(
                "Invalid speakerphone mode: {} (expected auto, true or false)",
                other
            ))),
        }
    }
}

/// Platform audio mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioMode {
    /// No call in progress
    Normal,
    /// Ringing
    Ringtone,
    /// Circuit-switched telephony call
    InCall,
    /// VoIP / video call
    InCommunication,
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Ringtone => write!(f, "ringtone"),
            Self::InCall => write!(f, "in-call"),
            Self::InCommunication => write!(f, "in-communication"),
        }
    }
}
