//! Applying a device selection to the platform
//!
//! The only hardware toggle the engine owns is the speakerphone flag. Routing
//! to earpiece, wired headset or SCO is left to the platform once the flag is
//! off; the SCO link itself is managed by the arbitration cycle.

use tracing::{debug, trace};

use crate::platform::PlatformAudio;
use crate::types::AudioDevice;

/// Apply `device` by setting the speakerphone flag
pub(crate) fn activate(platform: &dyn PlatformAudio, device: AudioDevice) {
    let speakerphone_on = match device {
        AudioDevice::Speakerphone => true,
        AudioDevice::Earpiece | AudioDevice::WiredHeadset | AudioDevice::Bluetooth | AudioDevice::None => false,
    };
    set_speakerphone(platform, speakerphone_on);
}

/// Set the speakerphone flag unless it already has the wanted value
pub(crate) fn set_speakerphone(platform: &dyn PlatformAudio, on: bool) {
    if platform.is_speakerphone_on() == on {
        trace!("Speakerphone already {}", if on { "on" } else { "off" });
        return;
    }
    debug!("Setting speakerphone {}", if on { "on" } else { "off" });
    platform.set_speakerphone_on(on);
}

/// Set microphone mute unless it already has the wanted value
pub(crate) fn set_microphone_mute(platform: &dyn PlatformAudio, mute: bool) {
    if platform.is_microphone_mute() == mute {
        return;
    }
    debug!("Setting microphone mute {}", mute);
    platform.set_microphone_mute(mute);
}
