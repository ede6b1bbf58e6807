//! Proximity sensor override
//!
//! With only the earpiece and the loudspeaker available, holding the phone
//! to the ear switches to the earpiece and taking it away switches back. The
//! override bypasses priority resolution but leaves the user choice and the
//! default untouched, so the next ordinary cycle supersedes it.

use tracing::debug;

use super::ArbitrationEngine;
use crate::types::{AudioDevice, DeviceSet};

/// Device the proximity reading asks for, if the override applies
pub fn proximity_target(available: &DeviceSet, is_near: bool) -> Option<AudioDevice> {
    let only_handset_pair = available.len() == 2
        && available.contains(&AudioDevice::Earpiece)
        && available.contains(&AudioDevice::Speakerphone);
    if !only_handset_pair {
        return None;
    }

    Some(if is_near {
        AudioDevice::Earpiece
    } else {
        AudioDevice::Speakerphone
    })
}

impl ArbitrationEngine {
    /// Proximity sensor reported near (`true`) or far (`false`)
    pub fn on_proximity_changed(&mut self, is_near: bool) {
        if !self.state.speakerphone_mode.uses_proximity() {
            debug!(
                "Ignoring proximity reading in speakerphone mode {}",
                self.state.speakerphone_mode
            );
            return;
        }

        let Some(target) = proximity_target(&self.state.available, is_near) else {
            debug!("Ignoring proximity reading, more than earpiece and speakerphone available");
            return;
        };

        debug!("Proximity sensor: {}", if is_near { "near" } else { "far" });
        if target != self.state.selected {
            self.commit_selection(target);
        }
    }
}
