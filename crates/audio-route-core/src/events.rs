//! Selection listener and route event broadcasting
//!
//! There are two ways to observe the arbitration result:
//!
//! - a single [`SelectionSink`], called synchronously on the control task at
//!   the end of every cycle that changed the selection or the device set;
//! - a broadcast [`EventStream`] of [`RouteEvent`]s for any number of async
//!   subscribers, fed by the manager.

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::config::DEFAULT_EVENT_CHANNEL_CAPACITY;
use crate::types::{AudioDevice, DeviceSet};

/// Receiver of selection changes
///
/// Closures of the form `Fn(AudioDevice, &DeviceSet)` implement this trait.
///
/// ```rust
/// use rvoip_audio_route_core::{AudioDevice, DeviceSet, SelectionSink};
///
/// let sink = |selected: AudioDevice, available: &DeviceSet| {
///     println!("routing to {} out of {} devices", selected, available.len());
/// };
/// sink.on_selection_changed(AudioDevice::Earpiece, &DeviceSet::new());
/// ```
pub trait SelectionSink: Send {
    /// Called with the newly selected device and the current device set
    fn on_selection_changed(&self, selected: AudioDevice, available: &DeviceSet);
}

impl<F> SelectionSink for F
where
    F: Fn(AudioDevice, &DeviceSet) + Send,
{
    fn on_selection_changed(&self, selected: AudioDevice, available: &DeviceSet) {
        self(selected, available)
    }
}

/// Events published by the audio route manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// The manager entered the running state
    Started,

    /// The selected device or the device set changed
    SelectionChanged {
        /// Active output
        selected: AudioDevice,
        /// All outputs currently available
        available: DeviceSet,
    },

    /// The manager stopped and restored the platform audio settings
    Stopped,
}

/// Event stream type
pub type EventStream = BroadcastStream<RouteEvent>;

/// Broadcast emitter for route events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<RouteEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: RouteEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Get the number of active receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}
