//! Audio route manager
//!
//! The manager runs the [`ArbitrationEngine`] on a single Tokio task. Every
//! input (API calls on the [`AudioRouteManager`] handle and collaborator
//! notifications through a [`RouteNotifier`]) is a message on one unbounded
//! queue, so arbitration cycles never overlap and a notification arriving
//! mid-cycle is handled after the cycle completes.
//!
//! # Lifecycle
//!
//! ```text
//!  Uninitialized ──start──► Running ──stop──► Uninitialized
//! ```
//!
//! Starting saves the platform speakerphone, microphone mute and audio mode,
//! switches to communication mode, starts the Bluetooth collaborator, runs
//! the first cycle and registers the headset jack and (in `auto` mode) the
//! proximity sensor. Stopping undoes all of that in reverse.
//!
//! # Example
//!
//! ```rust
//! use rvoip_audio_route_core::mock::MockEnvironment;
//! use rvoip_audio_route_core::{AudioDevice, AudioRouteConfig, AudioRouteManager, SpeakerphoneMode};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = MockEnvironment::new(true);
//! let config = AudioRouteConfig::new().with_speakerphone_mode(SpeakerphoneMode::ForcedFalse);
//! let manager = AudioRouteManager::spawn(config, env.collaborators())?;
//!
//! manager.start().await?;
//! assert_eq!(manager.selected_audio_device().await?, AudioDevice::Earpiece);
//!
//! manager.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::AudioRouteConfig;
use crate::engine::{set_microphone_mute, set_speakerphone, ArbitrationEngine, ArbitrationState};
use crate::error::{AudioRouteError, AudioRouteResult};
use crate::events::{EventEmitter, EventStream, RouteEvent, SelectionSink};
use crate::platform::{AudioRouteCollaborators, SavedAudioSettings};
use crate::types::{AudioDevice, AudioMode, DeviceSet, ManagerLifecycleState};

/// Messages processed by the control task
pub(crate) enum Command {
    Start(oneshot::Sender<()>),
    Stop(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
    SelectDevice(AudioDevice, oneshot::Sender<()>),
    SetDefaultDevice(AudioDevice, oneshot::Sender<()>),
    SetSelectionSink(Option<Box<dyn SelectionSink>>, oneshot::Sender<()>),
    Snapshot(oneshot::Sender<ArbitrationState>),
    LifecycleState(oneshot::Sender<ManagerLifecycleState>),
    BluetoothStatusChanged,
    HeadsetPlugChanged(bool),
    ProximityChanged(bool),
}

/// Handle collaborators use to push notifications to the manager
///
/// Cheap to clone and safe to call from any thread. A notifier does not keep
/// the control task alive: once every [`AudioRouteManager`] handle is dropped
/// the task stops the manager and ends, and every method returns `false`.
#[derive(Clone)]
pub struct RouteNotifier {
    sender: mpsc::WeakUnboundedSender<Command>,
}

impl RouteNotifier {
    /// The Bluetooth collaborator's status changed
    pub fn bluetooth_status_changed(&self) -> bool {
        self.send(Command::BluetoothStatusChanged)
    }

    /// A wired headset was plugged in or removed
    pub fn headset_plug_changed(&self, plugged: bool) -> bool {
        self.send(Command::HeadsetPlugChanged(plugged))
    }

    /// The proximity sensor reported near or far
    pub fn proximity_changed(&self, is_near: bool) -> bool {
        self.send(Command::ProximityChanged(is_near))
    }

    /// Whether the control task has ended or is about to
    pub fn is_closed(&self) -> bool {
        self.sender.upgrade().map_or(true, |sender| sender.is_closed())
    }

    fn send(&self, command: Command) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(command).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for RouteNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNotifier")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Forwards selection changes to the broadcast channel and the user listener
struct BroadcastSink {
    emitter: EventEmitter,
    listener: Option<Box<dyn SelectionSink>>,
}

impl SelectionSink for BroadcastSink {
    fn on_selection_changed(&self, selected: AudioDevice, available: &DeviceSet) {
        self.emitter.emit(RouteEvent::SelectionChanged {
            selected,
            available: available.clone(),
        });
        if let Some(listener) = &self.listener {
            listener.on_selection_changed(selected, available);
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// State owned by the control task
struct RouteController {
    config: AudioRouteConfig,
    collaborators: AudioRouteCollaborators,
    engine: ArbitrationEngine,
    lifecycle: ManagerLifecycleState,
    saved_settings: Option<SavedAudioSettings>,
    proximity_started: bool,
    emitter: EventEmitter,
    sender: mpsc::WeakUnboundedSender<Command>,
}

impl RouteController {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        debug!("Audio route control task started");

        while let Some(command) = receiver.recv().await {
            if let Flow::Exit = self.handle(command) {
                break;
            }
        }

        if self.is_running() {
            self.stop();
        }
        debug!("Audio route control task finished");
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Start(ack) => {
                self.start();
                let _ = ack.send(());
            }
            Command::Stop(ack) => {
                self.stop();
                let _ = ack.send(());
            }
            Command::Shutdown(ack) => {
                if self.is_running() {
                    self.stop();
                }
                let _ = ack.send(());
                return Flow::Exit;
            }
            Command::SelectDevice(device, ack) => {
                if self.is_running() {
                    self.engine.select_user_device(device);
                } else {
                    warn!("Ignoring selection of {} while {}", device, self.lifecycle);
                }
                let _ = ack.send(());
            }
            Command::SetDefaultDevice(device, ack) => {
                if self.is_running() {
                    self.engine.set_default_device(device);
                } else {
                    self.engine.update_default_device(device);
                }
                let _ = ack.send(());
            }
            Command::SetSelectionSink(listener, ack) => {
                self.install_sink(listener);
                let _ = ack.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.state().clone());
            }
            Command::LifecycleState(reply) => {
                let _ = reply.send(self.lifecycle);
            }
            Command::BluetoothStatusChanged => {
                if self.is_running() {
                    self.engine.on_bluetooth_status_changed();
                } else {
                    debug!("Ignoring Bluetooth status change while {}", self.lifecycle);
                }
            }
            Command::HeadsetPlugChanged(plugged) => {
                if self.is_running() {
                    self.engine.on_headset_plug_changed(plugged);
                } else {
                    debug!("Ignoring headset plug change while {}", self.lifecycle);
                }
            }
            Command::ProximityChanged(is_near) => {
                if self.is_running() {
                    self.engine.on_proximity_changed(is_near);
                } else {
                    debug!("Ignoring proximity reading while {}", self.lifecycle);
                }
            }
        }
        Flow::Continue
    }

    fn is_running(&self) -> bool {
        self.lifecycle == ManagerLifecycleState::Running
    }

    fn notifier(&self) -> Option<RouteNotifier> {
        self.sender.upgrade().map(|sender| RouteNotifier {
            sender: sender.downgrade(),
        })
    }

    fn install_sink(&mut self, listener: Option<Box<dyn SelectionSink>>) {
        debug!(
            "Selection listener {}",
            if listener.is_some() { "installed" } else { "removed" }
        );
        self.engine.set_selection_sink(Some(Box::new(BroadcastSink {
            emitter: self.emitter.clone(),
            listener,
        })));
    }

    fn start(&mut self) {
        if self.is_running() {
            warn!("Audio route manager already running");
            return;
        }
        let Some(notifier) = self.notifier() else {
            warn!("Audio route manager has no open handles, not starting");
            return;
        };
        info!(
            "Starting audio route manager (speakerphone mode: {})",
            self.config.speakerphone_mode
        );

        let platform = self.collaborators.platform.clone();
        self.saved_settings = Some(SavedAudioSettings::capture(platform.as_ref()));

        if platform.request_audio_focus() {
            debug!("Audio focus request granted for voice call");
        } else {
            warn!("Audio focus request failed");
        }
        if self.config.manage_audio_mode {
            platform.set_mode(AudioMode::InCommunication);
        }
        if self.config.unmute_microphone_on_start {
            set_microphone_mute(platform.as_ref(), false);
        }

        self.engine.reset();
        self.lifecycle = ManagerLifecycleState::Running;
        self.emitter.emit(RouteEvent::Started);

        if !self.collaborators.bluetooth.start(notifier.clone()) {
            warn!("Bluetooth hands-free is not available");
        }

        let plugged = self.collaborators.headset.is_plugged();
        self.engine.on_headset_plug_changed(plugged);
        self.collaborators.headset.register(notifier.clone());

        if self.config.speakerphone_mode.uses_proximity() {
            self.proximity_started = self.collaborators.proximity.start(notifier);
            if !self.proximity_started {
                debug!("No proximity sensor, proximity override disabled");
            }
        }

        info!(
            "Audio route manager started, selected {}",
            self.engine.selected_device()
        );
    }

    fn stop(&mut self) {
        if !self.is_running() {
            warn!("Trying to stop audio route manager in state {}", self.lifecycle);
            return;
        }
        info!("Stopping audio route manager");

        self.collaborators.headset.unregister();
        self.collaborators.bluetooth.stop();
        if self.proximity_started {
            self.collaborators.proximity.stop();
            self.proximity_started = false;
        }

        let platform = self.collaborators.platform.clone();
        if let Some(saved) = self.saved_settings.take() {
            set_speakerphone(platform.as_ref(), saved.speakerphone_on);
            set_microphone_mute(platform.as_ref(), saved.microphone_mute);
            if self.config.manage_audio_mode {
                platform.set_mode(saved.mode);
            }
        }
        platform.abandon_audio_focus();
        debug!("Abandoned audio focus");

        self.engine.reset();
        self.lifecycle = ManagerLifecycleState::Uninitialized;
        self.emitter.emit(RouteEvent::Stopped);
    }
}

/// Handle to a running audio route manager
///
/// Cloning the handle is cheap; all clones talk to the same control task.
/// Dropping the last clone stops a running manager and ends the task.
#[derive(Clone)]
pub struct AudioRouteManager {
    sender: mpsc::UnboundedSender<Command>,
    emitter: EventEmitter,
}

impl AudioRouteManager {
    /// Spawn the control task on the current Tokio runtime
    ///
    /// The manager starts out `Uninitialized`; call [`start`](Self::start)
    /// when the call begins.
    pub fn spawn(config: AudioRouteConfig, collaborators: AudioRouteCollaborators) -> AudioRouteResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            AudioRouteError::invalid_state("AudioRouteManager::spawn must be called within a Tokio runtime")
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let emitter = EventEmitter::new(config.event_channel_capacity);

        let mut engine = ArbitrationEngine::new(config.speakerphone_mode, &collaborators);
        engine.set_selection_sink(Some(Box::new(BroadcastSink {
            emitter: emitter.clone(),
            listener: None,
        })));

        let controller = RouteController {
            config,
            collaborators,
            engine,
            lifecycle: ManagerLifecycleState::Uninitialized,
            saved_settings: None,
            proximity_started: false,
            emitter: emitter.clone(),
            sender: sender.downgrade(),
        };
        runtime.spawn(controller.run(receiver));

        Ok(Self { sender, emitter })
    }

    /// Start routing call audio
    pub async fn start(&self) -> AudioRouteResult<()> {
        self.request(Command::Start).await
    }

    /// Stop routing and restore the platform audio settings
    pub async fn stop(&self) -> AudioRouteResult<()> {
        self.request(Command::Stop).await
    }

    /// Stop if running, then end the control task
    pub async fn shutdown(&self) -> AudioRouteResult<()> {
        self.request(Command::Shutdown).await
    }

    /// Explicitly select an output device
    ///
    /// Ignored unless the device is currently available.
    pub async fn select_audio_device(&self, device: AudioDevice) -> AudioRouteResult<()> {
        self.request(|ack| Command::SelectDevice(device, ack)).await
    }

    /// Change the default device (`Speakerphone` or `Earpiece`)
    pub async fn set_default_audio_device(&self, device: AudioDevice) -> AudioRouteResult<()> {
        self.request(|ack| Command::SetDefaultDevice(device, ack)).await
    }

    /// Install or remove the synchronous selection listener
    pub async fn set_selection_sink(&self, sink: Option<Box<dyn SelectionSink>>) -> AudioRouteResult<()> {
        self.request(|ack| Command::SetSelectionSink(sink, ack)).await
    }

    /// Copy of the current arbitration state
    pub async fn snapshot(&self) -> AudioRouteResult<ArbitrationState> {
        self.request(Command::Snapshot).await
    }

    /// Currently selected device
    pub async fn selected_audio_device(&self) -> AudioRouteResult<AudioDevice> {
        Ok(self.snapshot().await?.selected_device())
    }

    /// Currently available devices
    pub async fn audio_devices(&self) -> AudioRouteResult<DeviceSet> {
        Ok(self.snapshot().await?.available_devices().clone())
    }

    /// Current lifecycle state
    pub async fn lifecycle_state(&self) -> AudioRouteResult<ManagerLifecycleState> {
        self.request(Command::LifecycleState).await
    }

    /// A notifier for collaborators that are not registered by the manager
    pub fn notifier(&self) -> RouteNotifier {
        RouteNotifier {
            sender: self.sender.downgrade(),
        }
    }

    /// Subscribe to route events
    pub fn subscribe(&self) -> EventStream {
        self.emitter.subscribe()
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> AudioRouteResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .map_err(|_| AudioRouteError::ManagerClosed)?;
        reply_rx.await.map_err(|_| AudioRouteError::ManagerClosed)
    }
}
