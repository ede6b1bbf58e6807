//! Manager lifecycle and notification plumbing

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::timeout;
use tokio_stream::StreamExt;

use rvoip_audio_route_core::mock::MockEnvironment;
use rvoip_audio_route_core::platform::{BluetoothController, PlatformAudio};
use rvoip_audio_route_core::{
    AudioDevice, AudioMode, AudioRouteConfig, AudioRouteError, AudioRouteManager, BluetoothStatus, DeviceSet,
    EventStream, ManagerLifecycleState, RouteEvent, SpeakerphoneMode,
};

fn spawn(env: &MockEnvironment, mode: SpeakerphoneMode) -> AudioRouteManager {
    let config = AudioRouteConfig::new().with_speakerphone_mode(mode);
    AudioRouteManager::spawn(config, env.collaborators()).unwrap()
}

async fn next_event(stream: &mut EventStream) -> RouteEvent {
    timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("timed out waiting for route event")
        .expect("event stream ended")
        .expect("event stream lagged")
}

#[tokio::test]
async fn test_start_saves_and_stop_restores_platform_settings() {
    let env = MockEnvironment::new(true);
    env.platform.preset(true, true, AudioMode::Normal);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);

    manager.start().await.unwrap();

    assert_eq!(manager.lifecycle_state().await.unwrap(), ManagerLifecycleState::Running);
    assert_eq!(env.platform.mode(), AudioMode::InCommunication);
    assert!(!env.platform.is_microphone_mute());
    assert!(!env.platform.is_speakerphone_on());
    assert!(env.platform.has_audio_focus());
    assert!(env.bluetooth.is_running());
    assert!(env.headset.is_registered());
    assert!(!env.proximity.is_started());
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Earpiece);

    manager.stop().await.unwrap();

    assert_eq!(manager.lifecycle_state().await.unwrap(), ManagerLifecycleState::Uninitialized);
    assert!(env.platform.is_speakerphone_on());
    assert!(env.platform.is_microphone_mute());
    assert_eq!(env.platform.mode(), AudioMode::Normal);
    assert!(!env.platform.has_audio_focus());
    assert!(!env.bluetooth.is_running());
    assert!(!env.headset.is_registered());

    let snapshot = manager.snapshot().await.unwrap();
    assert_eq!(snapshot.selected_device(), AudioDevice::None);
    assert!(snapshot.available_devices().is_empty());
    assert_eq!(snapshot.default_device(), AudioDevice::Earpiece);
}

#[tokio::test]
async fn test_second_start_does_not_resave_settings() {
    let env = MockEnvironment::new(true);
    env.platform.preset(true, false, AudioMode::Ringtone);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);

    manager.start().await.unwrap();
    manager.start().await.unwrap();
    manager.stop().await.unwrap();
    // Stopping twice is a logged no-op
    manager.stop().await.unwrap();

    assert!(env.platform.is_speakerphone_on());
    assert_eq!(env.platform.mode(), AudioMode::Ringtone);
    assert_eq!(manager.lifecycle_state().await.unwrap(), ManagerLifecycleState::Uninitialized);
}

#[tokio::test]
async fn test_event_stream_follows_lifecycle() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);
    let mut events = manager.subscribe();

    manager.start().await.unwrap();

    assert_eq!(next_event(&mut events).await, RouteEvent::Started);
    let expected: DeviceSet = [AudioDevice::Speakerphone, AudioDevice::Earpiece].into_iter().collect();
    assert_eq!(
        next_event(&mut events).await,
        RouteEvent::SelectionChanged {
            selected: AudioDevice::Earpiece,
            available: expected,
        }
    );

    env.headset.set_plugged(true);
    assert_eq!(
        next_event(&mut events).await,
        RouteEvent::SelectionChanged {
            selected: AudioDevice::WiredHeadset,
            available: [AudioDevice::WiredHeadset].into_iter().collect(),
        }
    );

    manager.stop().await.unwrap();
    assert_eq!(next_event(&mut events).await, RouteEvent::Stopped);
}

#[tokio::test]
async fn test_collaborator_notifications_drive_selection() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::Auto);
    manager.start().await.unwrap();
    assert!(env.proximity.is_started());
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Speakerphone);

    assert!(env.proximity.report(true));
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Earpiece);

    assert!(env.headset.set_plugged(true));
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::WiredHeadset);

    // Proximity has no say once the wired headset masks the handset pair
    assert!(env.proximity.report(false));
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::WiredHeadset);

    assert!(env.headset.set_plugged(false));
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Speakerphone);

    manager.stop().await.unwrap();
    assert!(!env.proximity.is_started());
    assert!(!env.proximity.report(true));
}

#[tokio::test]
async fn test_bluetooth_headset_through_notifier() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);
    manager.start().await.unwrap();

    env.bluetooth.connect_headset();
    assert!(env.bluetooth.notify_status_changed());
    let devices = manager.audio_devices().await.unwrap();
    assert!(devices.contains(&AudioDevice::Bluetooth));
    assert_eq!(env.bluetooth.status(), BluetoothStatus::ScoConnecting);
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Earpiece);

    env.bluetooth.set_status(BluetoothStatus::ScoConnected);
    assert!(env.bluetooth.notify_status_changed());
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Bluetooth);

    // User moves the call to the loudspeaker, which tears the link down
    manager.select_audio_device(AudioDevice::Speakerphone).await.unwrap();
    assert_eq!(env.bluetooth.stop_sco_calls(), 1);
    let snapshot = manager.snapshot().await.unwrap();
    assert_eq!(snapshot.user_selected_device(), AudioDevice::Speakerphone);
    assert_eq!(snapshot.selected_device(), AudioDevice::Earpiece);

    manager.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_notifications_ignored_while_stopped() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);

    let notifier = manager.notifier();
    assert!(notifier.headset_plug_changed(true));
    manager.select_audio_device(AudioDevice::Speakerphone).await.unwrap();

    let snapshot = manager.snapshot().await.unwrap();
    assert!(!snapshot.has_wired_headset());
    assert_eq!(snapshot.user_selected_device(), AudioDevice::None);
    assert_eq!(snapshot.selected_device(), AudioDevice::None);

    // Start reads the jack directly
    manager.start().await.unwrap();
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Earpiece);
}

#[tokio::test]
async fn test_selection_sink_receives_changes() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::ForcedFalse);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    manager
        .set_selection_sink(Some(Box::new(move |selected: AudioDevice, _available: &DeviceSet| {
            sink_seen.lock().push(selected);
        })))
        .await
        .unwrap();

    manager.start().await.unwrap();
    manager.set_default_audio_device(AudioDevice::Speakerphone).await.unwrap();
    assert_eq!(
        *seen.lock(),
        vec![AudioDevice::Earpiece, AudioDevice::Speakerphone]
    );

    manager.set_selection_sink(None).await.unwrap();
    manager.set_default_audio_device(AudioDevice::Earpiece).await.unwrap();
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::Earpiece);
}

#[tokio::test]
async fn test_audio_mode_left_alone_when_not_managed() {
    let env = MockEnvironment::new(true);
    env.platform.preset(false, true, AudioMode::Normal);
    let config = AudioRouteConfig::new()
        .with_manage_audio_mode(false)
        .with_unmute_microphone_on_start(false);
    let manager = AudioRouteManager::spawn(config, env.collaborators()).unwrap();

    manager.start().await.unwrap();
    assert_eq!(env.platform.mode(), AudioMode::Normal);
    assert!(env.platform.is_microphone_mute());
    assert_eq!(env.platform.microphone_mute_calls(), 0);

    manager.stop().await.unwrap();
    assert_eq!(env.platform.mode(), AudioMode::Normal);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let env = MockEnvironment::new(true);
    let manager = spawn(&env, SpeakerphoneMode::ForcedTrue);

    manager.start().await.unwrap();
    manager.stop().await.unwrap();
    env.headset.set_plugged(true);
    manager.start().await.unwrap();

    assert_eq!(manager.selected_audio_device().await.unwrap(), AudioDevice::WiredHeadset);
    assert!(!env.platform.is_speakerphone_on());
    manager.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_and_closes() {
    let env = MockEnvironment::new(true);
    env.platform.preset(false, false, AudioMode::Normal);
    let manager = spawn(&env, SpeakerphoneMode::ForcedTrue);
    let mut events = manager.subscribe();

    manager.start().await.unwrap();
    assert!(env.platform.is_speakerphone_on());

    manager.shutdown().await.unwrap();

    assert!(!env.platform.is_speakerphone_on());
    assert!(!env.bluetooth.is_running());
    assert_eq!(next_event(&mut events).await, RouteEvent::Started);
    assert!(matches!(next_event(&mut events).await, RouteEvent::SelectionChanged { .. }));
    assert_eq!(next_event(&mut events).await, RouteEvent::Stopped);
    assert!(matches!(
        manager.lifecycle_state().await,
        Err(AudioRouteError::ManagerClosed)
    ));
}

#[tokio::test]
async fn test_dropping_last_handle_stops_running_manager() {
    let env = MockEnvironment::new(true);
    env.platform.preset(false, true, AudioMode::Normal);
    let manager = spawn(&env, SpeakerphoneMode::Auto);
    let notifier = manager.notifier();

    manager.start().await.unwrap();
    assert!(env.bluetooth.is_running());
    assert!(env.proximity.is_started());
    assert_eq!(env.platform.mode(), AudioMode::InCommunication);

    // Collaborators still hold notifiers; they must not keep the task alive
    drop(manager);
    timeout(Duration::from_secs(1), async {
        while env.bluetooth.is_running() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("control task kept running after the last handle was dropped");

    assert!(!env.headset.is_registered());
    assert!(!env.proximity.is_started());
    assert_eq!(env.platform.mode(), AudioMode::Normal);
    assert!(env.platform.is_microphone_mute());
    assert!(!env.platform.has_audio_focus());
    assert!(notifier.is_closed());
    assert!(!notifier.headset_plug_changed(true));
}
