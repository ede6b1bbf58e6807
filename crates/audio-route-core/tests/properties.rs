//! Invariants over random event sequences

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use rvoip_audio_route_core::mock::MockEnvironment;
use rvoip_audio_route_core::platform::PlatformAudio;
use rvoip_audio_route_core::{ArbitrationEngine, AudioDevice, BluetoothStatus, DeviceSet, SpeakerphoneMode};

#[derive(Debug, Clone)]
enum Event {
    Plug(bool),
    ConnectBluetooth,
    DisconnectBluetooth,
    BluetoothStatus(BluetoothStatus),
    ScoStartSucceeds(bool),
    Select(AudioDevice),
    SetDefault(AudioDevice),
    Proximity(bool),
}

fn device() -> impl Strategy<Value = AudioDevice> {
    prop_oneof![
        Just(AudioDevice::Speakerphone),
        Just(AudioDevice::WiredHeadset),
        Just(AudioDevice::Earpiece),
        Just(AudioDevice::Bluetooth),
        Just(AudioDevice::None),
    ]
}

fn status() -> impl Strategy<Value = BluetoothStatus> {
    prop_oneof![
        Just(BluetoothStatus::NoDevice),
        Just(BluetoothStatus::HeadsetUnavailable),
        Just(BluetoothStatus::HeadsetAvailable),
        Just(BluetoothStatus::ScoConnecting),
        Just(BluetoothStatus::ScoConnected),
        Just(BluetoothStatus::ScoDisconnecting),
    ]
}

fn mode() -> impl Strategy<Value = SpeakerphoneMode> {
    prop_oneof![
        Just(SpeakerphoneMode::Auto),
        Just(SpeakerphoneMode::ForcedTrue),
        Just(SpeakerphoneMode::ForcedFalse),
    ]
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        any::<bool>().prop_map(Event::Plug),
        Just(Event::ConnectBluetooth),
        Just(Event::DisconnectBluetooth),
        status().prop_map(Event::BluetoothStatus),
        any::<bool>().prop_map(Event::ScoStartSucceeds),
        device().prop_map(Event::Select),
        device().prop_map(Event::SetDefault),
        any::<bool>().prop_map(Event::Proximity),
    ]
}

fn apply(env: &MockEnvironment, engine: &mut ArbitrationEngine, event: &Event) {
    match event {
        Event::Plug(plugged) => engine.on_headset_plug_changed(*plugged),
        Event::ConnectBluetooth => {
            env.bluetooth.connect_headset();
            engine.on_bluetooth_status_changed();
        }
        Event::DisconnectBluetooth => {
            env.bluetooth.disconnect_headset();
            engine.on_bluetooth_status_changed();
        }
        Event::BluetoothStatus(status) => {
            env.bluetooth.set_status(*status);
            engine.on_bluetooth_status_changed();
        }
        Event::ScoStartSucceeds(succeeds) => env.bluetooth.set_sco_start_succeeds(*succeeds),
        Event::Select(device) => engine.select_user_device(*device),
        Event::SetDefault(device) => engine.set_default_device(*device),
        Event::Proximity(is_near) => engine.on_proximity_changed(*is_near),
    }
}

fn counting_sink(engine: &mut ArbitrationEngine) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    engine.set_selection_sink(Some(Box::new(move |_selected: AudioDevice, _available: &DeviceSet| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));
    count
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn selection_stays_consistent(
        mode in mode(),
        telephony in any::<bool>(),
        events in prop::collection::vec(event(), 1..40),
    ) {
        let env = MockEnvironment::new(telephony);
        let mut engine = env.engine(mode);
        engine.on_headset_plug_changed(false);

        for event in &events {
            apply(&env, &mut engine, event);

            let state = engine.state();
            let available = state.available_devices();
            let selected = state.selected_device();

            prop_assert!(selected.is_some());
            prop_assert!(available.contains(&selected), "{:?} not in {:?}", selected, available);
            prop_assert_eq!(env.platform.is_speakerphone_on(), selected == AudioDevice::Speakerphone);

            if state.has_wired_headset() {
                prop_assert!(available.contains(&AudioDevice::WiredHeadset));
                prop_assert!(!available.contains(&AudioDevice::Speakerphone));
                prop_assert!(!available.contains(&AudioDevice::Earpiece));
            } else {
                prop_assert!(available.contains(&AudioDevice::Speakerphone));
                prop_assert!(!available.contains(&AudioDevice::WiredHeadset));
            }
            if !telephony {
                prop_assert!(!available.contains(&AudioDevice::Earpiece));
            }
            prop_assert!(matches!(
                state.default_device(),
                AudioDevice::Speakerphone | AudioDevice::Earpiece
            ));
        }
    }

    #[test]
    fn settled_cycle_is_idempotent(
        mode in mode(),
        telephony in any::<bool>(),
        events in prop::collection::vec(event(), 0..30),
    ) {
        let env = MockEnvironment::new(telephony);
        let mut engine = env.engine(mode);
        engine.on_headset_plug_changed(false);
        for event in &events {
            apply(&env, &mut engine, event);
        }

        // One cycle supersedes any proximity override
        engine.recompute();
        let before = engine.state().clone();
        let count = counting_sink(&mut engine);
        let toggles = env.platform.speakerphone_toggles();

        engine.recompute();

        prop_assert_eq!(engine.state(), &before);
        prop_assert_eq!(count.load(Ordering::SeqCst), 0);
        prop_assert_eq!(env.platform.speakerphone_toggles(), toggles);
    }
}
