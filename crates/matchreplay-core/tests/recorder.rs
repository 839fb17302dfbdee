use matchreplay_core::error::ReplayError;
use matchreplay_core::recorder::{Recorder, RecorderConfig, RecorderState};
use matchreplay_core::sensor::{FnSensors, NoSensors, ProviderError, StaticSensors};
use matchreplay_core::timeline::{decode_timeline, encode_timeline, SensorValue};
use pretty_assertions::assert_eq;

#[test]
fn test_throttle_rejects_early_samples() {
    let mut recorder = Recorder::new(RecorderConfig::new(10), Vec::new());
    recorder.start();

    let accepted: Vec<u64> = [0, 40, 90, 110, 150, 210]
        .into_iter()
        .filter(|&t| recorder.sample(t, 0.0, 0.0, 0.0, &mut NoSensors))
        .collect();

    assert_eq!(accepted, vec![0, 110, 210]);
    assert_eq!(recorder.frame_count(), 3);
}

#[test]
fn test_interval_measured_from_last_accepted_frame() {
    let mut recorder = Recorder::new(RecorderConfig::new(10), Vec::new());
    recorder.start();
    for t in (0..=1000).step_by(30) {
        recorder.sample(t, 0.0, 0.0, 0.0, &mut NoSensors);
    }
    let times: Vec<u64> = recorder.frames().iter().map(|f| f.time_ms).collect();
    assert_eq!(times, vec![0, 120, 240, 360, 480, 600, 720, 840, 960]);
}

#[test]
fn test_failing_channel_is_omitted() {
    let mut provider = FnSensors(|name: &str| match name {
        "arm" => Ok(SensorValue::Number(12.0)),
        "claw" => Err(ProviderError::ReadFailed {
            channel: name.to_string(),
            message: "i2c timeout".to_string(),
        }),
        other => Err(ProviderError::UnknownChannel(other.to_string())),
    });

    let mut recorder = Recorder::new(
        RecorderConfig::default(),
        vec!["arm".into(), "claw".into(), "ghost".into()],
    );
    recorder.start();
    assert!(recorder.sample(0, 1.0, 2.0, 3.0, &mut provider));

    let frame = &recorder.frames()[0];
    assert_eq!(frame.sensors.len(), 1);
    assert_eq!(frame.sensors["arm"], SensorValue::Number(12.0));
}

#[test]
fn test_stop_keeps_frames_for_export() {
    let mut sensors = StaticSensors::new();
    sensors.set("stage", "auto");

    let mut recorder = Recorder::new(RecorderConfig::new(5), vec!["stage".into()]);
    recorder.start();
    recorder.sample(0, 0.0, 0.0, 0.0, &mut sensors);
    sensors.set("stage", "teleop");
    recorder.sample(200, 10.0, 5.0, 45.0, &mut sensors);
    recorder.stop();

    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.duration_ms(), 200);

    let timeline = recorder.export_at("3796", "Qual 7", 1_700_000_000_000).unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.metadata().owner_label, "3796");
    assert_eq!(timeline.metadata().session_label, "Qual 7");
    assert_eq!(timeline.metadata().created_at_epoch_ms, 1_700_000_000_000);
    assert_eq!(
        timeline.frames()[1].sensors["stage"],
        SensorValue::Text("teleop".into())
    );
}

#[test]
fn test_export_without_frames() {
    let recorder = Recorder::default();
    let err = recorder.export("3796", "Qual 7").unwrap_err();
    assert!(matches!(err, ReplayError::EmptyTimeline));
    assert!(err.is_unplayable());
}

#[test]
fn test_glitched_readings_keep_recording_loadable() {
    let mut sensors = StaticSensors::new();
    sensors.set("imuRate", f64::NAN);
    sensors.set("arm", 3);

    let mut recorder = Recorder::new(
        RecorderConfig::new(10),
        vec!["imuRate".into(), "arm".into()],
    );
    recorder.start();
    assert!(!recorder.sample(0, 1.0, 2.0, f64::NAN, &mut sensors));
    assert!(recorder.sample(5, 1.0, 2.0, 90.0, &mut sensors));
    assert!(!recorder.sample(105, 1.5, 2.5, f64::NEG_INFINITY, &mut sensors));
    recorder.stop();

    assert_eq!(recorder.frame_count(), 1);
    assert!(!recorder.frames()[0].sensors.contains_key("imuRate"));

    let timeline = recorder.export_at("3796", "glitch", 0).unwrap();
    let json = encode_timeline(&timeline).unwrap();
    assert!(!json.contains("null"));
    assert_eq!(decode_timeline(&json).unwrap(), timeline);
}
