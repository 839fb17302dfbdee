use matchreplay_core::error::ReplayError;
use matchreplay_core::timeline::{
    decode_timeline, encode_timeline, load_timeline, load_timeline_async, save_timeline,
    save_timeline_async, Frame, Pose, Timeline, TimelineMetadata,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn sample_timeline() -> Timeline {
    let frames = vec![
        Frame::new(0, Pose::new(72.0, 18.0, 90.0))
            .with_sensor("leftDriveEncoder", 0)
            .with_sensor("autoStage", "park"),
        Frame::new(100, Pose::new(72.5, 19.25, 91.5))
            .with_sensor("leftDriveEncoder", 113)
            .with_sensor("intakeRunning", true),
        Frame::new(100, Pose::new(73.0, 20.0, -12.75)),
        Frame::new(233, Pose::new(-1.5, 0.1, 359.9)).with_sensor("voltage", 12.61),
    ];
    Timeline::from_parts(TimelineMetadata::new("3796", "Qual 12", 1_712_345_678_901), frames)
        .unwrap()
}

#[test]
fn test_encode_decode_is_lossless() {
    let timeline = sample_timeline();
    let json = encode_timeline(&timeline).unwrap();
    let decoded = decode_timeline(&json).unwrap();
    assert_eq!(decoded, timeline);
}

#[test]
fn test_encoded_field_names() {
    let json = encode_timeline(&sample_timeline()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["team"], "3796");
    assert_eq!(value["match"], "Qual 12");
    assert_eq!(value["date"], 1_712_345_678_901_i64);
    let frame = &value["frames"][1];
    assert_eq!(frame["timeMs"], 100);
    assert_eq!(frame["heading"], 91.5);
    assert_eq!(frame["customData"]["intakeRunning"], true);
}

#[test]
fn test_decode_rejects_out_of_order_frames() {
    let json = r#"{"team": "1", "match": "m", "date": 0, "frames": [
        {"timeMs": 50, "x": 0, "y": 0, "heading": 0, "customData": {}},
        {"timeMs": 10, "x": 0, "y": 0, "heading": 0, "customData": {}}
    ]}"#;
    let err = decode_timeline(json).unwrap_err();
    assert!(matches!(err, ReplayError::NonMonotonicTimeline { index: 1, .. }));
    assert!(err.is_unplayable());
}

#[test]
fn test_empty_decode_is_unplayable() {
    let err = decode_timeline(r#"{"team": "", "match": "", "date": 0, "frames": []}"#)
        .unwrap_err();
    assert!(err.is_unplayable());
}

#[test]
fn test_save_and_load_file() {
    let dir = tempdir().unwrap();
    let timeline = sample_timeline();

    let path = save_timeline(dir.path().join("replays"), &timeline).unwrap();
    assert_eq!(path.file_name().unwrap(), "Qual 12.replay");

    let loaded = load_timeline(&path).unwrap();
    assert_eq!(loaded, timeline);
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = load_timeline(dir.path().join("nope.replay")).unwrap_err();
    assert!(matches!(err, ReplayError::Io(_)));
    assert!(!err.is_unplayable());
}

#[test]
fn test_load_garbage_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"frames\": [").unwrap();
    let err = load_timeline(&path).unwrap_err();
    assert!(matches!(err, ReplayError::MalformedTimeline(_)));
}

#[tokio::test]
async fn test_async_round_trip() {
    let dir = tempdir().unwrap();
    let timeline = sample_timeline();

    let path = save_timeline_async(dir.path(), &timeline).await.unwrap();
    let loaded = load_timeline_async(&path).await.unwrap();
    assert_eq!(loaded, timeline);
}
