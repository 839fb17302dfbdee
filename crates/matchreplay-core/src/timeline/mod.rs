//! Match timelines
//!
//! A timeline is the ordered list of frames captured during one recording
//! session, plus the labels identifying who recorded it and when.

mod format;

pub use format::{
    decode_timeline, default_replay_dir, encode_timeline, load_timeline, load_timeline_async,
    replay_file_name, save_timeline, save_timeline_async, ReplayFormat, REPLAY_EXTENSION,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ReplayError, Result};

/// A scalar sensor reading attached to a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// Boolean reading (limit switch, "intake running", ...)
    Flag(bool),
    /// Numeric reading (encoder counts, voltages, ...)
    Number(f64),
    /// Free text (state machine stage names, ...)
    Text(String),
}

impl SensorValue {
    /// Get as number, returning None if not numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SensorValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool, returning None if not a flag
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SensorValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    /// False for NaN or infinite numbers, which JSON cannot represent
    pub fn is_finite(&self) -> bool {
        match self {
            SensorValue::Number(v) => v.is_finite(),
            _ => true,
        }
    }

    /// Get as text, returning None if not text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SensorValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Flag(v) => write!(f, "{}", v),
            SensorValue::Number(v) => write!(f, "{}", v),
            SensorValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        SensorValue::Number(v)
    }
}

impl From<i32> for SensorValue {
    fn from(v: i32) -> Self {
        SensorValue::Number(v as f64)
    }
}

impl From<i64> for SensorValue {
    fn from(v: i64) -> Self {
        SensorValue::Number(v as f64)
    }
}

impl From<bool> for SensorValue {
    fn from(v: bool) -> Self {
        SensorValue::Flag(v)
    }
}

impl From<&str> for SensorValue {
    fn from(v: &str) -> Self {
        SensorValue::Text(v.to_string())
    }
}

impl From<String> for SensorValue {
    fn from(v: String) -> Self {
        SensorValue::Text(v)
    }
}

/// Named sensor readings of one frame. Keys may differ between frames.
pub type SensorValues = BTreeMap<String, SensorValue>;

/// Robot position (field inches) and heading (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Field X in inches
    pub x: f64,
    /// Field Y in inches
    pub y: f64,
    /// Heading as captured; not normalized
    pub heading: f64,
}

impl Pose {
    /// Create a pose from field coordinates and heading
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading.is_finite()
    }
}

/// One sampled instant
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Milliseconds since recording start
    pub time_ms: u64,
    /// Robot pose at `time_ms`
    pub pose: Pose,
    /// Sensor readings at `time_ms`
    pub sensors: SensorValues,
}

impl Frame {
    /// Create a frame without sensor readings
    pub fn new(time_ms: u64, pose: Pose) -> Self {
        Self {
            time_ms,
            pose,
            sensors: SensorValues::new(),
        }
    }

    /// Builder-style helper to attach a sensor reading
    pub fn with_sensor(mut self, name: impl Into<String>, value: impl Into<SensorValue>) -> Self {
        self.sensors.insert(name.into(), value.into());
        self
    }
}

/// Labels identifying a recording session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineMetadata {
    /// Team or robot that produced the recording
    pub owner_label: String,
    /// Match / session name
    pub session_label: String,
    /// Wall-clock creation time, milliseconds since the Unix epoch
    pub created_at_epoch_ms: i64,
}

impl TimelineMetadata {
    /// Create metadata from labels and an epoch-ms creation time
    pub fn new(
        owner_label: impl Into<String>,
        session_label: impl Into<String>,
        created_at_epoch_ms: i64,
    ) -> Self {
        Self {
            owner_label: owner_label.into(),
            session_label: session_label.into(),
            created_at_epoch_ms,
        }
    }
}

/// A sealed, playable recording. Always holds at least one frame and its
/// frame times never decrease.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    metadata: TimelineMetadata,
    frames: Vec<Frame>,
}

impl Timeline {
    /// Build a timeline, validating frame count, ordering and that every
    /// number can be written to a replay file
    pub fn from_parts(metadata: TimelineMetadata, frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(ReplayError::EmptyTimeline);
        }
        validate_order(&frames)?;
        validate_finite(&frames)?;
        Ok(Self { metadata, frames })
    }

    /// Labels identifying the session
    pub fn metadata(&self) -> &TimelineMetadata {
        &self.metadata
    }

    /// All frames, in time order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame at `index`, if any
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Get the number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed timeline; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time of the last frame
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map(|f| f.time_ms).unwrap_or_default()
    }

    /// Index of the last frame at or before `time_ms` (0 if none is)
    pub fn index_at_time(&self, time_ms: u64) -> usize {
        self.frames
            .partition_point(|f| f.time_ms <= time_ms)
            .saturating_sub(1)
    }

    /// Sorted union of every sensor key seen in any frame
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .frames
            .iter()
            .flat_map(|f| f.sensors.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Per-frame values of one channel; `None` where a frame lacks the key
    pub fn channel_values(&self, name: &str) -> Vec<Option<&SensorValue>> {
        self.frames.iter().map(|f| f.sensors.get(name)).collect()
    }
}

fn validate_order(frames: &[Frame]) -> Result<()> {
    for (index, pair) in frames.windows(2).enumerate() {
        if pair[1].time_ms < pair[0].time_ms {
            return Err(ReplayError::NonMonotonicTimeline {
                index: index + 1,
                previous_ms: pair[0].time_ms,
                time_ms: pair[1].time_ms,
            });
        }
    }
    Ok(())
}

fn validate_finite(frames: &[Frame]) -> Result<()> {
    for (index, frame) in frames.iter().enumerate() {
        if !frame.pose.is_finite() {
            return Err(ReplayError::MalformedTimeline(format!(
                "frame {}: non-finite pose {:?}",
                index, frame.pose
            )));
        }
        if let Some((name, _)) = frame.sensors.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ReplayError::MalformedTimeline(format!(
                "frame {}: non-finite value for '{}'",
                index, name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames() -> Vec<Frame> {
        vec![
            Frame::new(0, Pose::new(0.0, 0.0, 0.0)).with_sensor("lift", 10),
            Frame::new(100, Pose::new(1.0, 2.0, 45.0)).with_sensor("claw", true),
            Frame::new(100, Pose::new(1.5, 2.5, 50.0)),
            Frame::new(250, Pose::new(3.0, 4.0, 90.0)).with_sensor("lift", 12),
        ]
    }

    #[test]
    fn test_empty_timeline_rejected() {
        let err = Timeline::from_parts(TimelineMetadata::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, ReplayError::EmptyTimeline));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut frames = frames();
        frames.swap(1, 3);
        let err = Timeline::from_parts(TimelineMetadata::default(), frames).unwrap_err();
        match err {
            ReplayError::NonMonotonicTimeline {
                index,
                previous_ms,
                time_ms,
            } => {
                assert_eq!(index, 2);
                assert_eq!(previous_ms, 250);
                assert_eq!(time_ms, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut bad_pose = frames();
        bad_pose[2].pose.heading = f64::NAN;
        match Timeline::from_parts(TimelineMetadata::default(), bad_pose).unwrap_err() {
            ReplayError::MalformedTimeline(msg) => assert!(msg.starts_with("frame 2"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }

        let mut bad_sensor = frames();
        bad_sensor[0]
            .sensors
            .insert("lift".into(), SensorValue::Number(f64::INFINITY));
        let err = Timeline::from_parts(TimelineMetadata::default(), bad_sensor).unwrap_err();
        assert!(matches!(err, ReplayError::MalformedTimeline(_)));
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let timeline = Timeline::from_parts(TimelineMetadata::default(), frames()).unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.duration_ms(), 250);
    }

    #[test]
    fn test_heterogeneous_channels() {
        let timeline = Timeline::from_parts(TimelineMetadata::default(), frames()).unwrap();
        assert_eq!(timeline.channel_names(), vec!["claw", "lift"]);

        let lift = timeline.channel_values("lift");
        assert_eq!(lift.len(), 4);
        assert_eq!(lift[0].and_then(SensorValue::as_number), Some(10.0));
        assert!(lift[1].is_none());
        assert_eq!(lift[3].and_then(SensorValue::as_number), Some(12.0));
    }

    #[test]
    fn test_index_at_time() {
        let timeline = Timeline::from_parts(TimelineMetadata::default(), frames()).unwrap();
        assert_eq!(timeline.index_at_time(0), 0);
        assert_eq!(timeline.index_at_time(50), 0);
        assert_eq!(timeline.index_at_time(100), 2);
        assert_eq!(timeline.index_at_time(249), 2);
        assert_eq!(timeline.index_at_time(250), 3);
        assert_eq!(timeline.index_at_time(10_000), 3);
    }
}
