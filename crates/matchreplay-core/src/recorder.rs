//! Match recorder
//!
//! Turns the stream of pose updates coming from the robot loop into a
//! rate-limited list of frames. The recorder never schedules anything on its
//! own: the host calls [`Recorder::sample`] on every loop iteration and the
//! recorder decides whether enough time has passed to keep a new frame.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{ReplayError, Result};
use crate::sensor::SensorProvider;
use crate::timeline::{Frame, Pose, SensorValues, Timeline, TimelineMetadata};

/// Highest supported sampling frequency. Keeps the interval at >= 1 ms.
pub const MAX_SAMPLING_FREQUENCY_HZ: u32 = 1000;

/// Recorder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Target frames per second
    pub sampling_frequency_hz: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sampling_frequency_hz: 10,
        }
    }
}

impl RecorderConfig {
    /// Config sampling at the given rate
    pub fn new(sampling_frequency_hz: u32) -> Self {
        Self {
            sampling_frequency_hz,
        }
    }

    /// Minimum gap between two accepted frames.
    ///
    /// Integer division: frequencies that don't divide 1000 evenly get a
    /// truncated interval (30 Hz -> 33 ms).
    pub fn min_interval_ms(&self) -> u64 {
        let hz = self
            .sampling_frequency_hz
            .clamp(1, MAX_SAMPLING_FREQUENCY_HZ);
        1000 / hz as u64
    }
}

/// Recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Samples are ignored
    #[default]
    Idle,
    /// Samples are throttled into frames
    Recording,
}

/// Throttled frame recorder
pub struct Recorder {
    /// Sampling settings
    config: RecorderConfig,
    /// Sensor channels read on every accepted sample
    channels: Vec<String>,
    /// Frames of the current (or last) session
    frames: Vec<Frame>,
    /// Idle or recording
    state: RecorderState,
    /// Time of the last accepted frame; `None` means "take the next one"
    last_recorded_ms: Option<u64>,
}

impl Recorder {
    /// Create a recorder that reads the given sensor channels
    pub fn new(config: RecorderConfig, channels: Vec<String>) -> Self {
        Self {
            config,
            channels,
            frames: Vec::new(),
            state: RecorderState::Idle,
            last_recorded_ms: None,
        }
    }

    /// Milliseconds elapsed since `start`, for hosts driven by `Instant`
    pub fn elapsed_since(start: Instant) -> u64 {
        start.elapsed().as_millis() as u64
    }

    /// Sampling settings
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Effective throttle interval
    pub fn min_interval_ms(&self) -> u64 {
        self.config.min_interval_ms()
    }

    /// Get the channel names
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Replace the channel set used by subsequent samples
    pub fn set_channels(&mut self, channels: Vec<String>) {
        self.channels = channels;
    }

    /// Idle or recording
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Start a new session, discarding frames from any previous one
    pub fn start(&mut self) {
        self.frames.clear();
        self.last_recorded_ms = None;
        self.state = RecorderState::Recording;
        tracing::info!(
            "Recording started at {} Hz ({} ms interval, {} channels)",
            self.config.sampling_frequency_hz,
            self.min_interval_ms(),
            self.channels.len()
        );
    }

    /// Stop recording. Captured frames are kept for export.
    pub fn stop(&mut self) {
        if self.is_recording() {
            tracing::info!(
                "Recording stopped: {} frames over {} ms",
                self.frames.len(),
                self.duration_ms()
            );
        }
        self.state = RecorderState::Idle;
    }

    /// Offer a pose update. Returns true if a frame was recorded.
    ///
    /// Sensor channels that fail to read, or read NaN/infinity, are left out
    /// of the frame; the frame itself is still recorded. A pose with a
    /// NaN/infinite component is skipped entirely and does not reset the
    /// throttle.
    pub fn sample<P: SensorProvider + ?Sized>(
        &mut self,
        now_ms: u64,
        x: f64,
        y: f64,
        heading: f64,
        provider: &mut P,
    ) -> bool {
        if !self.is_recording() {
            return false;
        }

        if let Some(last) = self.last_recorded_ms {
            if now_ms < last {
                tracing::warn!("Ignoring sample at {now_ms} ms, before last frame at {last} ms");
                return false;
            }
            if now_ms - last < self.min_interval_ms() {
                tracing::trace!("Throttled sample at {now_ms} ms");
                return false;
            }
        }

        let pose = Pose::new(x, y, heading);
        if !pose.is_finite() {
            tracing::warn!("Skipping sample at {now_ms} ms with non-finite pose {pose:?}");
            return false;
        }

        let mut sensors = SensorValues::new();
        for channel in &self.channels {
            match provider.read_value(channel) {
                Ok(value) if !value.is_finite() => {
                    tracing::warn!(
                        "Omitting '{channel}' from frame at {now_ms} ms: {value} is not finite"
                    );
                }
                Ok(value) => {
                    sensors.insert(channel.clone(), value);
                }
                Err(e) => {
                    tracing::warn!("Omitting '{channel}' from frame at {now_ms} ms: {e}");
                }
            }
        }

        self.frames.push(Frame {
            time_ms: now_ms,
            pose,
            sensors,
        });
        self.last_recorded_ms = Some(now_ms);
        true
    }

    /// Get the number of recorded frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get all frames
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get the duration of the recording
    pub fn duration_ms(&self) -> u64 {
        self.frames.last().map(|f| f.time_ms).unwrap_or_default()
    }

    /// Snapshot the captured frames as a timeline stamped with the current time
    pub fn export(&self, owner_label: &str, session_label: &str) -> Result<Timeline> {
        self.export_at(
            owner_label,
            session_label,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Snapshot the captured frames with an explicit creation time
    pub fn export_at(
        &self,
        owner_label: &str,
        session_label: &str,
        created_at_epoch_ms: i64,
    ) -> Result<Timeline> {
        if self.frames.is_empty() {
            return Err(ReplayError::EmptyTimeline);
        }
        let metadata = TimelineMetadata::new(owner_label, session_label, created_at_epoch_ms);
        Timeline::from_parts(metadata, self.frames.clone())
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(RecorderConfig::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{NoSensors, StaticSensors};

    #[test]
    fn test_recorder_basic() {
        let mut recorder = Recorder::default();
        assert!(!recorder.is_recording());

        recorder.start();
        assert!(recorder.is_recording());

        assert!(recorder.sample(0, 1.0, 2.0, 90.0, &mut NoSensors));
        assert_eq!(recorder.frame_count(), 1);

        recorder.stop();
        assert!(!recorder.is_recording());
        assert!(!recorder.sample(500, 1.0, 2.0, 90.0, &mut NoSensors));
        assert_eq!(recorder.frame_count(), 1);
    }

    #[test]
    fn test_interval_truncation() {
        assert_eq!(RecorderConfig::new(10).min_interval_ms(), 100);
        assert_eq!(RecorderConfig::new(30).min_interval_ms(), 33);
        assert_eq!(RecorderConfig::new(0).min_interval_ms(), 1000);
        assert_eq!(RecorderConfig::new(5000).min_interval_ms(), 1);
    }

    #[test]
    fn test_sample_ignored_when_idle() {
        let mut recorder = Recorder::default();
        assert!(!recorder.sample(0, 0.0, 0.0, 0.0, &mut NoSensors));
        assert_eq!(recorder.frame_count(), 0);
    }

    #[test]
    fn test_backwards_clock_rejected() {
        let mut recorder = Recorder::default();
        recorder.start();
        assert!(recorder.sample(500, 0.0, 0.0, 0.0, &mut NoSensors));
        assert!(!recorder.sample(100, 0.0, 0.0, 0.0, &mut NoSensors));
        assert_eq!(recorder.frame_count(), 1);
    }

    #[test]
    fn test_non_finite_pose_skipped() {
        let mut recorder = Recorder::default();
        recorder.start();
        assert!(!recorder.sample(0, 1.0, 2.0, f64::NAN, &mut NoSensors));
        assert!(!recorder.sample(10, f64::INFINITY, 2.0, 0.0, &mut NoSensors));
        assert_eq!(recorder.frame_count(), 0);
        // Throttle not armed by the skipped samples
        assert!(recorder.sample(20, 1.0, 2.0, 3.0, &mut NoSensors));
    }

    #[test]
    fn test_restart_clears_frames() {
        let mut recorder = Recorder::default();
        recorder.start();
        recorder.sample(0, 0.0, 0.0, 0.0, &mut NoSensors);
        recorder.sample(100, 0.0, 0.0, 0.0, &mut NoSensors);

        recorder.start();
        assert_eq!(recorder.frame_count(), 0);
        // Sentinel reset: a time earlier than the old session is accepted
        assert!(recorder.sample(50, 0.0, 0.0, 0.0, &mut NoSensors));
    }

    #[test]
    fn test_sensor_values_captured() {
        let mut sensors = StaticSensors::new();
        sensors.set("leftDriveEncoder", 120);
        sensors.set("intakeRunning", true);

        let mut recorder = Recorder::new(
            RecorderConfig::default(),
            vec!["leftDriveEncoder".into(), "intakeRunning".into()],
        );
        recorder.start();
        recorder.sample(0, 0.0, 0.0, 0.0, &mut sensors);

        let frame = &recorder.frames()[0];
        assert_eq!(frame.sensors.len(), 2);
        assert_eq!(frame.sensors["intakeRunning"].as_flag(), Some(true));
    }

    #[test]
    fn test_export_empty_fails() {
        let mut recorder = Recorder::default();
        recorder.start();
        recorder.stop();
        assert!(matches!(
            recorder.export("3796", "Q1"),
            Err(ReplayError::EmptyTimeline)
        ));
    }
}
