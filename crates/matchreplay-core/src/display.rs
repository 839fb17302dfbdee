//! Display helpers
//!
//! Values handed to whatever draws the field, plus the small text formats
//! used for time, speed and match information.

use std::fmt;

use crate::interpolate::Interpolated;
use crate::timeline::{Frame, Pose, SensorValues, Timeline};

/// What the renderer should show right now
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    /// Robot pose, possibly blended between two frames
    pub pose: Pose,
    /// Timeline time in milliseconds
    pub time_ms: u64,
    /// Index of the frame playback is currently on
    pub frame_index: usize,
    /// Sensor readings of the nearer frame
    pub sensors: SensorValues,
}

impl DisplayState {
    /// Show a single frame exactly as recorded
    pub fn from_frame(frame_index: usize, frame: &Frame) -> Self {
        Self {
            pose: frame.pose,
            time_ms: frame.time_ms,
            frame_index,
            sensors: frame.sensors.clone(),
        }
    }

    /// Show a blend of the frame at `frame_index` and the one after it
    pub fn from_blend(frame_index: usize, blend: Interpolated<'_>) -> Self {
        Self {
            pose: blend.pose,
            time_ms: blend.time_ms,
            frame_index,
            sensors: blend.sensors.clone(),
        }
    }

    /// Timestamp as `m:ss.mmm`
    pub fn time_label(&self) -> String {
        format_timestamp(self.time_ms)
    }
}

/// Format milliseconds as `m:ss.mmm`
pub fn format_timestamp(time_ms: u64) -> String {
    let seconds = time_ms / 1000;
    let minutes = seconds / 60;
    format!("{}:{:02}.{:03}", minutes, seconds % 60, time_ms % 1000)
}

/// Human readable playback speed, with a fraction for very slow speeds
pub fn speed_label(speed: f64) -> String {
    if speed > 0.0 && speed < 0.1 {
        let denominator = (1.0 / speed).round() as u64;
        format!("{:.2}x (1/{} speed)", speed, denominator)
    } else {
        format!("{:.2}x", speed)
    }
}

/// Match information shown next to the field
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSummary {
    /// Owner label from the recording metadata
    pub team: String,
    /// Session label from the recording metadata
    pub session: String,
    /// RFC 3339 creation time, or "unknown"
    pub created: String,
    /// Number of recorded frames
    pub frame_count: usize,
    /// Span from the first to the last frame
    pub duration_secs: f64,
}

impl TimelineSummary {
    /// Summarise a loaded timeline
    pub fn of(timeline: &Timeline) -> Self {
        let meta = timeline.metadata();
        let created = chrono::DateTime::from_timestamp_millis(meta.created_at_epoch_ms)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            team: meta.owner_label.clone(),
            session: meta.session_label.clone(),
            created,
            frame_count: timeline.len(),
            duration_secs: timeline.duration_ms() as f64 / 1000.0,
        }
    }
}

impl fmt::Display for TimelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Team: {}", self.team)?;
        writeln!(f, "Match: {}", self.session)?;
        writeln!(f, "Date: {}", self.created)?;
        writeln!(f, "Total Frames: {}", self.frame_count)?;
        write!(f, "Match Duration: {:.1} seconds", self.duration_secs)
    }
}
