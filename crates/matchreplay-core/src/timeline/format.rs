//! Replay file format
//!
//! Timelines are persisted as JSON documents:
//!
//! ```json
//! { "team": "3796", "match": "Q12", "date": 1700000000000,
//!   "frames": [ { "timeMs": 0, "x": 0.0, "y": 0.0, "heading": 90.0,
//!                 "customData": { "leftDriveEncoder": 120 } } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Frame, Pose, SensorValue, SensorValues, Timeline, TimelineMetadata};
use crate::error::{ReplayError, Result};

/// File extension written for saved replays
pub const REPLAY_EXTENSION: &str = "replay";

/// Supported replay file flavours. Both hold the same JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayFormat {
    /// Native `.replay` file
    Replay,
    /// Plain `.json` export
    Json,
}

impl ReplayFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "replay" => Some(ReplayFormat::Replay),
            "json" => Some(ReplayFormat::Json),
            _ => None,
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ReplayFormat::Replay => REPLAY_EXTENSION,
            ReplayFormat::Json => "json",
        }
    }
}

#[derive(Deserialize)]
struct WireHeader {
    #[serde(default)]
    team: String,
    #[serde(default, rename = "match")]
    session: String,
    #[serde(default)]
    date: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFrameIn {
    time_ms: u64,
    x: f64,
    y: f64,
    heading: f64,
    #[serde(default)]
    custom_data: BTreeMap<String, JsonValue>,
}

#[derive(Serialize)]
struct WireTimelineOut<'a> {
    team: &'a str,
    #[serde(rename = "match")]
    session: &'a str,
    date: i64,
    frames: Vec<WireFrameOut<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFrameOut<'a> {
    time_ms: u64,
    x: f64,
    y: f64,
    heading: f64,
    custom_data: &'a SensorValues,
}

/// Serialize a timeline to the replay JSON document
pub fn encode_timeline(timeline: &Timeline) -> Result<String> {
    let meta = timeline.metadata();
    let wire = WireTimelineOut {
        team: &meta.owner_label,
        session: &meta.session_label,
        date: meta.created_at_epoch_ms,
        frames: timeline
            .frames()
            .iter()
            .map(|f| WireFrameOut {
                time_ms: f.time_ms,
                x: f.pose.x,
                y: f.pose.y,
                heading: f.pose.heading,
                custom_data: &f.sensors,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&wire)?)
}

/// Parse a replay JSON document into a validated timeline
pub fn decode_timeline(json: &str) -> Result<Timeline> {
    let root: JsonValue = serde_json::from_str(json)?;
    let JsonValue::Object(mut object) = root else {
        return Err(ReplayError::MalformedTimeline(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    let raw_frames = match object.remove("frames") {
        Some(JsonValue::Array(frames)) => frames,
        Some(_) => {
            return Err(ReplayError::MalformedTimeline(
                "'frames' is not an array".to_string(),
            ))
        }
        None => {
            return Err(ReplayError::MalformedTimeline(
                "missing 'frames'".to_string(),
            ))
        }
    };
    if raw_frames.is_empty() {
        return Err(ReplayError::MalformedTimeline(
            "'frames' is empty".to_string(),
        ));
    }

    let header: WireHeader = serde_json::from_value(JsonValue::Object(object))?;

    let frames = raw_frames
        .into_iter()
        .enumerate()
        .map(|(index, raw)| decode_frame(index, raw))
        .collect::<Result<Vec<_>>>()?;

    let metadata = TimelineMetadata::new(header.team, header.session, header.date);
    Timeline::from_parts(metadata, frames)
}

fn decode_frame(index: usize, raw: JsonValue) -> Result<Frame> {
    let wire: WireFrameIn = serde_json::from_value(raw)
        .map_err(|e| ReplayError::MalformedTimeline(format!("frame {}: {}", index, e)))?;

    let mut sensors = SensorValues::new();
    for (name, value) in wire.custom_data {
        match value {
            JsonValue::Bool(b) => {
                sensors.insert(name, SensorValue::Flag(b));
            }
            JsonValue::Number(n) => match n.as_f64() {
                Some(v) => {
                    sensors.insert(name, SensorValue::Number(v));
                }
                None => tracing::warn!("Frame {index}: dropping unrepresentable number '{name}'"),
            },
            JsonValue::String(s) => {
                sensors.insert(name, SensorValue::Text(s));
            }
            other => {
                tracing::warn!("Frame {index}: dropping non-scalar value for '{name}': {other}");
            }
        }
    }

    Ok(Frame {
        time_ms: wire.time_ms,
        pose: Pose::new(wire.x, wire.y, wire.heading),
        sensors,
    })
}

/// Turn a session label into a safe replay file name
pub fn replay_file_name(label: &str) -> String {
    let safe: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if safe.is_empty() { "replay" } else { safe.as_str() };
    format!("{}.{}", stem, REPLAY_EXTENSION)
}

/// Get the default directory replays are saved to
pub fn default_replay_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchreplay")
        .join("replays")
}

/// Load a timeline from a `.replay` or `.json` file
pub fn load_timeline<P: AsRef<Path>>(path: P) -> Result<Timeline> {
    let path = path.as_ref();
    warn_unknown_extension(path);
    let content = fs::read_to_string(path)?;
    let timeline = decode_timeline(&content)?;
    log_loaded(path, &timeline);
    Ok(timeline)
}

/// Save a timeline into `dir`, named after its session label.
/// Returns the path written.
pub fn save_timeline<P: AsRef<Path>>(dir: P, timeline: &Timeline) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(replay_file_name(&timeline.metadata().session_label));
    fs::write(&path, encode_timeline(timeline)?)?;
    tracing::info!("Saved {} frames to {}", timeline.len(), path.display());
    Ok(path)
}

/// Async variant of [`load_timeline`]
pub async fn load_timeline_async<P: AsRef<Path>>(path: P) -> Result<Timeline> {
    let path = path.as_ref();
    warn_unknown_extension(path);
    let content = tokio::fs::read_to_string(path).await?;
    let timeline = decode_timeline(&content)?;
    log_loaded(path, &timeline);
    Ok(timeline)
}

/// Async variant of [`save_timeline`]
pub async fn save_timeline_async<P: AsRef<Path>>(dir: P, timeline: &Timeline) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(replay_file_name(&timeline.metadata().session_label));
    tokio::fs::write(&path, encode_timeline(timeline)?).await?;
    tracing::info!("Saved {} frames to {}", timeline.len(), path.display());
    Ok(path)
}

fn warn_unknown_extension(path: &Path) {
    if ReplayFormat::from_extension(path).is_none() {
        tracing::warn!(
            "{} has no .replay/.json extension, reading it as JSON anyway",
            path.display()
        );
    }
}

fn log_loaded(path: &Path, timeline: &Timeline) {
    let meta = timeline.metadata();
    tracing::info!(
        "Loaded match '{}' (team '{}'): {} frames, {} ms from {}",
        meta.session_label,
        meta.owner_label,
        timeline.len(),
        timeline.duration_ms(),
        path.display()
    );
}
