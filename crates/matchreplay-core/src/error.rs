//! Replay errors

use thiserror::Error;

/// Errors that can occur while recording, loading or playing a timeline
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Playback or export was asked to work with zero frames
    #[error("Timeline has no frames")]
    EmptyTimeline,

    /// Decoded data does not fit the replay schema
    #[error("Malformed timeline: {0}")]
    MalformedTimeline(String),

    /// A frame is timestamped before the one preceding it
    #[error("Frame {index} goes back in time: {time_ms} ms after {previous_ms} ms")]
    NonMonotonicTimeline {
        /// Position of the offending frame
        index: usize,
        /// Timestamp of the frame before it
        previous_ms: u64,
        /// Timestamp of the offending frame
        time_ms: u64,
    },

    /// Reading or writing a replay file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReplayError {
    /// True for every error meaning "there is nothing to play": an empty
    /// recording and a decode that produced no usable frames.
    pub fn is_unplayable(&self) -> bool {
        matches!(
            self,
            ReplayError::EmptyTimeline
                | ReplayError::MalformedTimeline(_)
                | ReplayError::NonMonotonicTimeline { .. }
        )
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(err: serde_json::Error) -> Self {
        ReplayError::MalformedTimeline(err.to_string())
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ReplayError>;
