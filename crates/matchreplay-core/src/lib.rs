//! # MatchReplay Core Library
//!
//! Core functionality for recording robot matches and replaying them.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A throttled recorder turning pose updates into a timeline of frames
//! - Timeline persistence as `.replay` JSON documents
//! - Angle-aware interpolation between frames
//! - A tick-driven playback controller with variable speed, seeking and looping
//! - A simulated robot for demos and tests
//!
//! ## Example
//!
//! ```rust
//! use matchreplay_core::prelude::*;
//!
//! let mut robot = DemoRobot::with_seed(1);
//! let mut recorder = Recorder::new(
//!     RecorderConfig::new(20),
//!     DEMO_CHANNELS.iter().map(|c| c.to_string()).collect(),
//! );
//!
//! recorder.start();
//! for now_ms in (0..2_000).step_by(10) {
//!     let pose = robot.update(now_ms);
//!     recorder.sample(now_ms, pose.x, pose.y, pose.heading, &mut robot);
//! }
//! recorder.stop();
//!
//! let timeline = recorder.export("3796", "practice").unwrap();
//! let mut player = PlaybackController::new(PlaybackConfig::default());
//! player.load(timeline).unwrap();
//! player.play().unwrap();
//! player.tick(0);
//! player.tick(16);
//! let shown = player.display_state().unwrap();
//! assert_eq!(shown.frame_index, 0);
//! ```

pub mod config;
pub mod demo;
pub mod display;
pub mod error;
pub mod interpolate;
pub mod playback;
pub mod recorder;
pub mod sensor;
pub mod timeline;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ReplayConfig;
    pub use crate::demo::{DemoRobot, DEMO_CHANNELS};
    pub use crate::display::{format_timestamp, speed_label, DisplayState, TimelineSummary};
    pub use crate::error::ReplayError;
    pub use crate::interpolate::{interpolate, interpolate_heading, normalize_heading};
    pub use crate::playback::{EndBehavior, PlaybackConfig, PlaybackController, PlaybackState};
    pub use crate::recorder::{Recorder, RecorderConfig, RecorderState};
    pub use crate::sensor::{ProviderError, SensorProvider, StaticSensors};
    pub use crate::timeline::{
        load_timeline, save_timeline, Frame, Pose, SensorValue, Timeline, TimelineMetadata,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
