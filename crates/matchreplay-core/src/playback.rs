//! Timeline playback
//!
//! [`PlaybackController`] runs a virtual clock over a loaded timeline. The
//! host calls [`PlaybackController::tick`] once per display frame with its
//! real clock; the controller scales the elapsed time by the playback speed,
//! walks forward through the frames and blends the two frames around the
//! virtual time. Nothing here owns a timer or a thread.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::display::DisplayState;
use crate::error::{ReplayError, Result};
use crate::interpolate::interpolate;
use crate::timeline::Timeline;

/// Slowest allowed playback speed
pub const MIN_SPEED: f64 = 0.01;
/// Fastest allowed playback speed
pub const MAX_SPEED: f64 = 16.0;
/// Speeds offered as one-click presets
pub const SPEED_PRESETS: [f64; 6] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0];
/// Default cap on the real time a single tick may advance
pub const DEFAULT_MAX_STEP_MS: u64 = 100;

/// What happens when playback reaches the last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    /// Jump back to the first frame and keep playing
    #[default]
    Loop,
    /// Hold the last frame and stop
    Stop,
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Virtual milliseconds per real millisecond
    pub speed: f64,
    /// Largest real delta a single tick will apply
    pub max_step_ms: u64,
    /// Loop or stop when the last frame is reached
    pub end_behavior: EndBehavior,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_step_ms: DEFAULT_MAX_STEP_MS,
            end_behavior: EndBehavior::Loop,
        }
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Ticks are ignored
    #[default]
    Stopped,
    /// Ticks advance the virtual clock
    Playing,
}

/// Clamp a requested speed into `[MIN_SPEED, MAX_SPEED]`
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() || speed <= 0.0 {
        MIN_SPEED
    } else {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    }
}

/// Tick-driven player for a single timeline.
///
/// The timeline is shared read-only; several controllers can play the same
/// `Arc<Timeline>` independently.
#[derive(Debug, Default)]
pub struct PlaybackController {
    config: PlaybackConfig,
    timeline: Option<Arc<Timeline>>,
    state: PlaybackState,
    /// Frame the virtual clock is currently past
    index: usize,
    /// Virtual time elapsed since `frames[index]`
    virtual_elapsed_ms: f64,
    /// Host timestamp of the previous tick; `None` until the first tick
    /// after `play()` syncs the clock
    last_tick_ms: Option<u64>,
    /// Number of times playback wrapped back to the first frame
    loop_count: u64,
    display: Option<DisplayState>,
}

impl PlaybackController {
    /// Create a controller with no timeline loaded
    pub fn new(mut config: PlaybackConfig) -> Self {
        config.speed = clamp_speed(config.speed);
        Self {
            config,
            ..Self::default()
        }
    }

    /// Load a timeline, rewinding to the first frame in the stopped state
    pub fn load(&mut self, timeline: impl Into<Arc<Timeline>>) -> Result<()> {
        let timeline = timeline.into();
        if timeline.is_empty() {
            return Err(ReplayError::EmptyTimeline);
        }
        tracing::info!(
            "Playback loaded '{}': {} frames, {} ms",
            timeline.metadata().session_label,
            timeline.len(),
            timeline.duration_ms()
        );
        self.timeline = Some(timeline);
        self.state = PlaybackState::Stopped;
        self.jump_to(0);
        self.last_tick_ms = None;
        self.loop_count = 0;
        Ok(())
    }

    /// Currently loaded timeline
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.timeline.as_ref()
    }

    /// Current settings (speed already clamped)
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Playing or stopped
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if playback is running
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Index of the frame playback is on
    pub fn current_frame_index(&self) -> usize {
        self.index
    }

    /// How many times playback has looped since the timeline was loaded.
    ///
    /// A wrap can happen without the frame index ever visibly decreasing
    /// (two-frame timelines, or a whole timeline crossed in one tick).
    pub fn loop_count(&self) -> u64 {
        self.loop_count
    }

    /// Virtual time elapsed since the current frame
    pub fn virtual_elapsed_ms(&self) -> f64 {
        self.virtual_elapsed_ms
    }

    /// Current playback speed multiplier
    pub fn speed(&self) -> f64 {
        self.config.speed
    }

    /// Change playback speed; out-of-range values are clamped
    pub fn set_speed(&mut self, speed: f64) {
        let clamped = clamp_speed(speed);
        if clamped != speed {
            tracing::debug!("Speed {speed} clamped to {clamped}");
        }
        self.config.speed = clamped;
    }

    /// What happens at the last frame
    pub fn end_behavior(&self) -> EndBehavior {
        self.config.end_behavior
    }

    /// Switch between looping and stopping at the end
    pub fn set_end_behavior(&mut self, end_behavior: EndBehavior) {
        self.config.end_behavior = end_behavior;
    }

    /// Start playing. The next tick only syncs the clock.
    ///
    /// With [`EndBehavior::Stop`], playing from the last frame rewinds first.
    pub fn play(&mut self) -> Result<()> {
        let len = self.loaded()?.len();
        if self.config.end_behavior == EndBehavior::Stop && len > 1 && self.index == len - 1 {
            self.jump_to(0);
        }
        self.state = PlaybackState::Playing;
        self.last_tick_ms = None;
        Ok(())
    }

    /// Pause playback, keeping the current position
    pub fn pause(&mut self) {
        self.state = PlaybackState::Stopped;
        self.last_tick_ms = None;
    }

    /// Play if paused, pause if playing. Returns the new state.
    pub fn toggle(&mut self) -> Result<PlaybackState> {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Stopped => self.play()?,
        }
        Ok(self.state)
    }

    /// Stop and rewind to the first frame
    pub fn reset(&mut self) {
        self.pause();
        if self.timeline.is_some() {
            self.jump_to(0);
        }
    }

    /// Jump to a position given as a percentage of the frame list.
    ///
    /// Values outside `0..=100` are clamped. Play/pause state is unchanged.
    pub fn seek(&mut self, percent: f64) -> Result<()> {
        let len = self.loaded()?.len();
        let clamped = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        if clamped != percent {
            tracing::debug!("Seek target {percent}% clamped to {clamped}%");
        }

        let index = if len <= 1 {
            0
        } else {
            ((clamped * (len - 1) as f64 / 100.0).floor() as usize).min(len - 1)
        };
        self.jump_to(index);
        Ok(())
    }

    /// Jump to a timeline time, landing between frames if needed
    pub fn seek_to_time(&mut self, time_ms: u64) -> Result<()> {
        let timeline = Arc::clone(self.loaded()?);
        let time_ms = time_ms.min(timeline.duration_ms());
        let index = timeline.index_at_time(time_ms);
        self.index = index;
        self.virtual_elapsed_ms = time_ms.saturating_sub(timeline.frames()[index].time_ms) as f64;
        self.refresh_display(&timeline);
        Ok(())
    }

    /// Move one frame forward. Returns false at the last frame.
    pub fn step_forward(&mut self) -> bool {
        match self.timeline.as_ref().map(|t| t.len()) {
            Some(len) if self.index + 1 < len => {
                self.jump_to(self.index + 1);
                true
            }
            _ => false,
        }
    }

    /// Move one frame back. Returns false at the first frame.
    pub fn step_backward(&mut self) -> bool {
        if self.timeline.is_some() && self.index > 0 {
            self.jump_to(self.index - 1);
            true
        } else {
            false
        }
    }

    /// Advance the virtual clock to the host time `now_ms`
    pub fn tick(&mut self, now_ms: u64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(timeline) = self.timeline.clone() else {
            return;
        };
        let Some(last) = self.last_tick_ms else {
            self.last_tick_ms = Some(now_ms);
            return;
        };

        let real_delta_ms = now_ms.saturating_sub(last).min(self.config.max_step_ms);
        self.virtual_elapsed_ms += real_delta_ms as f64 * self.config.speed;

        let frames = timeline.frames();
        while self.index + 1 < frames.len() {
            let interval = (frames[self.index + 1].time_ms - frames[self.index].time_ms) as f64;
            if interval > self.virtual_elapsed_ms {
                break;
            }
            self.virtual_elapsed_ms -= interval;
            self.index += 1;
        }

        if self.index == frames.len() - 1 {
            match self.config.end_behavior {
                EndBehavior::Loop => {
                    tracing::debug!("Reached end of timeline, looping");
                    self.index = 0;
                    self.virtual_elapsed_ms = 0.0;
                    self.loop_count += 1;
                }
                EndBehavior::Stop => {
                    tracing::debug!("Reached end of timeline, stopping");
                    self.virtual_elapsed_ms = 0.0;
                    self.state = PlaybackState::Stopped;
                }
            }
        }

        self.refresh_display(&timeline);
        self.last_tick_ms = if self.is_playing() { Some(now_ms) } else { None };
    }

    /// Last computed display state, `None` before anything is loaded
    pub fn display_state(&self) -> Option<&DisplayState> {
        self.display.as_ref()
    }

    /// Position in the frame list as 0-100
    pub fn progress_percent(&self) -> f64 {
        match self.timeline.as_ref().map(|t| t.len()) {
            Some(len) if len > 1 => 100.0 * self.index as f64 / (len - 1) as f64,
            _ => 0.0,
        }
    }

    fn loaded(&self) -> Result<&Arc<Timeline>> {
        self.timeline.as_ref().ok_or(ReplayError::EmptyTimeline)
    }

    /// Land exactly on a frame. Caller guarantees a timeline is loaded.
    fn jump_to(&mut self, index: usize) {
        self.index = index;
        self.virtual_elapsed_ms = 0.0;
        if let Some(timeline) = self.timeline.clone() {
            self.refresh_display(&timeline);
        }
    }

    fn refresh_display(&mut self, timeline: &Timeline) {
        let frames = timeline.frames();
        let Some(current) = frames.get(self.index) else {
            return;
        };
        self.display = Some(match frames.get(self.index + 1) {
            Some(next) => {
                let interval = next.time_ms.saturating_sub(current.time_ms).max(1) as f64;
                let factor = (self.virtual_elapsed_ms / interval).clamp(0.0, 1.0);
                DisplayState::from_blend(self.index, interpolate(current, next, factor))
            }
            None => DisplayState::from_frame(self.index, current),
        });
    }
}
