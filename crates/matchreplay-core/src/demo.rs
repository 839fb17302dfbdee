//! Demo Mode - simulated robot for testing without hardware
//!
//! Drives a robot around a 12 ft field with a random walk and exposes a few
//! drive-train style sensor channels, so recording and playback can be
//! exercised end to end.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::interpolate::normalize_heading;
use crate::sensor::{ProviderError, SensorProvider};
use crate::timeline::{Pose, SensorValue};

/// Field side length in inches
pub const FIELD_SIZE_IN: f64 = 144.0;

/// Channels the demo robot can report
pub const DEMO_CHANNELS: [&str; 4] = [
    "leftDriveEncoder",
    "rightDriveEncoder",
    "intakeRunning",
    "autoStage",
];

const HALF_ROBOT_IN: f64 = 9.0;
const DRIVE_SPEED_IN_PER_S: f64 = 24.0;
const TRACK_WIDTH_IN: f64 = 15.0;
const TICKS_PER_INCH: f64 = 45.3;
const AUTONOMOUS_MS: u64 = 30_000;
const TRANSITION_MS: u64 = 38_000;

/// Simulated robot producing poses and sensor readings
pub struct DemoRobot {
    pose: Pose,
    /// Current turn rate (deg/s)
    turn_rate: f64,
    /// Time of next turn change (ms)
    next_turn_at_ms: u64,
    /// Last update time (ms)
    last_update_ms: Option<u64>,
    /// Simulation time of the last update (ms)
    sim_time_ms: u64,
    left_ticks: f64,
    right_ticks: f64,
    intake_running: bool,
    rng: StdRng,
}

impl Default for DemoRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoRobot {
    /// Create a demo robot with a random seed
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a demo robot whose path is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            pose: Pose::new(FIELD_SIZE_IN / 2.0, HALF_ROBOT_IN * 2.0, 90.0),
            turn_rate: 0.0,
            next_turn_at_ms: 0,
            last_update_ms: None,
            sim_time_ms: 0,
            left_ticks: 0.0,
            right_ticks: 0.0,
            intake_running: false,
            rng,
        }
    }

    /// Current pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Advance the simulation to `elapsed_ms` and return the new pose
    pub fn update(&mut self, elapsed_ms: u64) -> Pose {
        let delta_ms = match self.last_update_ms {
            Some(last) => elapsed_ms.saturating_sub(last),
            None => 0,
        };
        self.last_update_ms = Some(elapsed_ms);
        self.sim_time_ms += delta_ms;

        if self.sim_time_ms >= self.next_turn_at_ms {
            self.turn_rate = self.rng.gen_range(-90.0..90.0);
            self.next_turn_at_ms = self.sim_time_ms + self.rng.gen_range(500..2500);
            if self.rng.gen_bool(0.3) {
                self.intake_running = !self.intake_running;
            }
        }

        let dt = delta_ms as f64 / 1000.0;
        self.pose.heading = normalize_heading(self.pose.heading + self.turn_rate * dt);
        let rad = self.pose.heading.to_radians();
        self.pose.x += rad.cos() * DRIVE_SPEED_IN_PER_S * dt;
        self.pose.y += rad.sin() * DRIVE_SPEED_IN_PER_S * dt;
        self.bounce();

        // Differential drive: outer wheel covers more ground while turning
        let turn_in_per_s = self.turn_rate.to_radians() * TRACK_WIDTH_IN / 2.0;
        self.left_ticks += (DRIVE_SPEED_IN_PER_S - turn_in_per_s) * dt * TICKS_PER_INCH;
        self.right_ticks += (DRIVE_SPEED_IN_PER_S + turn_in_per_s) * dt * TICKS_PER_INCH;

        self.pose
    }

    /// Reflect off the field walls
    fn bounce(&mut self) {
        let min = HALF_ROBOT_IN;
        let max = FIELD_SIZE_IN - HALF_ROBOT_IN;
        if self.pose.x < min || self.pose.x > max {
            self.pose.x = self.pose.x.clamp(min, max);
            self.pose.heading = normalize_heading(180.0 - self.pose.heading);
        }
        if self.pose.y < min || self.pose.y > max {
            self.pose.y = self.pose.y.clamp(min, max);
            self.pose.heading = normalize_heading(-self.pose.heading);
        }
    }

    fn stage(&self) -> &'static str {
        if self.sim_time_ms < AUTONOMOUS_MS {
            "autonomous"
        } else if self.sim_time_ms < TRANSITION_MS {
            "transition"
        } else {
            "teleop"
        }
    }
}

impl SensorProvider for DemoRobot {
    fn read_value(&mut self, name: &str) -> Result<SensorValue, ProviderError> {
        match name {
            "leftDriveEncoder" => Ok(SensorValue::Number(self.left_ticks.round())),
            "rightDriveEncoder" => Ok(SensorValue::Number(self.right_ticks.round())),
            "intakeRunning" => Ok(SensorValue::Flag(self.intake_running)),
            "autoStage" => Ok(SensorValue::Text(self.stage().to_string())),
            other => Err(ProviderError::UnknownChannel(other.to_string())),
        }
    }
}
