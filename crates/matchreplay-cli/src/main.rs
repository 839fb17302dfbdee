//! MatchReplay command line
//!
//! Headless front end for inspecting, playing and producing `.replay` files.
//!
//! Usage:
//!   matchreplay info match.replay
//!   matchreplay play match.replay --speed 0.5 --fps 30
//!   matchreplay record-demo ./replays --seconds 30 --rate 20

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use matchreplay_core::config::{ReplayConfig, CONFIG_FILE_NAME};
use matchreplay_core::demo::{DemoRobot, DEMO_CHANNELS};
use matchreplay_core::display::{speed_label, TimelineSummary};
use matchreplay_core::playback::{EndBehavior, PlaybackController};
use matchreplay_core::recorder::Recorder;
use matchreplay_core::timeline::{load_timeline, save_timeline, ReplayFormat};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Host loop period used when recording the demo robot
const DEMO_LOOP_MS: u64 = 20;
/// Upper bound on simulated display frames for one playback pass
const MAX_PLAY_TICKS: u64 = 10_000_000;

#[derive(Parser, Debug)]
#[command(name = "matchreplay")]
#[command(about = "Record and replay robot matches", long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print match information and sensor channels
    Info {
        /// Replay file
        file: PathBuf,
    },
    /// Play a replay once, printing the displayed pose every frame
    Play {
        /// Replay file
        file: PathBuf,

        /// Playback speed multiplier
        #[arg(short, long)]
        speed: Option<f64>,

        /// Simulated display frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Stop on the last frame instead of looping
        #[arg(long)]
        stop_at_end: bool,

        /// Start position in percent
        #[arg(long)]
        seek: Option<f64>,

        /// Sleep between frames instead of running as fast as possible
        #[arg(long)]
        realtime: bool,
    },
    /// Record the simulated robot and save the replay
    RecordDemo {
        /// Output directory (defaults to the configured replay directory)
        dir: Option<PathBuf>,

        /// Match length in seconds
        #[arg(long, default_value = "30")]
        seconds: u64,

        /// Sampling frequency in Hz
        #[arg(short, long)]
        rate: Option<u32>,

        /// Match label
        #[arg(short, long, default_value = "demo")]
        label: String,

        /// Seed for a reproducible path
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ReplayConfig::load(&args.config)
        .with_context(|| format!("reading config {}", args.config.display()))?;

    match args.command {
        Command::Info { file } => info(&file),
        Command::Play {
            file,
            speed,
            fps,
            stop_at_end,
            seek,
            realtime,
        } => {
            let mut playback = config.playback.clone();
            if let Some(speed) = speed {
                playback.speed = speed;
            }
            if stop_at_end {
                playback.end_behavior = EndBehavior::Stop;
            }
            let mut player = PlaybackController::new(playback);
            play(&mut player, &file, fps, seek, realtime)
        }
        Command::RecordDemo {
            dir,
            seconds,
            rate,
            label,
            seed,
        } => {
            let mut recorder_config = config.recorder.clone();
            if let Some(rate) = rate {
                recorder_config.sampling_frequency_hz = rate;
            }
            let dir = dir.unwrap_or_else(|| config.replay_dir());
            let robot = match seed {
                Some(seed) => DemoRobot::with_seed(seed),
                None => DemoRobot::new(),
            };
            let channels = DEMO_CHANNELS.iter().map(|c| c.to_string()).collect();
            let mut recorder = Recorder::new(recorder_config, channels);
            record_demo(&mut recorder, robot, seconds, &config.team, &label, &dir)
        }
    }
}

fn info(file: &Path) -> Result<()> {
    if ReplayFormat::from_extension(file).is_none() {
        tracing::warn!("Unrecognised extension, expected .replay or .json");
    }
    let timeline = load_timeline(file).with_context(|| format!("loading {}", file.display()))?;

    println!("{}", TimelineSummary::of(&timeline));
    let channels = timeline.channel_names();
    if channels.is_empty() {
        println!("Custom Data: none");
    } else {
        println!("Custom Data:");
        for name in channels {
            let present = timeline
                .channel_values(&name)
                .iter()
                .filter(|v| v.is_some())
                .count();
            println!("  - {} ({} of {} frames)", name, present, timeline.len());
        }
    }
    Ok(())
}

fn play(
    player: &mut PlaybackController,
    file: &Path,
    fps: u32,
    seek: Option<f64>,
    realtime: bool,
) -> Result<()> {
    if fps == 0 {
        bail!("--fps must be at least 1");
    }
    let timeline = load_timeline(file).with_context(|| format!("loading {}", file.display()))?;
    player.load(timeline)?;
    if let Some(percent) = seek {
        player.seek(percent)?;
    }

    println!(
        "Playing at {} ({:?} at end)",
        speed_label(player.speed()),
        player.end_behavior()
    );

    let frame_ms = (1000 / fps).max(1) as u64;
    let mut now_ms = 0;
    let single_frame = player.timeline().map_or(true, |t| t.len() == 1);
    player.play()?;
    let loops_before = player.loop_count();

    for _ in 0..MAX_PLAY_TICKS {
        player.tick(now_ms);
        let wrapped = player.loop_count() > loops_before;

        if let Some(display) = player.display_state() {
            println!(
                "{} {:>5.1}% x={:7.2} y={:7.2} heading={:6.1}",
                display.time_label(),
                player.progress_percent(),
                display.pose.x,
                display.pose.y,
                display.pose.heading
            );
        }

        if wrapped || !player.is_playing() || (single_frame && now_ms > 0) {
            return Ok(());
        }

        now_ms += frame_ms;
        if realtime {
            std::thread::sleep(Duration::from_millis(frame_ms));
        }
    }

    bail!("playback did not finish within {} frames", MAX_PLAY_TICKS)
}

fn record_demo(
    recorder: &mut Recorder,
    mut robot: DemoRobot,
    seconds: u64,
    team: &str,
    label: &str,
    dir: &Path,
) -> Result<()> {
    recorder.start();
    for now_ms in (0..=seconds * 1000).step_by(DEMO_LOOP_MS as usize) {
        let pose = robot.update(now_ms);
        recorder.sample(now_ms, pose.x, pose.y, pose.heading, &mut robot);
    }
    recorder.stop();

    let timeline = recorder.export(team, label)?;
    let path = save_timeline(dir, &timeline)
        .with_context(|| format!("saving replay to {}", dir.display()))?;
    println!("Recorded {} frames to {}", timeline.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchreplay_core::playback::PlaybackConfig;
    use matchreplay_core::recorder::RecorderConfig;
    use matchreplay_core::timeline::{Frame, Pose, Timeline, TimelineMetadata};
    use tempfile::tempdir;

    #[test]
    fn test_record_info_play() {
        let dir = tempdir().unwrap();
        let channels = DEMO_CHANNELS.iter().map(|c| c.to_string()).collect();
        let mut recorder = Recorder::new(RecorderConfig::new(10), channels);
        record_demo(
            &mut recorder,
            DemoRobot::with_seed(9),
            2,
            "3796",
            "cli test",
            dir.path(),
        )
        .unwrap();
        assert_eq!(recorder.frame_count(), 21);

        let file = dir.path().join("cli test.replay");
        info(&file).unwrap();

        let mut player = PlaybackController::new(PlaybackConfig {
            speed: 4.0,
            ..PlaybackConfig::default()
        });
        play(&mut player, &file, 30, Some(50.0), false).unwrap();
        assert_eq!(player.current_frame_index(), 0);
    }

    #[test]
    fn test_play_two_frame_replay_finishes() {
        let dir = tempdir().unwrap();
        let frames = vec![
            Frame::new(0, Pose::new(0.0, 0.0, 0.0)),
            Frame::new(100, Pose::new(10.0, 0.0, 90.0)),
        ];
        let timeline =
            Timeline::from_parts(TimelineMetadata::new("3796", "two", 0), frames).unwrap();
        let file = save_timeline(dir.path(), &timeline).unwrap();

        let mut player = PlaybackController::new(PlaybackConfig::default());
        play(&mut player, &file, 60, None, false).unwrap();
        assert_eq!(player.loop_count(), 1);
        assert_eq!(player.current_frame_index(), 0);
    }

    #[test]
    fn test_play_rejects_zero_fps() {
        let mut player = PlaybackController::new(PlaybackConfig::default());
        assert!(play(&mut player, Path::new("missing.replay"), 0, None, false).is_err());
    }
}
